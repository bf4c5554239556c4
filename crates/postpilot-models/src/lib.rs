//! Core data models for PostPilot.
//!
//! This crate provides the fundamental data types used throughout the
//! PostPilot system: context items, sessions, drafts, and post records.

pub mod ids;
pub mod item;
pub mod post;
pub mod session;

// Re-export main types
pub use ids::{PostId, SeriesId, SessionId};
pub use item::{ContextItem, InteractionKind};
pub use post::{PostRecord, PostStatus};
pub use session::{Audience, Draft, Session, Tone, DEFAULT_HISTORY_CAP};
