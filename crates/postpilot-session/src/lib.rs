//! Session storage for PostPilot.
//!
//! One [`Session`](postpilot_models::Session) exists per chat. The store
//! keeps them in a keyed map; operations on different sessions proceed
//! concurrently, while operations on the same session are serialized
//! through a per-session mutex so appends can never interleave.

pub mod store;

pub use store::{SessionError, SessionStore};
