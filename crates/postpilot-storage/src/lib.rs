//! Storage adapters for PostPilot.
//!
//! Finalized posts are tracked in Airtable (the source of truth) and
//! mirrored into an optional local SQLite cache. All backends implement
//! the [`PostStore`] trait; [`WriteThroughStore`] composes them.

pub mod airtable;
pub mod cache;
pub mod error;
pub mod store;

pub use airtable::AirtableStore;
pub use cache::SqliteCache;
pub use error::{Result, StorageError};
pub use store::{PostStore, WriteThroughStore};
