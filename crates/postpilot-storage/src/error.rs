//! Error types for the storage layer.

use thiserror::Error;

/// Errors that can occur while persisting or loading post records.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Missing or invalid configuration (API key, base id).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The HTTP request to Airtable failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Airtable responded with a non-success status.
    #[error("Airtable API error {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, as returned.
        message: String,
    },

    /// A local database operation failed.
    #[error("Database error: {0}")]
    Database(String),

    /// JSON (de)serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored record could not be mapped back into a `PostRecord`.
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    /// No record exists for the given post id.
    #[error("Post not found: {0}")]
    NotFound(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        StorageError::Database(e.to_string())
    }
}

impl From<reqwest::Error> for StorageError {
    fn from(e: reqwest::Error) -> Self {
        StorageError::Http(e.to_string())
    }
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
