//! Error types for LLM access.

use thiserror::Error;

/// Errors that can occur while talking to the LLM provider.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Missing or invalid configuration (API key, model id).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The HTTP request to the provider failed.
    #[error("Model invocation failed: {0}")]
    ModelInvocation(String),

    /// The provider responded, but the body could not be parsed.
    #[error("Failed to parse model response: {0}")]
    ResponseParse(String),

    /// The provider returned no usable completion text.
    #[error("Model returned an empty response")]
    EmptyResponse,
}

/// Result type for LLM operations.
pub type Result<T> = std::result::Result<T, LlmError>;
