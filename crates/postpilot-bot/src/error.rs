//! Error types for the Telegram bot.

use thiserror::Error;

/// Errors that can occur in the Telegram bot.
#[derive(Debug, Error)]
pub enum BotError {
    /// Bot token not provided.
    #[error("Telegram bot token not set. Set TELEGRAM_BOT_TOKEN environment variable.")]
    NoToken,

    /// Failed to start the bot.
    #[error("Failed to start bot: {0}")]
    BotStartFailed(String),

    /// The uploaded document is not a usable journal.
    #[error("Unsupported document: {0}")]
    UnsupportedDocument(String),

    /// No draft is pending review for this chat.
    #[error("No draft is waiting for review. Send a journal first.")]
    NoDraft,

    /// Journal parsing failed.
    #[error("Journal error: {0}")]
    Journal(#[from] postpilot_core::JournalError),

    /// Session store error.
    #[error("Session error: {0}")]
    Session(#[from] postpilot_session::SessionError),

    /// Context selection error.
    #[error("Selection error: {0}")]
    Selection(#[from] postpilot_context::SelectionError),

    /// LLM error.
    #[error("Generation error: {0}")]
    Llm(#[from] postpilot_llm::LlmError),

    /// Storage error.
    #[error("Storage error: {0}")]
    Storage(#[from] postpilot_storage::StorageError),
}

/// Result type for bot operations.
pub type Result<T> = std::result::Result<T, BotError>;
