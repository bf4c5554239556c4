//! Telegram bot front-end for PostPilot.
//!
//! The bot drives a linear workflow per chat: upload a markdown journal
//! (or paste text), review the generated Facebook post via inline buttons,
//! and rate the result. Approved posts are written through to Airtable and
//! the local cache.
//!
//! # Environment Variables
//!
//! Required:
//! - `TELEGRAM_BOT_TOKEN`: Bot token from @BotFather
//! - `OPENROUTER_API_KEY`: For post generation
//! - `AIRTABLE_API_KEY` / `AIRTABLE_BASE_ID`: Post tracking
//!
//! Optional:
//! - `OPENROUTER_MODEL`: Model to use (default: anthropic/claude-sonnet-4)
//! - `AIRTABLE_TABLE`: Table name (default: Posts)
//! - `POSTPILOT_STATE_DIR`: Override the state directory
//!
//! # Commands
//!
//! - `/start` - Welcome message and help
//! - `/help` - Show available commands
//! - `/tone <tone>` - Set the writing tone
//! - `/audience <audience>` - Set the target audience
//! - `/series <start|end>` - Start or end a post series
//! - `/status` - Show session status
//! - `/cancel` - End the current session

pub mod bot;
pub mod error;
pub mod handlers;
pub mod state;

pub use bot::PostBot;
pub use error::{BotError, Result};
pub use handlers::Command;
pub use state::{BotConfig, BotState, ReviewAction, StatusSummary};
