//! Command, message, and callback handlers for the Telegram bot.

use std::sync::Arc;

use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{
    CallbackQuery, ChatId, InlineKeyboardButton, InlineKeyboardMarkup, ParseMode,
};
use teloxide::utils::command::BotCommands;
use tracing::{debug, error, info, warn};

use postpilot_models::{Audience, Tone};

use crate::error::BotError;
use crate::state::{BotState, ReviewAction};

/// Maximum accepted journal upload size, in bytes.
const MAX_UPLOAD_BYTES: u32 = 256 * 1024;

/// Bot commands that can be invoked with /.
#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Start the bot and get help")]
    Start,

    #[command(description = "Show help message")]
    Help,

    #[command(description = "Set the writing tone: /tone <casual|professional|technical|upbeat>")]
    Tone(String),

    #[command(description = "Set the audience: /audience <developers|general|business>")]
    Audience(String),

    #[command(description = "Start or end a post series: /series <start|end>")]
    Series(String),

    #[command(description = "Show current session status")]
    Status,

    #[command(description = "End the current session")]
    Cancel,
}

/// Handle the /start command.
pub async fn handle_start(bot: Bot, msg: Message) -> ResponseResult<()> {
    let welcome = "Welcome to PostPilot! 🚀\n\n\
        Send me a markdown journal (as a .md file or pasted text) and I'll \
        draft a Facebook post from it.\n\n\
        <b>Getting started:</b>\n\
        1. Upload a journal or paste its text\n\
        2. Review the draft with the buttons\n\
        3. Rate the result so future posts improve\n\n\
        <b>Settings:</b>\n\
        - /tone — writing tone\n\
        - /audience — who the post is for\n\
        - /series — link the next posts into a series\n\n\
        Type /help for all commands.";

    bot.send_message(msg.chat.id, welcome)
        .parse_mode(ParseMode::Html)
        .await?;

    info!(chat_id = %msg.chat.id, user = ?msg.from.as_ref().map(|u| &u.username), "User started bot");
    Ok(())
}

/// Handle the /help command.
pub async fn handle_help(bot: Bot, msg: Message) -> ResponseResult<()> {
    let help_text = Command::descriptions().to_string();
    bot.send_message(msg.chat.id, help_text).await?;
    Ok(())
}

/// Handle the /tone command.
pub async fn handle_tone(
    bot: Bot,
    msg: Message,
    state: Arc<BotState>,
    arg: String,
) -> ResponseResult<()> {
    match Tone::parse(&arg) {
        Some(tone) => {
            state.set_tone(msg.chat.id.0, tone).await;
            bot.send_message(msg.chat.id, format!("Tone set to {tone}."))
                .await?;
        }
        None => {
            bot.send_message(
                msg.chat.id,
                format!(
                    "Unknown tone {:?}.\n\nPick one of: {}",
                    arg.trim(),
                    Tone::names().join(", ")
                ),
            )
            .await?;
        }
    }
    Ok(())
}

/// Handle the /audience command.
pub async fn handle_audience(
    bot: Bot,
    msg: Message,
    state: Arc<BotState>,
    arg: String,
) -> ResponseResult<()> {
    match Audience::parse(&arg) {
        Some(audience) => {
            state.set_audience(msg.chat.id.0, audience).await;
            bot.send_message(msg.chat.id, format!("Audience set to {audience}."))
                .await?;
        }
        None => {
            bot.send_message(
                msg.chat.id,
                format!(
                    "Unknown audience {:?}.\n\nPick one of: {}",
                    arg.trim(),
                    Audience::names().join(", ")
                ),
            )
            .await?;
        }
    }
    Ok(())
}

/// Handle the /series command.
pub async fn handle_series(
    bot: Bot,
    msg: Message,
    state: Arc<BotState>,
    arg: String,
) -> ResponseResult<()> {
    match arg.trim().to_lowercase().as_str() {
        "start" => {
            let series_id = state.start_series(msg.chat.id.0).await;
            bot.send_message(
                msg.chat.id,
                format!(
                    "Series started ({}). Posts you approve from now on will \
                     be generated as continuations.",
                    series_id
                ),
            )
            .await?;
        }
        "end" => {
            let count = state.end_series(msg.chat.id.0).await;
            bot.send_message(
                msg.chat.id,
                format!("Series ended after {count} post(s)."),
            )
            .await?;
        }
        _ => {
            bot.send_message(msg.chat.id, "Usage: /series <start|end>")
                .await?;
        }
    }
    Ok(())
}

/// Handle the /status command.
pub async fn handle_status(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    match state.status(msg.chat.id.0).await {
        Some(status) => {
            let series = match status.series_position {
                Some(position) => format!("active (next post is #{position})"),
                None => "none".to_string(),
            };
            bot.send_message(
                msg.chat.id,
                format!(
                    "<b>Session status</b>\n\
                     - Tone: {}\n\
                     - Audience: {}\n\
                     - Interactions recorded: {}\n\
                     - Draft pending review: {}\n\
                     - Series: {}",
                    status.tone,
                    status.audience,
                    status.history_len,
                    if status.draft_pending { "yes" } else { "no" },
                    series,
                ),
            )
            .parse_mode(ParseMode::Html)
            .await?;
        }
        None => {
            bot.send_message(
                msg.chat.id,
                "No active session. Send a journal to start one.",
            )
            .await?;
        }
    }
    Ok(())
}

/// Handle the /cancel command.
pub async fn handle_cancel(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    if state.cancel(msg.chat.id.0).await {
        bot.send_message(msg.chat.id, "Session ended. Send a journal to start fresh.")
            .await?;
    } else {
        bot.send_message(msg.chat.id, "No active session.").await?;
    }
    Ok(())
}

/// Handle a document upload: download it and run generation.
pub async fn handle_document(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let Some(doc) = msg.document() else {
        return Ok(());
    };

    let name = doc.file_name.clone().unwrap_or_default();
    let is_markdown = name.ends_with(".md") || name.ends_with(".markdown") || name.ends_with(".txt");
    if !is_markdown {
        bot.send_message(
            msg.chat.id,
            format!("I can only read markdown journals (.md). Got: {name}"),
        )
        .await?;
        return Ok(());
    }
    if doc.file.size > MAX_UPLOAD_BYTES {
        bot.send_message(msg.chat.id, "That journal is too large (max 256 KB).")
            .await?;
        return Ok(());
    }

    let file = bot.get_file(doc.file.id.clone()).await?;
    let mut buf: Vec<u8> = Vec::new();
    bot.download_file(&file.path, &mut buf).await?;

    let markdown = match String::from_utf8(buf) {
        Ok(text) => text,
        Err(_) => {
            bot.send_message(msg.chat.id, "That file is not valid UTF-8 text.")
                .await?;
            return Ok(());
        }
    };

    debug!(chat_id = %msg.chat.id, file = %name, bytes = markdown.len(), "Journal uploaded");
    generate_and_present(&bot, &msg, &state, &markdown).await
}

/// Handle a plain text message.
///
/// While a draft is pending review, text is treated as revision feedback
/// and triggers a regeneration; otherwise it is treated as pasted journal
/// content.
pub async fn handle_text(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let chat_id = msg.chat.id.0;

    if state.has_pending_draft(chat_id).await {
        bot.send_chat_action(msg.chat.id, teloxide::types::ChatAction::Typing)
            .await?;
        match state.regenerate(chat_id, Some(text)).await {
            Ok(draft) => {
                present_draft(&bot, msg.chat.id, &draft).await?;
            }
            Err(e) => {
                error!(chat_id, error = %e, "Regeneration with feedback failed");
                bot.send_message(msg.chat.id, format!("Couldn't regenerate: {e}"))
                    .await?;
            }
        }
        return Ok(());
    }

    generate_and_present(&bot, &msg, &state, text).await
}

/// Handle an inline button press.
pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    state: Arc<BotState>,
) -> ResponseResult<()> {
    // Acknowledge early so the button stops spinning.
    bot.answer_callback_query(q.id.clone()).await?;

    let Some(data) = q.data.as_deref() else {
        return Ok(());
    };
    let Some(message) = q.message.as_ref() else {
        warn!(data, "Callback without originating message");
        return Ok(());
    };
    let chat = message.chat().id;
    let chat_id = chat.0;

    if let Some(action) = ReviewAction::parse(data) {
        match action {
            ReviewAction::Approve => match state.approve(chat_id).await {
                Ok(record) => {
                    bot.send_message(
                        chat,
                        format!(
                            "Approved and saved ✅\n\nHow did this post turn out? \
                             Rate it so the next ones improve. (Post {})",
                            record.id
                        ),
                    )
                    .reply_markup(rating_keyboard())
                    .await?;
                }
                Err(BotError::NoDraft) => {
                    bot.send_message(chat, "Nothing is waiting for review.").await?;
                }
                Err(e) => {
                    error!(chat_id, error = %e, "Approve failed");
                    bot.send_message(chat, format!("Couldn't save the post: {e}"))
                        .await?;
                }
            },
            ReviewAction::Regenerate => {
                bot.send_chat_action(chat, teloxide::types::ChatAction::Typing)
                    .await?;
                match state.regenerate(chat_id, None).await {
                    Ok(draft) => {
                        present_draft(&bot, chat, &draft).await?;
                    }
                    Err(BotError::NoDraft) => {
                        bot.send_message(chat, "Nothing is waiting for review.").await?;
                    }
                    Err(e) => {
                        error!(chat_id, error = %e, "Regeneration failed");
                        bot.send_message(chat, format!("Couldn't regenerate: {e}"))
                            .await?;
                    }
                }
            }
            ReviewAction::Reject => match state.reject(chat_id).await {
                Ok(()) => {
                    bot.send_message(chat, "Draft discarded. Send another journal when ready.")
                        .await?;
                }
                Err(BotError::NoDraft) => {
                    bot.send_message(chat, "Nothing is waiting for review.").await?;
                }
                Err(e) => {
                    error!(chat_id, error = %e, "Reject failed");
                }
            },
        }
        return Ok(());
    }

    if let Some(rating) = parse_rating(data) {
        match state.record_rating(chat_id, rating).await {
            Ok(_) => {
                bot.send_message(chat, format!("Thanks! Rating {rating}/5 recorded."))
                    .await?;
            }
            Err(e) => {
                error!(chat_id, error = %e, "Rating failed");
            }
        }
        return Ok(());
    }

    debug!(data, "Unrecognized callback data");
    Ok(())
}

/// Run generation for journal content and present the draft.
async fn generate_and_present(
    bot: &Bot,
    msg: &Message,
    state: &Arc<BotState>,
    markdown: &str,
) -> ResponseResult<()> {
    bot.send_chat_action(msg.chat.id, teloxide::types::ChatAction::Typing)
        .await?;

    match state.generate_from_journal(msg.chat.id.0, markdown).await {
        Ok(draft) => {
            present_draft(bot, msg.chat.id, &draft).await?;
        }
        Err(BotError::Journal(e)) => {
            bot.send_message(msg.chat.id, format!("I couldn't read that journal: {e}"))
                .await?;
        }
        Err(e) => {
            error!(chat_id = %msg.chat.id, error = %e, "Generation failed");
            bot.send_message(
                msg.chat.id,
                "Couldn't generate a post right now, please try again.",
            )
            .await?;
        }
    }
    Ok(())
}

/// Send a draft with the review keyboard.
async fn present_draft(bot: &Bot, chat: ChatId, draft: &str) -> ResponseResult<()> {
    bot.send_message(chat, draft)
        .reply_markup(review_keyboard())
        .await?;
    Ok(())
}

/// Approve / regenerate / reject buttons.
fn review_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("✅ Approve", ReviewAction::Approve.callback_data()),
        InlineKeyboardButton::callback("🔄 Regenerate", ReviewAction::Regenerate.callback_data()),
        InlineKeyboardButton::callback("🗑 Reject", ReviewAction::Reject.callback_data()),
    ]])
}

/// 1-5 rating buttons.
fn rating_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![(1..=5)
        .map(|n| InlineKeyboardButton::callback(format!("{n}⭐"), format!("rate:{n}")))
        .collect::<Vec<_>>()])
}

/// Parse `rate:<n>` callback data.
fn parse_rating(data: &str) -> Option<u8> {
    data.strip_prefix("rate:")?.parse().ok()
}

/// Dispatch commands to appropriate handlers.
pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: Arc<BotState>,
) -> ResponseResult<()> {
    match cmd {
        Command::Start => handle_start(bot, msg).await,
        Command::Help => handle_help(bot, msg).await,
        Command::Tone(arg) => handle_tone(bot, msg, state, arg).await,
        Command::Audience(arg) => handle_audience(bot, msg, state, arg).await,
        Command::Series(arg) => handle_series(bot, msg, state, arg).await,
        Command::Status => handle_status(bot, msg, state).await,
        Command::Cancel => handle_cancel(bot, msg, state).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rating() {
        assert_eq!(parse_rating("rate:3"), Some(3));
        assert_eq!(parse_rating("rate:5"), Some(5));
        assert_eq!(parse_rating("rate:x"), None);
        assert_eq!(parse_rating("review:approve"), None);
    }

    #[test]
    fn test_review_keyboard_layout() {
        let keyboard = review_keyboard();
        assert_eq!(keyboard.inline_keyboard.len(), 1);
        assert_eq!(keyboard.inline_keyboard[0].len(), 3);
    }

    #[test]
    fn test_rating_keyboard_layout() {
        let keyboard = rating_keyboard();
        assert_eq!(keyboard.inline_keyboard[0].len(), 5);
    }
}
