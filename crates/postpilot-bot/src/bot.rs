//! Main Telegram bot implementation.

use std::sync::Arc;
use std::time::Duration;

use teloxide::dispatching::UpdateFilterExt;
use teloxide::prelude::*;
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::error::{BotError, Result};
use crate::handlers::{handle_callback, handle_command, handle_document, handle_text, Command};
use crate::state::BotState;

/// How often the expiry sweeper checks for idle sessions.
const SWEEP_INTERVAL_SECS: u64 = 60;

/// The Telegram bot for PostPilot.
pub struct PostBot {
    /// The teloxide bot instance.
    bot: Bot,
    /// Shared state across handlers.
    state: Arc<BotState>,
}

impl PostBot {
    /// Create a new bot instance.
    ///
    /// Requires the `TELEGRAM_BOT_TOKEN` environment variable to be set.
    pub fn new(state: Arc<BotState>) -> Result<Self> {
        let token = std::env::var("TELEGRAM_BOT_TOKEN").map_err(|_| BotError::NoToken)?;
        Ok(Self {
            bot: Bot::new(token),
            state,
        })
    }

    /// Get the bot's username.
    pub async fn get_me(&self) -> Result<String> {
        let me = self
            .bot
            .get_me()
            .await
            .map_err(|e| BotError::BotStartFailed(e.to_string()))?;
        Ok(me.username().to_string())
    }

    /// Run the bot in long-polling mode until interrupted.
    pub async fn run(&self) {
        info!("Starting PostPilot bot in polling mode...");

        let bot = self.bot.clone();

        // Background task expiring idle sessions.
        let sweep_state = Arc::clone(&self.state);
        tokio::spawn(async move {
            expire_sessions_loop(sweep_state).await;
        });

        let state_for_commands = Arc::clone(&self.state);
        let state_for_documents = Arc::clone(&self.state);
        let state_for_text = Arc::clone(&self.state);
        let state_for_callbacks = Arc::clone(&self.state);

        let handler = dptree::entry()
            .branch(Update::filter_callback_query().endpoint(
                move |bot: Bot, q: teloxide::types::CallbackQuery| {
                    let state = Arc::clone(&state_for_callbacks);
                    async move { handle_callback(bot, q, state).await }
                },
            ))
            .branch(
                Update::filter_message()
                    .filter_command::<Command>()
                    .endpoint(move |bot: Bot, msg: Message, cmd: Command| {
                        let state = Arc::clone(&state_for_commands);
                        debug!(chat_id = %msg.chat.id, "Command matched: {:?}", cmd);
                        async move { handle_command(bot, msg, cmd, state).await }
                    }),
            )
            .branch(
                Update::filter_message()
                    .filter(|msg: Message| msg.document().is_some())
                    .endpoint(move |bot: Bot, msg: Message| {
                        let state = Arc::clone(&state_for_documents);
                        async move { handle_document(bot, msg, state).await }
                    }),
            )
            .branch(
                Update::filter_message()
                    .filter(|msg: Message| {
                        msg.text().map(|t| !t.starts_with('/')).unwrap_or(false)
                    })
                    .endpoint(move |bot: Bot, msg: Message| {
                        let state = Arc::clone(&state_for_text);
                        async move { handle_text(bot, msg, state).await }
                    }),
            );

        info!("Bot is running! Send /start to begin.");

        Dispatcher::builder(bot, handler)
            .default_handler(|upd| async move {
                warn!("Unhandled update: {:?}", upd);
            })
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    }
}

/// Background task expiring idle sessions.
async fn expire_sessions_loop(state: Arc<BotState>) {
    let mut sweep = interval(Duration::from_secs(SWEEP_INTERVAL_SECS));
    loop {
        sweep.tick().await;
        let expired = state.sessions().expire_idle(state.session_timeout()).await;
        for chat_id in expired {
            debug!(chat_id, "Session expired by sweeper");
        }
    }
}
