//! PostPilot Telegram bot binary.
//!
//! Start the bot with:
//! ```bash
//! TELEGRAM_BOT_TOKEN=xxx cargo run -p postpilot-bot
//! ```

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use postpilot_bot::{BotConfig, BotState, PostBot};
use postpilot_context::{ContextPrioritizer, PrioritizerConfig};
use postpilot_core::config;
use postpilot_llm::{ModelConfig, OpenRouterClient};
use postpilot_session::SessionStore;
use postpilot_storage::{AirtableStore, PostStore, SqliteCache, WriteThroughStore};

/// PostPilot - turn markdown dev journals into Facebook posts from Telegram
#[derive(Parser, Debug)]
#[command(name = "postpilot")]
#[command(about = "Telegram bot that turns markdown journals into Facebook posts")]
struct Args {
    /// Disable the local SQLite cache
    #[arg(long)]
    no_cache: bool,

    /// Token budget for selected history context per prompt
    #[arg(long, default_value_t = 1500)]
    context_budget: usize,

    /// Minutes of inactivity before a session expires
    #[arg(long, default_value_t = 60)]
    session_timeout: i64,

    /// Verbose logging (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Load the prioritizer configuration file, if one exists.
fn load_prioritizer_config() -> PrioritizerConfig {
    let path = config::config_dir().join("prioritizer.json");
    if !path.exists() {
        return PrioritizerConfig::default();
    }
    match std::fs::read_to_string(&path)
        .map_err(|e| e.to_string())
        .and_then(|text| serde_json::from_str(&text).map_err(|e| e.to_string()))
    {
        Ok(config) => {
            tracing::info!(path = %path.display(), "Loaded prioritizer config");
            config
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Bad prioritizer config, using defaults");
            PrioritizerConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load environment variables from the config directory first, then
    // from a local .env for development.
    let env_path = config::env_file();
    if env_path.exists() {
        let _ = dotenvy::from_path(&env_path);
    }
    let _ = dotenvy::dotenv();

    // Initialize logging based on verbosity
    let filter = match args.verbose {
        0 => "postpilot_bot=info,postpilot_session=info,postpilot_storage=info,teloxide=warn",
        1 => "postpilot_bot=debug,postpilot_context=debug,postpilot_session=debug,postpilot_storage=debug,teloxide=info",
        2 => "postpilot_bot=trace,postpilot_context=trace,postpilot_session=trace,postpilot_storage=trace,teloxide=debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = config::ensure_all_dirs() {
        tracing::warn!(error = %e, "Failed to create state directories");
    }

    // Context prioritizer: read-only configuration, built once.
    let prioritizer = ContextPrioritizer::new(load_prioritizer_config())?;

    // LLM client and model.
    let llm = OpenRouterClient::from_env()?;
    let model = std::env::var("OPENROUTER_MODEL")
        .map(ModelConfig::new)
        .unwrap_or_default();

    // Storage: Airtable as source of truth, SQLite mirror unless disabled.
    let airtable: Arc<dyn PostStore> = Arc::new(AirtableStore::from_env()?);
    let cache: Option<Arc<dyn PostStore>> = if args.no_cache {
        None
    } else {
        match SqliteCache::open(&config::cache_db_file()) {
            Ok(cache) => Some(Arc::new(cache)),
            Err(e) => {
                tracing::warn!(error = %e, "Cache unavailable, continuing without it");
                None
            }
        }
    };
    let store = WriteThroughStore::new(airtable, cache);

    let state = Arc::new(BotState::new(
        SessionStore::new(),
        prioritizer,
        llm,
        model,
        store,
        BotConfig {
            context_budget: args.context_budget,
            session_timeout_mins: args.session_timeout,
        },
    ));

    let bot = PostBot::new(state)?;

    match bot.get_me().await {
        Ok(username) => {
            tracing::info!(username = %username, "Bot initialized successfully");
            println!("\nPostPilot Telegram Bot");
            println!("   Bot: @{}", username);
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to get bot info");
            return Err(e.into());
        }
    }

    println!("\nOpen Telegram and send /start to begin");
    println!("   Press Ctrl+C to stop\n");

    bot.run().await;

    Ok(())
}
