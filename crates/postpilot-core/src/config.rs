//! Shared configuration for PostPilot.
//!
//! Provides functions to locate PostPilot's state directory and common
//! files across all interfaces.
//!
//! # Storage Structure
//!
//! All application data is stored under `~/.postpilot/`:
//!
//! ```text
//! ~/.postpilot/
//! ├── cache/        # Local SQLite cache of post records
//! ├── config/       # User configuration files (.env)
//! └── logs/         # Application logs
//! ```
//!
//! # Environment Variables
//!
//! - `POSTPILOT_STATE_DIR`: Override the base state directory
//! - `POSTPILOT_CACHE_DIR`: Override the cache directory

use std::path::PathBuf;
use std::sync::OnceLock;

/// Environment variable for custom state directory.
pub const STATE_DIR_ENV: &str = "POSTPILOT_STATE_DIR";

/// Environment variable for custom cache directory.
pub const CACHE_DIR_ENV: &str = "POSTPILOT_CACHE_DIR";

/// Default state directory name under home.
const DEFAULT_STATE_DIR: &str = ".postpilot";

const CACHE_SUBDIR: &str = "cache";
const CONFIG_SUBDIR: &str = "config";
const LOGS_SUBDIR: &str = "logs";

static STATE_DIR_CACHE: OnceLock<PathBuf> = OnceLock::new();

/// Get the PostPilot state directory.
///
/// The state directory is determined by:
/// 1. `POSTPILOT_STATE_DIR` environment variable if set
/// 2. `~/.postpilot` if home directory is available
/// 3. `.postpilot` in current directory as fallback
pub fn state_dir() -> PathBuf {
    STATE_DIR_CACHE
        .get_or_init(|| {
            std::env::var(STATE_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    dirs::home_dir()
                        .map(|h| h.join(DEFAULT_STATE_DIR))
                        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR))
                })
        })
        .clone()
}

/// Get the cache directory.
///
/// Defaults to `~/.postpilot/cache/` or `POSTPILOT_CACHE_DIR` env var.
pub fn cache_dir() -> PathBuf {
    std::env::var(CACHE_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| state_dir().join(CACHE_SUBDIR))
}

/// Get the user config directory.
pub fn config_dir() -> PathBuf {
    state_dir().join(CONFIG_SUBDIR)
}

/// Get the logs directory.
pub fn logs_dir() -> PathBuf {
    state_dir().join(LOGS_SUBDIR)
}

/// Path to the `.env` file in the config directory.
pub fn env_file() -> PathBuf {
    config_dir().join(".env")
}

/// Path to the SQLite cache database.
pub fn cache_db_file() -> PathBuf {
    cache_dir().join("posts.db")
}

/// Ensure all state directories exist.
pub fn ensure_all_dirs() -> std::io::Result<()> {
    for dir in [state_dir(), cache_dir(), config_dir(), logs_dir()] {
        std::fs::create_dir_all(&dir)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subdirs_hang_off_state_dir() {
        let base = state_dir();
        assert!(config_dir().starts_with(&base));
        assert!(logs_dir().starts_with(&base));
        assert_eq!(env_file().file_name().unwrap(), ".env");
        assert_eq!(cache_db_file().file_name().unwrap(), "posts.db");
    }
}
