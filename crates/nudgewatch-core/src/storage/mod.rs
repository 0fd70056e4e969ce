mod checkins;
mod config;
pub mod database;
pub mod migrations;
mod snoozes;
mod tracking;

pub use checkins::CheckinRecord;
pub use config::{Config, HistoryConfig, SchedulerConfig, SnoozeConfig};
pub use database::Database;
pub use snoozes::SnoozedItem;
pub use tracking::EmailTracking;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/nudgewatch[-dev]/` based on NUDGEWATCH_ENV.
///
/// Set NUDGEWATCH_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("NUDGEWATCH_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("nudgewatch-dev")
    } else {
        base_dir.join("nudgewatch")
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
