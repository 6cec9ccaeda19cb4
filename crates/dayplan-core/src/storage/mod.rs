mod config;
pub mod migrations;
pub mod schedule_db;

pub use config::{Config, GeneratorSettings, LimitsConfig};
pub use schedule_db::{EventDraft, GeneratedSchedule, ScheduleDb, ScheduleRecord, TaskDraft};

use std::path::PathBuf;

use crate::error::{ConfigError, CoreError};

/// Returns the dayplan data directory, creating it if needed.
///
/// `DAYPLAN_HOME` wins outright. Otherwise `~/.config/dayplan[-dev]/`,
/// with the `-dev` suffix when `DAYPLAN_ENV=dev`.
///
/// # Errors
/// Returns an error if no home directory can be determined or if
/// creating the directory fails.
pub fn data_dir() -> Result<PathBuf, CoreError> {
    let dir = match std::env::var_os("DAYPLAN_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => {
            let base_dir = dirs::home_dir().ok_or(ConfigError::NoDataDir)?.join(".config");
            let env = std::env::var("DAYPLAN_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("dayplan-dev")
            } else {
                base_dir.join("dayplan")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
