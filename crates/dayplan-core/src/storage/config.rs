//! TOML-based application configuration.
//!
//! Stores generator preferences:
//! - Planning horizon length
//! - Daily work window
//! - UTC offset used for calendar days
//! - Complexity limits
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use std::path::{Path, PathBuf};

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::{ConfigError, CoreError};
use crate::schedule::WorkWindow;
use crate::scheduler::{GeneratorConfig, Limits};

/// Generator configuration as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorSettings {
    #[serde(default = "default_horizon_days")]
    pub horizon_days: u32,
    /// HH:MM
    #[serde(default = "default_work_start")]
    pub work_start: String,
    /// HH:MM, may be earlier than `work_start` to wrap past midnight
    #[serde(default = "default_work_end")]
    pub work_end: String,
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

/// Complexity limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_events")]
    pub max_events: usize,
    #[serde(default = "default_max_tasks")]
    pub max_tasks: usize,
    #[serde(default = "default_max_horizon_days")]
    pub max_horizon_days: u32,
    #[serde(default = "default_max_total_effort_minutes")]
    pub max_total_effort_minutes: i64,
}

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub generator: GeneratorSettings,
    #[serde(default)]
    pub limits: LimitsConfig,
}

// Default functions
fn default_horizon_days() -> u32 {
    7
}
fn default_work_start() -> String {
    "08:00".into()
}
fn default_work_end() -> String {
    "22:00".into()
}
fn default_max_events() -> usize {
    Limits::default().max_events
}
fn default_max_tasks() -> usize {
    Limits::default().max_tasks
}
fn default_max_horizon_days() -> u32 {
    Limits::default().max_horizon_days
}
fn default_max_total_effort_minutes() -> i64 {
    Limits::default().max_total_effort_minutes
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            horizon_days: default_horizon_days(),
            work_start: default_work_start(),
            work_end: default_work_end(),
            utc_offset_minutes: 0,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_events: default_max_events(),
            max_tasks: default_max_tasks(),
            max_horizon_days: default_max_horizon_days(),
            max_total_effort_minutes: default_max_total_effort_minutes(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let (parents, leaf) = match key.rsplit_once('.') {
            Some((parents, leaf)) => (Some(parents), leaf),
            None => (None, key),
        };
        if leaf.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        if let Some(parents) = parents {
            for part in parents.split('.') {
                current = current.get_mut(part).ok_or_else(unknown)?;
            }
        }

        let obj = current.as_object_mut().ok_or_else(unknown)?;
        let existing = obj.get(leaf).ok_or_else(unknown)?;

        let new_value = match existing {
            serde_json::Value::Bool(_) => serde_json::Value::Bool(
                value
                    .parse::<bool>()
                    .map_err(|e| invalid(e.to_string()))?,
            ),
            serde_json::Value::Number(_) => {
                let n = value
                    .parse::<i64>()
                    .map_err(|_| invalid(format!("cannot parse '{value}' as integer")))?;
                serde_json::Value::Number(n.into())
            }
            _ => serde_json::Value::String(value.into()),
        };

        obj.insert(leaf.to_string(), new_value);
        Ok(())
    }

    /// Default location: `<data_dir>/config.toml`.
    pub fn path() -> Result<PathBuf, CoreError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, CoreError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if the file is missing.
    pub fn load_from(path: &Path) -> Result<Self, CoreError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), CoreError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to `path`.
    pub fn save_to(&self, path: &Path) -> Result<(), CoreError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key. Does not persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the result no longer converts into a valid generator config.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), CoreError> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.generator_config()?;
        *self = updated;
        Ok(())
    }

    /// Convert to the generator's runtime configuration.
    pub fn generator_config(&self) -> Result<GeneratorConfig, CoreError> {
        let work_window = WorkWindow::parse(&self.generator.work_start, &self.generator.work_end)?;
        let utc_offset = FixedOffset::east_opt(self.generator.utc_offset_minutes.saturating_mul(60))
            .ok_or_else(|| ConfigError::InvalidValue {
                key: "generator.utc_offset_minutes".into(),
                message: format!("{} is out of range", self.generator.utc_offset_minutes),
            })?;

        Ok(GeneratorConfig {
            horizon_days: self.generator.horizon_days,
            work_window,
            utc_offset,
            limits: Limits {
                max_events: self.limits.max_events,
                max_tasks: self.limits.max_tasks,
                max_horizon_days: self.limits.max_horizon_days,
                max_total_effort_minutes: self.limits.max_total_effort_minutes,
            },
        })
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}
