//! Configuration loading.
//!
//! Settings come from `<data dir>/config.toml` when present, then environment
//! overrides (`TASKFORGE_DB`, `TASKFORGE_LOG`, `TASKFORGE_ICS_EXPORT`). The data
//! dir is `$TASKFORGE_HOME`, falling back to `~/.taskforge`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

pub const CONFIG_FILE: &str = "config.toml";
pub const DB_FILE: &str = "tasks.json";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    /// Task database file. Relative paths are resolved against the data dir.
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Default tracing filter when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Calendar file rewritten after every change, if set
    #[serde(default)]
    pub ics_export_path: Option<PathBuf>,

    #[serde(default = "default_work_min")]
    pub pomodoro_work_min: u32,

    #[serde(default = "default_break_min")]
    pub pomodoro_break_min: u32,

    /// How many reminders to show at once
    #[serde(default = "default_reminder_limit")]
    pub reminder_limit: usize,
}

fn default_database_path() -> PathBuf {
    PathBuf::from(DB_FILE)
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_work_min() -> u32 {
    25
}

fn default_break_min() -> u32 {
    5
}

fn default_reminder_limit() -> usize {
    5
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            log_level: default_log_level(),
            ics_export_path: None,
            pomodoro_work_min: default_work_min(),
            pomodoro_break_min: default_break_min(),
            reminder_limit: default_reminder_limit(),
        }
    }
}

impl Settings {
    /// Load settings for `data_dir`, applying environment overrides.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let mut settings = Self::from_file(&data_dir.join(CONFIG_FILE))?;
        settings.apply_env(|key| std::env::var(key).ok());
        if settings.database_path.is_relative() {
            settings.database_path = data_dir.join(&settings.database_path);
        }
        settings.validate()?;
        Ok(settings)
    }

    /// Parse a config file; a missing file yields defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Apply overrides from an environment lookup.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        if let Some(db) = non_empty("TASKFORGE_DB") {
            self.database_path = PathBuf::from(db);
        }
        if let Some(level) = non_empty("TASKFORGE_LOG") {
            self.log_level = level;
        }
        if let Some(ics) = non_empty("TASKFORGE_ICS_EXPORT") {
            self.ics_export_path = Some(PathBuf::from(ics));
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.pomodoro_work_min == 0 || self.pomodoro_break_min == 0 {
            return Err(Error::InvalidConfig(
                "pomodoro_work_min and pomodoro_break_min must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Directory holding the database and config file.
pub fn data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("TASKFORGE_HOME").filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".taskforge")
}
