//! Configuration loading and management
//!
//! Handles parsing of `kanban.toml` configuration files.

use std::path::{Path, PathBuf};

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::model::parse_date_time;
use crate::timeslot::{DEFAULT_HORIZON_DAYS, DEFAULT_SLOT_MINUTES};

/// Configuration file name looked up in the working directory
pub const CONFIG_FILE: &str = "kanban.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Where the CLI keeps its records
    #[serde(default)]
    pub storage: StorageConfig,

    /// Conflict index layout
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// CSV file, relative to the working directory unless absolute
    #[serde(default = "default_file")]
    pub file: PathBuf,
}

fn default_file() -> PathBuf {
    PathBuf::from("tasks.csv")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            file: default_file(),
        }
    }
}

/// Layout of the time slot grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Horizon start as `yyyy-MM-dd HH:mm:ss`; Jan 1 of the current year when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,

    /// Slot width in minutes
    #[serde(default = "default_slot_minutes")]
    pub slot_minutes: u32,

    /// Horizon length in days
    #[serde(default = "default_horizon_days")]
    pub horizon_days: u32,
}

fn default_slot_minutes() -> u32 {
    DEFAULT_SLOT_MINUTES
}

fn default_horizon_days() -> u32 {
    DEFAULT_HORIZON_DAYS
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            base: None,
            slot_minutes: default_slot_minutes(),
            horizon_days: default_horizon_days(),
        }
    }
}

impl ScheduleConfig {
    /// Layout starting at a fixed instant
    pub fn starting_at(base: NaiveDateTime) -> Self {
        Self {
            base: Some(crate::model::format_date_time(&base)),
            ..Self::default()
        }
    }

    /// Start of the conflict horizon
    pub fn base_time(&self) -> crate::error::Result<NaiveDateTime> {
        match self.base.as_deref() {
            Some(raw) => parse_date_time(raw).map_err(|err| {
                crate::error::Error::InvalidConfig(format!("schedule.base: {err}"))
            }),
            None => start_of_year(Local::now().year()),
        }
    }

    fn validate(&self) -> crate::error::Result<()> {
        if !(1..=1440).contains(&self.slot_minutes) {
            return Err(crate::error::Error::InvalidConfig(format!(
                "schedule.slot_minutes must be within 1..=1440 (got {})",
                self.slot_minutes
            )));
        }
        if !(1..=3660).contains(&self.horizon_days) {
            return Err(crate::error::Error::InvalidConfig(format!(
                "schedule.horizon_days must be within 1..=3660 (got {})",
                self.horizon_days
            )));
        }
        self.base_time()?;
        Ok(())
    }
}

fn start_of_year(year: i32) -> crate::error::Result<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| {
            crate::error::Error::InvalidConfig(format!("no January 1st in year {year}"))
        })
}

impl Config {
    /// Load configuration from a `kanban.toml` file
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a directory, or return defaults
    pub fn load_from_dir(dir: &Path) -> Self {
        let config_path = dir.join(CONFIG_FILE);
        if !config_path.exists() {
            return Self::default();
        }
        match Self::load(&config_path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(path = %config_path.display(), error = %err, "ignoring invalid config");
                Self::default()
            }
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> crate::error::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> crate::error::Result<()> {
        if self.storage.file.as_os_str().is_empty() {
            return Err(crate::error::Error::InvalidConfig(
                "storage.file cannot be empty".to_string(),
            ));
        }
        self.schedule.validate()?;
        Ok(())
    }
}
