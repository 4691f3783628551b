//! Configuration structures
//!
//! Every section has defaults so partial config files are valid.

use std::time::Duration;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BACKEND_MAX_ATTEMPTS, DEFAULT_BACKEND_TIMEOUT_SECS, DEFAULT_BACKEND_URL,
    DEFAULT_TICK_INTERVAL_SECS, DEFAULT_TICK_TIMEOUT_SECS,
};
use crate::errors::{PostdeckError, Result};

/// Root application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub calendar: CalendarConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        self.calendar.timezone()?;
        if self.backend.base_url.trim().is_empty() {
            return Err(PostdeckError::Config("backend.base_url must not be empty".into()));
        }
        if self.scheduler.due_scan_interval_secs == 0 || self.scheduler.prune_interval_secs == 0 {
            return Err(PostdeckError::Config("scheduler intervals must be positive".into()));
        }
        Ok(())
    }
}

/// External backend service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_backend_url")]
    pub base_url: String,
    #[serde(default = "default_backend_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            timeout_secs: default_backend_timeout(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Background due-scan and prune loops
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_tick_interval")]
    pub due_scan_interval_secs: u64,
    #[serde(default = "default_tick_interval")]
    pub prune_interval_secs: u64,
    #[serde(default = "default_tick_timeout")]
    pub tick_timeout_secs: u64,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            due_scan_interval_secs: default_tick_interval(),
            prune_interval_secs: default_tick_interval(),
            tick_timeout_secs: default_tick_timeout(),
            enabled: true,
        }
    }
}

impl SchedulerConfig {
    pub fn due_scan_interval(&self) -> Duration {
        Duration::from_secs(self.due_scan_interval_secs)
    }

    pub fn prune_interval(&self) -> Duration {
        Duration::from_secs(self.prune_interval_secs)
    }

    pub fn tick_timeout(&self) -> Duration {
        Duration::from_secs(self.tick_timeout_secs)
    }
}

/// Which key-value store backs the calendar and credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Sqlite,
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = PostdeckError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" | "json" => Ok(StorageBackend::File),
            "sqlite" => Ok(StorageBackend::Sqlite),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(PostdeckError::Config(format!("Unknown storage backend: {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default = "default_storage_path")]
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { backend: StorageBackend::default(), path: default_storage_path() }
    }
}

/// Calendar display and scheduling timezone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// IANA zone name, e.g. `Europe/Berlin`.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self { timezone: default_timezone() }
    }
}

impl CalendarConfig {
    pub fn timezone(&self) -> Result<Tz> {
        self.timezone
            .trim()
            .parse::<Tz>()
            .map_err(|_| PostdeckError::Config(format!("Unknown timezone: {}", self.timezone)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), json: false }
    }
}

fn default_backend_url() -> String {
    DEFAULT_BACKEND_URL.to_string()
}

const fn default_backend_timeout() -> u64 {
    DEFAULT_BACKEND_TIMEOUT_SECS
}

const fn default_max_attempts() -> usize {
    DEFAULT_BACKEND_MAX_ATTEMPTS
}

const fn default_tick_interval() -> u64 {
    DEFAULT_TICK_INTERVAL_SECS
}

const fn default_tick_timeout() -> u64 {
    DEFAULT_TICK_TIMEOUT_SECS
}

const fn default_true() -> bool {
    true
}

fn default_storage_path() -> String {
    "postdeck-store.json".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}
