//! Configuration loading and database path resolution
//!
//! Config file resolution, highest priority first:
//! 1. Command-line argument
//! 2. `AIRWATCH_CONFIG` environment variable
//! 3. `<config_dir>/airwatch/config.toml`
//! 4. Built-in defaults (no file)
//!
//! A missing file is not an error: the service logs a warning and starts on
//! defaults. A file that exists but does not parse is a `Config` error.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "AIRWATCH_CONFIG";

/// Environment variable naming the database file
pub const DATABASE_ENV_VAR: &str = "AIRWATCH_DATABASE";

/// Longest allowed delivery cooldown (one week)
pub const MAX_COOLDOWN_MINUTES: i64 = 7 * 24 * 60;

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TomlConfig {
    /// Interface the HTTP server binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// SQLite database file (optional)
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub monitor: MonitorConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Background alert monitor settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MonitorConfig {
    #[serde(default = "default_monitor_enabled")]
    pub enabled: bool,

    /// Seconds between subscription sweeps
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Minimum minutes between two deliveries for one subscription
    #[serde(default = "default_cooldown_minutes")]
    pub cooldown_minutes: i64,

    /// Alerts kept per subscription
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5740
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_monitor_enabled() -> bool {
    true
}

fn default_interval_secs() -> u64 {
    30 * 60
}

fn default_cooldown_minutes() -> i64 {
    120
}

fn default_history_limit() -> usize {
    10
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: default_monitor_enabled(),
            interval_secs: default_interval_secs(),
            cooldown_minutes: default_cooldown_minutes(),
            history_limit: default_history_limit(),
        }
    }
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            database_path: None,
            logging: LoggingConfig::default(),
            monitor: MonitorConfig::default(),
        }
    }
}

impl TomlConfig {
    /// Parse TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig =
            toml::from_str(content).map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Resolve and load configuration, falling back to defaults when no file exists
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        match resolve_config_path(cli_path) {
            Some(path) if path.exists() => {
                info!("Loading configuration from {}", path.display());
                Self::from_file(&path)
            }
            Some(path) => {
                warn!(
                    "Config file {} not found, using built-in defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            None => {
                info!("No config file located, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.monitor.interval_secs == 0 {
            return Err(Error::Config(
                "monitor.interval_secs must be greater than zero".to_string(),
            ));
        }
        if !(0..=MAX_COOLDOWN_MINUTES).contains(&self.monitor.cooldown_minutes) {
            return Err(Error::Config(format!(
                "monitor.cooldown_minutes must be between 0 and {}",
                MAX_COOLDOWN_MINUTES
            )));
        }
        if self.monitor.history_limit == 0 {
            return Err(Error::Config(
                "monitor.history_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Database path: CLI → environment → TOML → platform data directory
    pub fn resolve_database_path(&self, cli_path: Option<&Path>) -> PathBuf {
        if let Some(path) = cli_path {
            return path.to_path_buf();
        }
        if let Ok(path) = std::env::var(DATABASE_ENV_VAR) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }
        if let Some(path) = &self.database_path {
            return path.clone();
        }
        default_database_path()
    }
}

/// Where to look for the config file, if anywhere
pub fn resolve_config_path(cli_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_path {
        return Some(path.to_path_buf());
    }
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    dirs::config_dir()
        .map(|d| d.join("airwatch").join("config.toml"))
        .filter(|p| p.exists())
}

/// OS-dependent default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("airwatch"))
        .unwrap_or_else(|| PathBuf::from("./airwatch_data"))
        .join("airwatch.db")
}
