//! Configuration file management for rid-scan.
//!
//! Reads/writes `~/.rid-scan/config.toml` with tracker sizing, the French
//! version policy, report settings, and log level.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::french::FrenchVersionPolicy;
use crate::table::{DEFAULT_CAPACITY, STALE_TIMEOUT};
use crate::types::RidError;

/// Full configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: String,
    pub tracker: TrackerConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Regular slots; the overflow sentinel is extra.
    pub capacity: usize,
    pub stale_timeout_secs: f64,
    pub french_version_policy: FrenchVersionPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    Json,
    Table,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub interval_ms: u64,
    /// Period of the overflow-slot heartbeat; 0 disables it.
    pub heartbeat_ms: u64,
    pub format: ReportFormat,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: "info".into(),
            tracker: TrackerConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            capacity: DEFAULT_CAPACITY,
            stale_timeout_secs: STALE_TIMEOUT,
            french_version_policy: FrenchVersionPolicy::default(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig {
            interval_ms: 1000,
            heartbeat_ms: 10_000,
            format: ReportFormat::Json,
        }
    }
}

/// Get the config directory path (`~/.rid-scan/`).
pub fn config_dir() -> PathBuf {
    dirs_home().join(".rid-scan")
}

/// Get the config file path.
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Load config from `~/.rid-scan/config.toml`.
///
/// Returns default config if the file doesn't exist or doesn't parse.
pub fn load_config() -> Config {
    load_config_from(&config_file())
}

/// Load config from an explicit path, falling back to defaults.
pub fn load_config_from(path: &Path) -> Config {
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(_) => return Config::default(),
    };
    match parse_config(&text) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("ignoring {}: {e}", path.display());
            Config::default()
        }
    }
}

/// Save config to `~/.rid-scan/config.toml`.
pub fn save_config(config: &Config) -> Result<PathBuf, RidError> {
    let path = config_file();
    save_config_to(config, &path)?;
    Ok(path)
}

/// Save config to an explicit path, creating parent directories.
pub fn save_config_to(config: &Config, path: &Path) -> Result<(), RidError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| RidError::Config(e.to_string()))?;
    }
    let text = toml::to_string_pretty(config).map_err(|e| RidError::Config(e.to_string()))?;
    std::fs::write(path, text).map_err(|e| RidError::Config(e.to_string()))?;
    Ok(())
}

/// Parse config text; missing keys take their defaults.
pub fn parse_config(text: &str) -> Result<Config, RidError> {
    toml::from_str(text).map_err(|e| RidError::Config(e.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
