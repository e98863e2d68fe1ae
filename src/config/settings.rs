//! TOML-based configuration for parsebridge.
//!
//! Example configuration:
//! ```toml
//! [bridge]
//! mode = "worker"              # or "in_process"
//! thread_name = "parsebridge-worker"
//! stack_size = 8388608         # optional, bytes
//! dispatch_threads = 1
//!
//! [logging]
//! filter = "parsebridge=info"
//! ansi = true
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "PARSEBRIDGE_CONFIG";
/// Environment variable overriding `bridge.mode`.
pub const MODE_ENV: &str = "PARSEBRIDGE_MODE";
/// Environment variable overriding `logging.filter`.
pub const LOG_ENV: &str = "PARSEBRIDGE_LOG";

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid bridge mode: {0}")]
    InvalidMode(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Bridge configuration.
    pub bridge: BridgeSettings,

    /// Logging configuration.
    pub logging: LoggingSettings,
}

/// Which bridge the client talks through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgeMode {
    /// Backend on a dedicated worker thread.
    #[default]
    Worker,
    /// Backend called directly on the caller's thread.
    InProcess,
}

impl FromStr for BridgeMode {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "worker" => Ok(BridgeMode::Worker),
            "in_process" | "in-process" | "inprocess" => Ok(BridgeMode::InProcess),
            other => Err(SettingsError::InvalidMode(other.to_string())),
        }
    }
}

impl fmt::Display for BridgeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeMode::Worker => f.write_str("worker"),
            BridgeMode::InProcess => f.write_str("in_process"),
        }
    }
}

/// Bridge configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BridgeSettings {
    pub mode: BridgeMode,

    /// Name given to the worker thread.
    pub thread_name: String,

    /// Worker thread stack size in bytes (platform default if unset).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_size: Option<usize>,

    /// Maximum number of calls the worker runs against the backend at once.
    pub dispatch_threads: usize,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            mode: BridgeMode::Worker,
            thread_name: "parsebridge-worker".to_string(),
            stack_size: None,
            dispatch_threads: 1,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    pub filter: String,

    /// Colorize output.
    pub ansi: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "parsebridge=info".to_string(),
            ansi: true,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `PARSEBRIDGE_CONFIG`
    /// 2. `./parsebridge.toml`
    /// 3. `~/.config/parsebridge/config.toml`
    ///
    /// Environment overrides are applied to whatever was found.
    pub fn load() -> Result<Self, SettingsError> {
        let mut settings = Self::find()?;
        settings.apply_env_overrides()?;
        settings.validate()?;
        Ok(settings)
    }

    fn find() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var(CONFIG_ENV) {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("parsebridge.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("parsebridge").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Apply `PARSEBRIDGE_MODE` and `PARSEBRIDGE_LOG` if set.
    pub fn apply_env_overrides(&mut self) -> Result<(), SettingsError> {
        if let Ok(mode) = env::var(MODE_ENV) {
            self.bridge.mode = mode.parse()?;
        }
        if let Ok(filter) = env::var(LOG_ENV) {
            self.logging.filter = filter;
        }
        Ok(())
    }

    /// Check values serde cannot check on its own.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.bridge.thread_name.trim().is_empty() {
            return Err(SettingsError::InvalidConfig(
                "bridge.thread_name must not be empty".to_string(),
            ));
        }
        if self.bridge.dispatch_threads == 0 {
            return Err(SettingsError::InvalidConfig(
                "bridge.dispatch_threads must be at least 1".to_string(),
            ));
        }
        if self.bridge.stack_size == Some(0) {
            return Err(SettingsError::InvalidConfig(
                "bridge.stack_size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
