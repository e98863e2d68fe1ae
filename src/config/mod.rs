//! Configuration module for parsebridge.
//!
//! Handles the config file, environment overrides, and bridge settings.

mod settings;

pub use settings::{
    BridgeMode, BridgeSettings, LoggingSettings, Settings, SettingsError, CONFIG_ENV, LOG_ENV,
    MODE_ENV,
};
