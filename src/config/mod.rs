//! Configuration module for BenchView
//!
//! The application configuration is a single TOML file. Every section and
//! every field has a default, so a partial (or missing) file is valid.
//!
//! # App Data Location
//!
//! The default configuration file lives in the platform-appropriate data
//! directory:
//! - **Linux**: `~/.local/share/dev.benchview.benchview-rs/config.toml`
//! - **macOS**: `~/Library/Application Support/dev.benchview.benchview-rs/config.toml`
//! - **Windows**: `%APPDATA%\dev.benchview.benchview-rs\config.toml`
//!
//! # Example
//!
//! ```toml
//! [ui]
//! request_timeout_ms = 2000
//! default_dock_area = "bottom"
//!
//! [scripting]
//! max_operations = 1000000
//!
//! [logging]
//! filter = "info"
//! log_dir = "/tmp/benchview-logs"
//! ```

pub mod settings;

pub use settings::*;

use crate::error::{BenchViewError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for data directories
pub const APP_ID: &str = "dev.benchview.benchview-rs";

/// Configuration filename
pub const CONFIG_FILE: &str = "config.toml";

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// UI request settings
    #[serde(default)]
    pub ui: UiConfig,

    /// Script sandbox settings
    #[serde(default)]
    pub scripting: ScriptConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Path of the configuration file in the app data directory
    pub fn default_path() -> Option<PathBuf> {
        app_data_dir().map(|p| p.join(CONFIG_FILE))
    }

    /// Load a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            BenchViewError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        toml::from_str(&content).map_err(|e| {
            BenchViewError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })
    }

    /// Load a configuration file, returning defaults if it is missing or invalid
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save the configuration as TOML
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                BenchViewError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| BenchViewError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content).map_err(|e| {
            BenchViewError::Config(format!("Failed to write config file {:?}: {}", path, e))
        })
    }
}
