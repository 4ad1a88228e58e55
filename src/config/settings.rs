//! Configuration sections
//!
//! # Main Types
//!
//! - [`UiConfig`] - Timeout and placement defaults for UI requests
//! - [`ScriptConfig`] - Sandbox limits for the Rhai engine
//! - [`LoggingConfig`] - Log filter and optional log file directory

use crate::types::DockArea;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default timeout for blocking UI requests in milliseconds (0 = wait forever)
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 0;

/// Default maximum number of Rhai operations per script run
pub const DEFAULT_MAX_OPERATIONS: u64 = 50_000_000;

/// Default log filter when RUST_LOG is not set
pub const DEFAULT_LOG_FILTER: &str = "info,benchview=debug";

/// Settings for requests sent from scripts to the GUI thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// How long a blocking request waits for the GUI thread (0 = forever)
    pub request_timeout_ms: u64,

    /// Dock area used when a script does not name one
    pub default_dock_area: DockArea,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            default_dock_area: DockArea::default(),
        }
    }
}

impl UiConfig {
    /// The request timeout, `None` meaning wait forever
    pub fn request_timeout(&self) -> Option<Duration> {
        match self.request_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}

/// Sandbox limits for user scripts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptConfig {
    /// Maximum number of operations per run (0 = unlimited)
    pub max_operations: u64,

    /// Maximum function call depth
    pub max_call_levels: usize,

    /// Maximum length of a string value
    pub max_string_size: usize,

    /// Upper bound for a single `sleep(ms)` call
    pub max_sleep_ms: u64,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            max_operations: DEFAULT_MAX_OPERATIONS,
            max_call_levels: 64,
            max_string_size: 100_000,
            max_sleep_ms: 60_000,
        }
    }
}

/// Logging setup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when RUST_LOG is not set
    pub filter: String,

    /// Directory for a daily rolling log file; stderr only when unset
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
            log_dir: None,
        }
    }
}
