//! Error handling for BenchView
//!
//! This module defines the crate error type and a Result alias for use
//! throughout the application.
//!
//! Note that a timed-out view request and a request naming a vanished
//! device are *not* errors: both surface as an empty
//! [`ViewHandle`](crate::types::ViewHandle).

use thiserror::Error;

/// Main error type for BenchView operations
#[derive(Error, Debug)]
pub enum BenchViewError {
    /// Errors related to Rhai script compilation or execution
    #[error("Script error: {0}")]
    Script(String),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors related to channel communication
    #[error("Channel error: {0}")]
    Channel(String),

    /// A device, channel, signal or configurable could not be resolved
    #[error("Session error: {0}")]
    Session(String),

    /// A view could not be created or modified
    #[error("View error: {0}")]
    View(String),

    /// A blocking UI request was issued from the GUI thread itself
    #[error("Blocking UI request issued on the GUI thread")]
    CalledOnGuiThread,

    /// A blocking UI request was issued while another one is still waiting
    #[error("Another blocking UI request is already waiting on this proxy")]
    RequestInFlight,

    /// The GUI side has shut down
    #[error("UI host has shut down")]
    HostClosed,

    /// The script runner is already executing a script
    #[error("A script is already running")]
    ScriptBusy,

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<BenchViewError>,
    },
}

impl BenchViewError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        BenchViewError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create a script error from a Rhai error
    pub fn from_rhai_error(err: Box<rhai::EvalAltResult>) -> Self {
        BenchViewError::Script(err.to_string())
    }
}

/// Result type alias for BenchView operations
pub type Result<T> = std::result::Result<T, BenchViewError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, Box<rhai::EvalAltResult>> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| BenchViewError::from_rhai_error(e).with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| BenchViewError::from_rhai_error(e).with_context(f()))
    }
}
