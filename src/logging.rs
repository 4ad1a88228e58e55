//! Tracing subscriber setup
//!
//! Logs always go to stderr. When a log directory is configured, a daily
//! rolling plain-text file is written as well through a non-blocking
//! writer; the returned [`LoggingGuard`] must be kept alive for the file to
//! be flushed.

use crate::config::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log file name prefix inside the log directory
pub const LOG_FILE_PREFIX: &str = "benchview.log";

/// Keeps the background log writer alive
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Install the global subscriber. RUST_LOG overrides the configured filter.
pub fn init(config: &LoggingConfig) -> LoggingGuard {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.filter));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(true)
        .compact();

    let appender = config.log_dir.as_ref().and_then(|dir| {
        RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(LOG_FILE_PREFIX)
            .build(dir)
            .map_err(|e| eprintln!("Failed to open log file in {}: {}", dir.display(), e))
            .ok()
    });

    let (file_layer, file_guard) = match appender {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_thread_names(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    if let (Some(dir), Some(_)) = (&config.log_dir, &file_guard) {
        tracing::info!("Logging to {}", dir.display());
    }

    LoggingGuard {
        _file_guard: file_guard,
    }
}
