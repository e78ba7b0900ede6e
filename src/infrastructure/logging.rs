//! Centralized file-based logging system
//!
//! Writes logs to files under the configured directory, separated by type:
//! - main/   - every event, JSON
//! - error/  - WARN and ERROR only
//! - venue/  - fetch adapters and normalization
//! - ledger/ - ledger reads and writes

use super::config::LoggingConfig;
use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
    EnvFilter,
};

const LOG_TYPES: [&str; 4] = ["main", "error", "venue", "ledger"];

/// Initialize centralized file logging
///
/// Creates the log directories and sets up one appender per log type.
/// Returns WorkerGuards which must be kept alive for the duration of the program.
pub fn init_logging(config: &LoggingConfig) -> std::io::Result<Vec<WorkerGuard>> {
    create_log_dirs(&config.dir)?;

    let mut guards = Vec::new();

    // Main log - all logs
    let (main_appender, main_guard) = create_appender(&config.dir, "main");
    guards.push(main_guard);

    // Error log - ERROR and WARN only
    let (error_appender, error_guard) = create_appender(&config.dir, "error");
    guards.push(error_guard);

    // Venue log - fetch adapters
    let (venue_appender, venue_guard) = create_appender(&config.dir, "venue");
    guards.push(venue_guard);

    // Ledger log - persistence
    let (ledger_appender, ledger_guard) = create_appender(&config.dir, "ledger");
    guards.push(ledger_guard);

    let main_layer = tracing_subscriber::fmt::layer()
        .with_writer(main_appender)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .json();

    let error_layer = tracing_subscriber::fmt::layer()
        .with_writer(error_appender)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_filter(tracing_subscriber::filter::LevelFilter::WARN);

    let venue_layer = tracing_subscriber::fmt::layer()
        .with_writer(venue_appender)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_filter(tracing_subscriber::filter::filter_fn(|metadata| {
            metadata.target().contains("venue") || metadata.target().contains("exchange")
        }));

    let ledger_layer = tracing_subscriber::fmt::layer()
        .with_writer(ledger_appender)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_filter(tracing_subscriber::filter::filter_fn(|metadata| {
            metadata.target().contains("ledger")
        }));

    // Console layer for interactive runs
    let console_layer = config.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_level(true)
    });

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    tracing_subscriber::registry()
        .with(filter)
        .with(main_layer)
        .with(error_layer)
        .with(venue_layer)
        .with(ledger_layer)
        .with(console_layer)
        .init();

    tracing::info!("Logging system initialized. Log files in {}", config.dir.display());

    Ok(guards)
}

/// Create the root log directory and one subdirectory per log type
fn create_log_dirs(root: &Path) -> std::io::Result<()> {
    for log_type in &LOG_TYPES {
        fs::create_dir_all(root.join(log_type))?;
    }
    Ok(())
}

/// Create a daily rolling file appender
fn create_appender(root: &Path, name: &str) -> (NonBlocking, WorkerGuard) {
    let appender = RollingFileAppender::new(Rotation::DAILY, root.join(name), name);

    tracing_appender::non_blocking(appender)
}

/// Log macro helpers for specific log types
#[macro_export]
macro_rules! log_venue {
    ($level:expr, $($arg:tt)+) => {
        tracing::event!(target: "venue", $level, $($arg)+)
    };
}

#[macro_export]
macro_rules! log_ledger {
    ($level:expr, $($arg:tt)+) => {
        tracing::event!(target: "ledger", $level, $($arg)+)
    };
}

#[macro_export]
macro_rules! log_cycle {
    ($level:expr, $($arg:tt)+) => {
        tracing::event!(target: "cycle", $level, $($arg)+)
    };
}
