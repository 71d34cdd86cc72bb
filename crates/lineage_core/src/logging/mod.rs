//! Logging infrastructure for Clip Lineage.
//!
//! The library logs through `tracing`; this module only installs
//! subscribers for binaries and tests.
//!
//! # Example
//!
//! ```no_run
//! use lineage_core::logging::{init_tracing, LogLevel};
//!
//! init_tracing(LogLevel::Info);
//! tracing::info!("Scanning 3 folders");
//! ```

mod types;

use std::fs;
use std::io;
use std::path::Path;

pub use tracing_appender::non_blocking::WorkerGuard;
pub use types::LogLevel;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// File name of the application log inside the logs folder.
pub const LOG_FILE_NAME: &str = "clip-lineage.log";

/// Initialize global tracing subscriber for application-wide logging.
///
/// This sets up a subscriber that:
/// - Respects RUST_LOG environment variable
/// - Falls back to the provided default level
/// - Outputs to stderr with timestamps
///
/// Should be called once at application startup.
pub fn init_tracing(default_level: LogLevel) {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(io::stderr))
        .with(env_filter(default_level))
        .init();
}

/// Initialize tracing to stderr plus a log file in `logs_dir`.
///
/// The returned guard flushes the file writer on drop; keep it alive for
/// the lifetime of the program.
pub fn init_tracing_with_file(
    default_level: LogLevel,
    logs_dir: &Path,
) -> io::Result<WorkerGuard> {
    fs::create_dir_all(logs_dir)?;
    let appender = tracing_appender::rolling::never(logs_dir, LOG_FILE_NAME);
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .with(env_filter(default_level))
        .init();

    Ok(guard)
}

/// Initialize tracing for tests (only logs warnings and above).
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

fn env_filter(default_level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_filter_str()))
}
