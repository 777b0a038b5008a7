//! Logging infrastructure for stemflow.
//!
//! This module provides:
//! - Per-job loggers that double as the job's event emitter
//! - Compact mode where external tool output only feeds a tail buffer
//! - Integration with the `tracing` ecosystem for process-wide diagnostics
//!
//! # Example
//!
//! ```no_run
//! use stemflow_core::logging::{JobLogger, LogConfig};
//! use stemflow_core::models::JobEvent;
//!
//! let logger = JobLogger::without_file(
//!     "my_job",
//!     LogConfig::default(),
//!     Box::new(|event: JobEvent| println!("{:?}", event)),
//! );
//!
//! logger.info("Starting job");
//! logger.progress(10);
//! logger.finish(true, "Finished - stems ready");
//! ```

mod job_logger;
mod types;

use std::path::Path;

pub use job_logger::JobLogger;
pub use types::{LogConfig, LogLevel, MessagePrefix};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize global tracing subscriber for application-wide logging.
///
/// Respects `RUST_LOG`, falling back to `default_level`, and writes to
/// stderr. Should be called once at startup.
pub fn init_tracing(default_level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_filter_str()));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

/// Initialize tracing with stderr output plus a daily rolling file in `log_dir`.
///
/// The returned guard must be kept alive for the file writer to flush.
/// Returns `None` (and falls back to stderr only) if the directory
/// cannot be created.
pub fn init_tracing_with_file(default_level: LogLevel, log_dir: &Path) -> Option<WorkerGuard> {
    if let Err(e) = std::fs::create_dir_all(log_dir) {
        init_tracing(default_level);
        tracing::warn!("Cannot create log directory {}: {}", log_dir.display(), e);
        return None;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_filter_str()));

    let appender = tracing_appender::rolling::daily(log_dir, "stemflow.log");
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .with(filter)
        .try_init();

    Some(guard)
}

/// Initialize tracing for tests (only logs warnings and above).
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}
