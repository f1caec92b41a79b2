//! Log output setup.
//!
//! The terminal belongs to the interface while the game runs, so log records go to a file in the
//! data directory instead. The filter defaults to `info` and follows `RUST_LOG` when it is set.

use std::path::Path;

use color_eyre::eyre::{eyre, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// File name of the log inside the data directory.
pub const LOG_FILE: &str = "mazerunner.log";

/// Installs the global subscriber writing to [`LOG_FILE`] inside `dir`.
///
/// This function returns the guard of the background writer. Records still buffered when the
/// guard is dropped are flushed, so it has to live until the program exits.
///
/// # Errors
///
/// - A report if a global subscriber is already installed.
pub fn init(dir: &Path) -> Result<WorkerGuard> {
    let appender = tracing_appender::rolling::never(dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|err| eyre!(err))?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "logging initialized");

    Ok(guard)
}
