//! Tracing subscriber initialization.
//!
//! The CLI logs to a file by default so stdout stays machine-readable.
//! Users can monitor logs via `tail -f` or pick stderr with `--log-file -`.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::EnvFilter;

/// Error type for logging initialization failures.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// Failed to create log directory
    #[error("Failed to create log directory at {path:?}: {source}")]
    DirectoryCreation {
        /// The directory path that failed to be created
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Invalid log file path (no filename component)
    #[error("Invalid log file path: {0:?}")]
    InvalidPath(PathBuf),

    /// Log path has no parent directory
    #[error("Log path has no parent directory: {0:?}")]
    NoParentDirectory(PathBuf),

    /// Tracing subscriber already initialized
    #[error("Tracing subscriber already initialized")]
    SubscriberAlreadySet,
}

/// Where log output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// Append to a file, creating its directory.
    File(PathBuf),
    /// Standard error.
    Stderr,
}

impl LogTarget {
    /// `-` selects stderr, anything else is a file path.
    pub fn from_path(path: PathBuf) -> Self {
        if path.as_os_str() == "-" {
            Self::Stderr
        } else {
            Self::File(path)
        }
    }
}

/// Initialize the global tracing subscriber.
///
/// Respects RUST_LOG, defaults to "info" level.
///
/// # Errors
///
/// Fails if the log directory cannot be created, the path has no file
/// name, or a subscriber was already installed.
pub fn init(target: &LogTarget) -> Result<(), LoggingError> {
    let result = match target {
        LogTarget::File(path) => tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_writer(file_appender(path)?)
            .with_ansi(false) // No ANSI colors in log files
            .try_init(),
        LogTarget::Stderr => tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_writer(std::io::stderr)
            .try_init(),
    };
    result.map_err(|_| LoggingError::SubscriberAlreadySet)
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Open a non-rotating appender for `log_path`, creating its directory.
fn file_appender(log_path: &Path) -> Result<RollingFileAppender, LoggingError> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| LoggingError::DirectoryCreation {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let file_name = log_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| LoggingError::InvalidPath(log_path.to_path_buf()))?;

    let directory = log_path
        .parent()
        .ok_or_else(|| LoggingError::NoParentDirectory(log_path.to_path_buf()))?;

    Ok(tracing_appender::rolling::never(directory, file_name))
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
