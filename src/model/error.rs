//! Error types for thread-order.
//!
//! Errors are `thiserror` enums composed with `?` and `From` conversions.
//!
//! # Error Hierarchy
//!
//! - [`AppError`] - Top-level CLI error wrapping every failure the binary can hit
//!   - [`crate::config::ConfigError`] - config file read/parse failures
//!   - [`crate::logging::LoggingError`] - tracing subscriber setup failures
//!   - [`SnapshotError`] - page snapshot read/parse failures
//!   - [`StoreError`] - preference store access failures
//! - [`SyncError`] - per-view failures raised by the synchronizer
//!   - `ContainerNotFound` - the thread view lacks a required container
//!   - [`StoreError`] - the store rejected a read or write
//! - [`crate::model::MalformedEntry`] - an entry without a usable id; not an
//!   error of the view, reported as `Reaction::Skipped`
//!
//! # Error Recovery Strategy
//!
//! Every [`SyncError`] is scoped to one thread view. None of them stop other
//! views from binding or reordering, and none of them are retried
//! automatically: the next notification or discovery pass is the retry.

use crate::model::ViewId;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error for the command-line front end.
///
/// # Examples
///
/// ```
/// use thread_order::model::error::{AppError, StoreError};
///
/// fn read_pref() -> Result<(), AppError> {
///     let failure = StoreError::Read { key: "reversed_order".into(), reason: "offline".into() };
///     Err(failure.into())
/// }
/// assert!(read_pref().unwrap_err().to_string().contains("offline"));
/// ```
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Tracing could not be initialized.
    #[error("Logging error: {0}")]
    Logging(#[from] crate::logging::LoggingError),

    /// The page snapshot could not be read.
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    /// The preference store rejected an operation.
    #[error("Preference store error: {0}")]
    Store(#[from] StoreError),

    /// Writing output failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of the preference store.
///
/// Every store operation returns these explicitly. A failed read or write
/// is never folded into a "missing value"; the caller decides how to
/// degrade (binding treats a failed read as `Default`).
#[derive(Debug, Error)]
pub enum StoreError {
    /// A `get` was rejected.
    #[error("Failed to read preference {key:?}: {reason}")]
    Read {
        /// Key being read.
        key: String,
        /// Backend's description of the failure.
        reason: String,
    },

    /// A `set` was rejected.
    #[error("Failed to write preference {key:?}: {reason}")]
    Write {
        /// Key being written.
        key: String,
        /// Backend's description of the failure.
        reason: String,
    },

    /// The backing file could not be read or written.
    #[error("Failed to persist preferences at {path:?}: {source}")]
    Persist {
        /// Backing file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The backing file does not contain a JSON object.
    #[error("Preference file {path:?} is not valid: {reason}")]
    Decode {
        /// Backing file.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },
}

/// Which container of a thread view is meant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    /// The list holding the entries.
    Entries,
    /// The native tab controls the toggle is rendered next to.
    Controls,
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerKind::Entries => f.write_str("entries container"),
            ContainerKind::Controls => f.write_str("control container"),
        }
    }
}

/// Failures scoped to a single thread view.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The view is missing a container it needs. The view stays unbound and
    /// a later discovery pass may try again.
    #[error("View {view} has no {container}")]
    ContainerNotFound {
        /// The view that could not be bound.
        view: ViewId,
        /// Which container was missing.
        container: ContainerKind,
    },

    /// The preference store rejected an operation.
    #[error("Store access failed: {0}")]
    StoreAccess(#[from] StoreError),
}

impl SyncError {
    /// Whether a later discovery pass may succeed where this one failed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::ContainerNotFound { .. })
    }
}

/// Errors loading a page snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// File could not be read.
    #[error("Failed to read snapshot {path:?}: {source}")]
    Read {
        /// Snapshot path.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// File is not a valid snapshot document.
    #[error("Invalid snapshot {path:?}: {reason}")]
    Parse {
        /// Snapshot path.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },

    /// A thread's id is blank.
    #[error("Thread #{index} in snapshot has an empty id")]
    EmptyThreadId {
        /// Position of the thread in the document.
        index: usize,
    },
}
