//! Deletion request types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Options for a deletion batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOptions {
    /// Report what would be removed without touching anything.
    pub dry_run: bool,
    /// Move files to the OS trash instead of unlinking them.
    pub use_trash: bool,
}

impl DeleteOptions {
    /// Options that only report.
    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            use_trash: false,
        }
    }

    /// Options that move files to the trash.
    pub fn with_trash() -> Self {
        Self {
            dry_run: false,
            use_trash: true,
        }
    }
}

/// An error that occurred while removing one path.
///
/// Collected per path; a failure never aborts the batch.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("{}: {message}", path.display())]
pub struct OperationError {
    /// The path that caused the error.
    pub path: PathBuf,
    /// A human-readable error message.
    pub message: String,
}

impl OperationError {
    /// Create a new operation error.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Refusal for a path outside the disposable subtree.
    pub fn protected(path: impl Into<PathBuf>) -> Self {
        Self::new(path, "protected path")
    }
}
