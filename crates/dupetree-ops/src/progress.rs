//! Progress reporting types for deletion batches.

use std::path::PathBuf;

use humansize::{BINARY, format_size};
use serde::{Deserialize, Serialize};

use crate::OperationError;

/// Progress information for an ongoing deletion batch.
#[derive(Debug, Clone)]
pub struct OperationProgress {
    /// Number of paths handled so far.
    pub files_completed: usize,
    /// Total number of paths in the batch.
    pub files_total: usize,
    /// Bytes freed so far.
    pub bytes_freed: u64,
    /// The path about to be handled.
    pub current_file: Option<PathBuf>,
    /// Errors encountered so far.
    pub errors: usize,
}

impl OperationProgress {
    /// Create a new progress tracker for a batch.
    pub fn new(files_total: usize) -> Self {
        Self {
            files_completed: 0,
            files_total,
            bytes_freed: 0,
            current_file: None,
            errors: 0,
        }
    }

    /// Get the progress as a percentage (0.0 to 100.0).
    pub fn percentage(&self) -> f64 {
        if self.files_total > 0 {
            (self.files_completed as f64 / self.files_total as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// Result of a completed deletion batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeletionComplete {
    /// Paths removed, or that would be removed in a dry run.
    pub succeeded: usize,
    /// Paths refused or that failed to remove.
    pub failed: usize,
    /// Paths already gone before removal.
    pub skipped: usize,
    /// Bytes freed, or that would be freed in a dry run.
    pub bytes_freed: u64,
    /// Whether nothing was actually removed.
    pub dry_run: bool,
    /// Errors that occurred.
    pub errors: Vec<OperationError>,
}

impl DeletionComplete {
    /// Check if every path was removed or already gone.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Get a human-readable summary of the batch.
    pub fn summary(&self) -> String {
        let freed = format_size(self.bytes_freed, BINARY);
        let mut msg = if self.dry_run {
            format!("Would delete {} files, would free {}", self.succeeded, freed)
        } else {
            format!("Deleted {} files, freed {}", self.succeeded, freed)
        };
        if self.skipped > 0 {
            msg.push_str(&format!(", {} already gone", self.skipped));
        }
        if self.failed > 0 {
            msg.push_str(&format!(", {} failed", self.failed));
        }
        msg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percentage() {
        let mut progress = OperationProgress::new(4);
        assert_eq!(progress.percentage(), 0.0);
        progress.files_completed = 1;
        assert_eq!(progress.percentage(), 25.0);
        assert_eq!(OperationProgress::new(0).percentage(), 0.0);
    }

    #[test]
    fn test_summary() {
        let complete = DeletionComplete {
            succeeded: 2,
            bytes_freed: 2048,
            ..Default::default()
        };
        assert!(complete.is_success());
        assert_eq!(complete.summary(), "Deleted 2 files, freed 2 KiB");

        let complete = DeletionComplete {
            succeeded: 1,
            failed: 1,
            skipped: 3,
            bytes_freed: 0,
            dry_run: true,
            errors: vec![OperationError::protected("/keep")],
        };
        assert!(!complete.is_success());
        assert_eq!(
            complete.summary(),
            "Would delete 1 files, would free 0 B, 3 already gone, 1 failed"
        );
    }
}
