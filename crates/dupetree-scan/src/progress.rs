//! Progress checkpoints for long traversals.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Which traversal a progress update belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    /// Enumerating regular files for the index.
    Enumerate,
    /// Hashing files that share a size.
    Hash,
    /// Walking entries into the path tree.
    Tree,
}

impl std::fmt::Display for ScanPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Enumerate => write!(f, "Enumerating"),
            Self::Hash => write!(f, "Hashing"),
            Self::Tree => write!(f, "Building tree"),
        }
    }
}

/// Progress information delivered at each checkpoint.
#[derive(Debug, Clone)]
pub struct ScanProgress {
    /// Current phase.
    pub phase: ScanPhase,
    /// Items processed so far in this phase.
    pub items: u64,
    /// Path being processed when the checkpoint fired.
    pub current_path: PathBuf,
    /// Time elapsed since the phase started.
    pub elapsed: Duration,
}

impl ScanProgress {
    /// Calculate rate in items per second.
    pub fn items_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.items as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }
}

/// Counts items and fires the callback every `interval` of them.
pub(crate) struct Checkpoints<'a> {
    phase: ScanPhase,
    interval: u64,
    count: u64,
    start: Instant,
    callback: &'a mut dyn FnMut(&ScanProgress),
}

impl<'a> Checkpoints<'a> {
    pub fn new(
        phase: ScanPhase,
        interval: u64,
        callback: &'a mut dyn FnMut(&ScanProgress),
    ) -> Self {
        Self {
            phase,
            interval: interval.max(1),
            count: 0,
            start: Instant::now(),
            callback,
        }
    }

    /// Count one item, firing the callback on every interval boundary.
    pub fn tick(&mut self, path: &Path) {
        self.count += 1;
        if self.count % self.interval == 0 {
            (self.callback)(&ScanProgress {
                phase: self.phase,
                items: self.count,
                current_path: path.to_path_buf(),
                elapsed: self.start.elapsed(),
            });
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}
