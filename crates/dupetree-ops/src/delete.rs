//! Removal of duplicate files from the disposable subtree.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use dupetree_core::DisposableRoot;

use crate::operation::{DeleteOptions, OperationError};
use crate::progress::{DeletionComplete, OperationProgress};

/// What happened to a single path.
enum Outcome {
    Removed(u64),
    AlreadyGone,
}

/// Removes single files, never outside the disposable subtree.
#[derive(Debug, Clone)]
pub struct Deleter {
    disposable: DisposableRoot,
    options: DeleteOptions,
}

impl Deleter {
    /// Create a deleter that unlinks files under `disposable`.
    pub fn new(disposable: DisposableRoot) -> Self {
        Self::with_options(disposable, DeleteOptions::default())
    }

    /// Create a deleter with custom options.
    pub fn with_options(disposable: DisposableRoot, options: DeleteOptions) -> Self {
        Self {
            disposable,
            options,
        }
    }

    /// The options in effect.
    pub fn options(&self) -> DeleteOptions {
        self.options
    }

    /// Remove every path in the batch.
    pub fn delete<P: AsRef<Path>>(&self, paths: impl IntoIterator<Item = P>) -> DeletionComplete {
        self.delete_with_progress(paths, |_| {})
    }

    /// Remove every path, calling `on_progress` before each one.
    ///
    /// A failing path is recorded and the batch moves on.
    pub fn delete_with_progress<P: AsRef<Path>>(
        &self,
        paths: impl IntoIterator<Item = P>,
        mut on_progress: impl FnMut(&OperationProgress),
    ) -> DeletionComplete {
        let paths: Vec<P> = paths.into_iter().collect();
        let mut progress = OperationProgress::new(paths.len());
        let mut complete = DeletionComplete {
            dry_run: self.options.dry_run,
            ..Default::default()
        };

        for path in &paths {
            let path = path.as_ref();
            progress.current_file = Some(path.to_path_buf());
            on_progress(&progress);

            match self.delete_one(path) {
                Ok(Outcome::Removed(bytes)) => {
                    tracing::debug!(path = %path.display(), bytes, dry_run = self.options.dry_run, "removed");
                    complete.succeeded += 1;
                    complete.bytes_freed += bytes;
                    progress.bytes_freed += bytes;
                }
                Ok(Outcome::AlreadyGone) => {
                    tracing::debug!(path = %path.display(), "already gone");
                    complete.skipped += 1;
                }
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err.message, "deletion failed");
                    complete.failed += 1;
                    complete.errors.push(err);
                    progress.errors += 1;
                }
            }
            progress.files_completed += 1;
        }

        tracing::info!(
            succeeded = complete.succeeded,
            failed = complete.failed,
            skipped = complete.skipped,
            "deletion finished"
        );

        complete
    }

    fn delete_one(&self, path: &Path) -> Result<Outcome, OperationError> {
        if !self.disposable.contains(path) {
            return Err(OperationError::protected(path));
        }

        let metadata = match fs::symlink_metadata(path) {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Outcome::AlreadyGone),
            Err(e) => return Err(OperationError::new(path, e.to_string())),
        };
        if metadata.is_dir() {
            return Err(OperationError::new(path, "is a directory"));
        }
        let size = metadata.len();

        if self.options.dry_run {
            return Ok(Outcome::Removed(size));
        }

        if self.options.use_trash {
            trash::delete(path).map_err(|e| OperationError::new(path, e.to_string()))?;
            return Ok(Outcome::Removed(size));
        }

        match fs::remove_file(path) {
            Ok(()) => Ok(Outcome::Removed(size)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Outcome::AlreadyGone),
            Err(e) => Err(OperationError::new(path, e.to_string())),
        }
    }
}
