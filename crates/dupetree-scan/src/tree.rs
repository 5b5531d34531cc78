//! Path tree builder.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use dupetree_core::{NodeId, NodeKind, PathNode, PathTree, ScanError, ScanWarning, WarningKind};

use crate::indexer::{canonical_root, walker};
use crate::progress::{Checkpoints, ScanPhase, ScanProgress};

/// Builds a `PathTree` mirroring the files and directories under a root.
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    progress_interval: u64,
}

impl TreeBuilder {
    /// Create a builder with the default checkpoint interval.
    pub fn new() -> Self {
        Self {
            progress_interval: 10_000,
        }
    }

    /// Set the number of entries between progress checkpoints.
    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval.max(1);
        self
    }

    /// Walk `root` into a tree.
    pub fn build(&self, root: impl AsRef<Path>) -> Result<PathTree, ScanError> {
        self.build_with_progress(root, |_| {})
    }

    /// Walk `root` into a tree, calling `on_progress` at every checkpoint.
    ///
    /// Symlinks and special files are not part of the tree. Entries that
    /// cannot be read become warnings.
    pub fn build_with_progress(
        &self,
        root: impl AsRef<Path>,
        mut on_progress: impl FnMut(&ScanProgress),
    ) -> Result<PathTree, ScanError> {
        let start = Instant::now();
        let root_path = canonical_root(root.as_ref())?;
        let mut warnings = Vec::new();

        let entries = walker(&root_path).into_iter().filter_map(|entry_result| {
            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    let path = err.path().map(|p| p.to_path_buf()).unwrap_or_default();
                    warnings.push(ScanWarning::new(path, err.to_string(), WarningKind::ReadError));
                    return None;
                }
            };

            let file_type = entry.file_type();
            let kind = if file_type.is_dir() {
                NodeKind::Directory
            } else if file_type.is_file() {
                NodeKind::File
            } else {
                return None;
            };

            // Same rule as the indexer, so both agree on which files exist.
            let path = entry.path();
            if path.to_str().is_none() {
                tracing::warn!(path = %path.display(), "skipping non-UTF-8 path");
                warnings.push(ScanWarning::non_utf8(&path));
                return None;
            }
            Some((path, kind))
        });

        let mut checkpoints = Checkpoints::new(ScanPhase::Tree, self.progress_interval, &mut on_progress);
        let mut tree = link_entries(root_path, entries, |path| checkpoints.tick(path));

        tree.warnings.splice(0..0, warnings);
        tree.build_duration = start.elapsed();

        tracing::debug!(
            files = tree.stats.total_files,
            dirs = tree.stats.total_dirs,
            orphans = tree.stats.orphans,
            "tree built"
        );

        Ok(tree)
    }

    /// Link pre-walked entries under `root` without touching the file system.
    ///
    /// Entries may arrive in any order. One whose parent has not been
    /// linked yet is dropped and reported as an orphan.
    pub fn from_entries(
        root: impl Into<PathBuf>,
        entries: impl IntoIterator<Item = (PathBuf, NodeKind)>,
    ) -> PathTree {
        link_entries(root.into(), entries, |_| {})
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn link_entries(
    root_path: PathBuf,
    entries: impl IntoIterator<Item = (PathBuf, NodeKind)>,
    mut on_entry: impl FnMut(&Path),
) -> PathTree {
    let mut tree = PathTree::new(root_path.clone());
    let mut directories: HashMap<PathBuf, (NodeId, u32)> = HashMap::new();
    directories.insert(root_path, (tree.root(), 0));

    for (path, kind) in entries {
        on_entry(&path);

        let parent = path.parent().and_then(|parent| directories.get(parent)).copied();
        let Some((parent_id, parent_depth)) = parent else {
            tracing::warn!(path = %path.display(), "parent not seen, leaving entry unlinked");
            tree.stats.record_orphan();
            tree.warnings.push(ScanWarning::orphan(&path));
            continue;
        };

        let depth = parent_depth + 1;
        match kind {
            NodeKind::Directory => {
                tree.stats.record_dir(depth);
                let id = tree.add_child(parent_id, PathNode::new_directory(path.clone()));
                directories.insert(path, (id, depth));
            }
            NodeKind::File => {
                tree.stats.record_file(depth);
                tree.add_child(parent_id, PathNode::new_file(path));
            }
        }
    }

    tree
}
