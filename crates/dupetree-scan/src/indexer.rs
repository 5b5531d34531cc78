//! Content fingerprint indexer.
//!
//! Files are grouped by size first. Only sizes shared by two or more files
//! are hashed, so a file with a unique size is never opened.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use derive_builder::Builder;
use jwalk::{Parallelism, WalkDir};

use dupetree_core::{
    DedupeConfig, FingerprintRecord, IndexError, IndexWriter, ScanError, ScanWarning, WarningKind,
};

use crate::hasher::DualHasher;
use crate::progress::{Checkpoints, ScanPhase, ScanProgress};

/// Configuration for building a fingerprint index.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct IndexConfig {
    /// Read buffer size used while hashing.
    #[builder(default = "64 * 1024")]
    pub chunk_size: usize,

    /// Number of files between progress checkpoints.
    #[builder(default = "10_000")]
    pub progress_interval: u64,

    /// Skip files that fail to read while hashing instead of aborting.
    #[builder(default = "false")]
    pub skip_unreadable: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            chunk_size: 64 * 1024,
            progress_interval: 10_000,
            skip_unreadable: false,
        }
    }
}

impl IndexConfig {
    /// Create a new config builder.
    pub fn builder() -> IndexConfigBuilder {
        IndexConfigBuilder::default()
    }
}

impl From<&DedupeConfig> for IndexConfig {
    fn from(config: &DedupeConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            progress_interval: config.progress_interval,
            skip_unreadable: config.skip_unreadable,
        }
    }
}

/// Counters for one indexing run.
#[derive(Debug, Clone, Default)]
pub struct IndexStats {
    /// Regular files enumerated under the root.
    pub files_enumerated: u64,
    /// Distinct sizes shared by at least two files.
    pub size_groups: u64,
    /// Files dropped because no other file has their size.
    pub singletons_pruned: u64,
    /// Files streamed through the hashers.
    pub files_hashed: u64,
    /// Bytes streamed through the hashers.
    pub bytes_hashed: u64,
    /// Files skipped after a read failure.
    pub skipped: u64,
    /// Wall time for the whole run.
    pub duration: Duration,
}

/// Records and diagnostics from one indexing run.
#[derive(Debug, Clone, Default)]
pub struct IndexOutput {
    /// Records sorted by `(size, hash1, hash2, path)`.
    pub records: Vec<FingerprintRecord>,
    /// Run counters.
    pub stats: IndexStats,
    /// Non-fatal problems met while walking or hashing.
    pub warnings: Vec<ScanWarning>,
}

impl IndexOutput {
    /// Persist the records to an index file.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<u64, IndexError> {
        let mut writer = IndexWriter::create(path)?;
        writer.write_all(&self.records)?;
        let rows = writer.rows();
        writer.finish()?;
        Ok(rows)
    }
}

/// Builds fingerprint records for every duplicate-size file under a root.
#[derive(Debug, Clone, Default)]
pub struct Indexer {
    config: IndexConfig,
}

impl Indexer {
    /// Create an indexer with default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an indexer with custom config.
    pub fn with_config(config: IndexConfig) -> Self {
        Self { config }
    }

    /// Index `root` without progress reporting.
    pub fn index(&self, root: impl AsRef<Path>) -> Result<IndexOutput, ScanError> {
        self.index_with_progress(root, |_| {})
    }

    /// Index `root`, calling `on_progress` at every checkpoint.
    pub fn index_with_progress(
        &self,
        root: impl AsRef<Path>,
        mut on_progress: impl FnMut(&ScanProgress),
    ) -> Result<IndexOutput, ScanError> {
        let start = Instant::now();
        let root_path = canonical_root(root.as_ref())?;
        let mut output = IndexOutput::default();

        let by_size = self.group_by_size(&root_path, &mut output, &mut on_progress);
        tracing::debug!(
            files = output.stats.files_enumerated,
            sizes = by_size.len(),
            "enumerated files"
        );

        let mut checkpoints = Checkpoints::new(
            ScanPhase::Hash,
            self.config.progress_interval,
            &mut on_progress,
        );

        for (size, paths) in by_size {
            if paths.len() < 2 {
                output.stats.singletons_pruned += 1;
                continue;
            }
            output.stats.size_groups += 1;

            let mut group = Vec::with_capacity(paths.len());
            for path in paths {
                checkpoints.tick(&path);
                match DualHasher::hash_file(&path, self.config.chunk_size) {
                    Ok(fingerprint) => {
                        if fingerprint.size != size {
                            tracing::debug!(
                                path = %path.display(),
                                enumerated = size,
                                read = fingerprint.size,
                                "file changed size while indexing"
                            );
                        }
                        output.stats.files_hashed += 1;
                        output.stats.bytes_hashed += fingerprint.size;
                        group.push(FingerprintRecord::new(fingerprint, path));
                    }
                    Err(err) if self.config.skip_unreadable => {
                        tracing::warn!(path = %path.display(), error = %err, "skipping unreadable file");
                        output.warnings.push(ScanWarning::read_error(&path, &err));
                        output.stats.skipped += 1;
                    }
                    Err(err) => return Err(ScanError::io(path, err)),
                }
            }

            group.sort();
            output.records.append(&mut group);
        }

        // A file that changed size mid-run can land out of place.
        output.records.sort();
        output.stats.duration = start.elapsed();

        tracing::info!(
            records = output.records.len(),
            hashed = output.stats.files_hashed,
            pruned = output.stats.singletons_pruned,
            "index built"
        );

        Ok(output)
    }

    /// Enumerate regular files into an ordered `size -> paths` map.
    fn group_by_size(
        &self,
        root_path: &Path,
        output: &mut IndexOutput,
        on_progress: &mut dyn FnMut(&ScanProgress),
    ) -> BTreeMap<u64, Vec<PathBuf>> {
        let mut by_size: BTreeMap<u64, Vec<PathBuf>> = BTreeMap::new();
        let mut checkpoints = Checkpoints::new(
            ScanPhase::Enumerate,
            self.config.progress_interval,
            on_progress,
        );

        for entry_result in walker(root_path) {
            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    let path = err.path().map(|p| p.to_path_buf()).unwrap_or_default();
                    output
                        .warnings
                        .push(ScanWarning::new(path, err.to_string(), WarningKind::ReadError));
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            // The index stores paths as text.
            if path.to_str().is_none() {
                tracing::warn!(path = %path.display(), "skipping non-UTF-8 path");
                output.warnings.push(ScanWarning::non_utf8(&path));
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(err) => {
                    output.warnings.push(ScanWarning::new(
                        &path,
                        err.to_string(),
                        WarningKind::MetadataError,
                    ));
                    continue;
                }
            };

            checkpoints.tick(&path);
            by_size.entry(metadata.len()).or_default().push(path);
        }

        output.stats.files_enumerated = checkpoints.count();
        by_size
    }
}

/// Resolve and validate a traversal root.
pub(crate) fn canonical_root(root: &Path) -> Result<PathBuf, ScanError> {
    let root_path = root.canonicalize().map_err(|e| ScanError::io(root, e))?;
    if !root_path.is_dir() {
        return Err(ScanError::NotADirectory { path: root_path });
    }
    Ok(root_path)
}

/// Sequential, sorted walk below `root`, symlinks not followed.
pub(crate) fn walker(root: &Path) -> WalkDir {
    WalkDir::new(root)
        .parallelism(Parallelism::Serial)
        .sort(true)
        .skip_hidden(false)
        .follow_links(false)
        .min_depth(1)
}
