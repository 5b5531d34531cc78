//! Run configuration types.

use std::path::Path;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::ScanError;

/// Path prefix marking the subtree whose files may be removed.
///
/// Membership is a plain string-prefix test on a path's string form, so
/// `/data/old` also matches `/data/older`. Give the prefix a trailing
/// separator to restrict it to one directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisposableRoot(String);

impl DisposableRoot {
    /// Create a disposable root from a path prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self(prefix.into())
    }

    /// Create a disposable root covering exactly the directory `dir`.
    ///
    /// Appends the platform separator so sibling directories sharing a
    /// name prefix are not included.
    pub fn directory(dir: impl AsRef<Path>) -> Self {
        let mut prefix = dir.as_ref().to_string_lossy().into_owned();
        if !prefix.ends_with(std::path::MAIN_SEPARATOR) {
            prefix.push(std::path::MAIN_SEPARATOR);
        }
        Self(prefix)
    }

    /// The configured prefix.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether `path` lies in the disposable subtree.
    ///
    /// An empty prefix designates nothing.
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        !self.0.is_empty() && path.as_ref().to_string_lossy().starts_with(&self.0)
    }
}

impl std::fmt::Display for DisposableRoot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Configuration shared by indexing, aggregation and selection.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct DedupeConfig {
    /// Subtree eligible for automated removal.
    #[builder(default)]
    #[serde(default)]
    pub disposable_root: DisposableRoot,

    /// Minimum duplicate fraction for a node to be selected.
    #[builder(default = "1.0")]
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Candidates must hold strictly more duplicate files than this.
    #[builder(default = "20")]
    #[serde(default = "default_min_duplicates")]
    pub min_duplicates: u64,

    /// Read buffer size used while hashing.
    #[builder(default = "65536")]
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Number of items between progress checkpoints.
    #[builder(default = "10_000")]
    #[serde(default = "default_progress_interval")]
    pub progress_interval: u64,

    /// Skip files that fail to read while hashing instead of aborting.
    #[builder(default = "false")]
    #[serde(default)]
    pub skip_unreadable: bool,
}

fn default_threshold() -> f64 {
    1.0
}

fn default_min_duplicates() -> u64 {
    20
}

fn default_chunk_size() -> usize {
    65536
}

fn default_progress_interval() -> u64 {
    10_000
}

impl DedupeConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(threshold) = self.threshold {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(format!("Threshold must be within [0, 1], got {threshold}"));
            }
        }
        if self.chunk_size == Some(0) {
            return Err("Chunk size must be greater than zero".to_string());
        }
        if self.progress_interval == Some(0) {
            return Err("Progress interval must be greater than zero".to_string());
        }
        Ok(())
    }
}

impl DedupeConfig {
    /// Create a new config builder.
    pub fn builder() -> DedupeConfigBuilder {
        DedupeConfigBuilder::default()
    }

    /// Create a config with defaults and the given disposable root.
    pub fn new(disposable_root: DisposableRoot) -> Self {
        Self {
            disposable_root,
            threshold: default_threshold(),
            min_duplicates: default_min_duplicates(),
            chunk_size: default_chunk_size(),
            progress_interval: default_progress_interval(),
            skip_unreadable: false,
        }
    }

    /// Re-check the invariants the builder enforces.
    ///
    /// Needed for configs that bypass the builder, e.g. ones read from disk.
    pub fn validate(&self) -> Result<(), ScanError> {
        DedupeConfigBuilder {
            threshold: Some(self.threshold),
            chunk_size: Some(self.chunk_size),
            progress_interval: Some(self.progress_interval),
            ..Default::default()
        }
        .validate()
        .map_err(|message| ScanError::InvalidConfig { message })
    }
}

impl Default for DedupeConfig {
    fn default() -> Self {
        Self::new(DisposableRoot::default())
    }
}
