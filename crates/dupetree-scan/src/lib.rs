//! File system indexing and tree building for dupetree.
//!
//! # Overview
//!
//! `dupetree-scan` walks a root two ways:
//!
//! - **Indexer** groups regular files by size, prunes sizes held by a
//!   single file, and fingerprints the rest with BLAKE3 and SHA-256 in one
//!   streaming pass per file.
//! - **TreeBuilder** mirrors files and directories into an arena-backed
//!   `PathTree` for aggregation.
//!
//! Both walks are sequential and sorted, so repeated runs over an unchanged
//! tree produce identical output.
//!
//! # Example
//!
//! ```rust,no_run
//! use dupetree_scan::{Indexer, TreeBuilder};
//!
//! let output = Indexer::new().index("/path/to/scan").unwrap();
//! output.write_to("index.csv").unwrap();
//! println!("Fingerprinted {} files", output.records.len());
//!
//! let tree = TreeBuilder::new().build("/path/to/scan").unwrap();
//! println!("Tree holds {} files", tree.stats.total_files);
//! ```
//!
//! # Progress Monitoring
//!
//! Both walks accept a callback fired every `progress_interval` items:
//!
//! ```rust,no_run
//! use dupetree_scan::Indexer;
//!
//! let output = Indexer::new()
//!     .index_with_progress("/path/to/scan", |progress| {
//!         eprintln!("{}: {} files", progress.phase, progress.items);
//!     })
//!     .unwrap();
//! ```

mod hasher;
mod indexer;
mod progress;
mod tree;

pub use hasher::DualHasher;
pub use indexer::{IndexConfig, IndexConfigBuilder, IndexOutput, IndexStats, Indexer};
pub use progress::{ScanPhase, ScanProgress};
pub use tree::TreeBuilder;

// Re-export core types for convenience
pub use dupetree_core::{
    FingerprintRecord, NodeId, NodeKind, PathNode, PathTree, ScanError, ScanWarning, TreeStats,
    WarningKind,
};
