//! Duplicate analysis for dupetree.
//!
//! This crate turns a fingerprint index and a path tree into answers:
//!
//! - **Aggregation** - fold duplicate counts bottom-up into a `DupeTree`
//! - **Selection** - pick the shallowest heavily duplicated subtrees and the
//!   files that can be removed from the disposable subtree
//!
//! A file is a duplicate only when a copy of its content is retained outside
//! the disposable subtree.
//!
//! ```rust,ignore
//! use dupetree_analyze::{find_duplicates, highest_duplicates};
//! use dupetree_core::{DisposableRoot, FingerprintIndex};
//! use dupetree_scan::TreeBuilder;
//!
//! let index = FingerprintIndex::load("index.csv")?;
//! let tree = TreeBuilder::new().build("/data")?;
//! let disposable = DisposableRoot::directory("/data/backup");
//!
//! let dupes = find_duplicates(&index, &tree, &disposable);
//! for node in highest_duplicates(&dupes, 1.0)? {
//!     println!("{}  {} ({:.0}%)", node.total, node.path.display(), node.percentage() * 100.0);
//! }
//! ```

mod aggregate;
pub mod selector;

pub use aggregate::{Aggregator, find_duplicates};
pub use selector::{
    DEFAULT_MIN_DUPLICATES, DupeReport, HighestDuplicates, ReportEntry, SelectorError,
    deletable_files, disposable_candidates, highest_duplicates,
};
