//! Core types and traits for dupetree.
//!
//! This crate provides the fundamental data structures used throughout
//! the dupetree workspace: content fingerprints and the persisted index,
//! the arena-backed path and duplicate trees, configuration, and errors.

mod config;
mod error;
mod fingerprint;
mod index;
mod node;
mod tree;

pub use config::{DedupeConfig, DedupeConfigBuilder, DisposableRoot};
pub use error::{IndexError, ScanError, ScanWarning, WarningKind};
pub use fingerprint::{Fingerprint, FingerprintRecord};
pub use index::{FingerprintIndex, IndexReader, IndexWriter};
pub use node::{DupeCounts, DupeNode, NodeId, NodeKind, PathNode};
pub use tree::{DupeTree, PathTree, TreeStats};
