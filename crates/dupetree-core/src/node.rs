//! Path and duplicate tree node types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Index of a node within a tree arena.
///
/// A `PathTree` and the `DupeTree` derived from it share ids, so the same
/// `NodeId` addresses corresponding nodes in both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl NodeId {
    /// Create a new NodeId from an arena index.
    pub fn new(id: usize) -> Self {
        Self(id)
    }

    /// The arena index of this node.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Type of file system node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
}

impl NodeKind {
    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, NodeKind::Directory)
    }

    /// Check if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, NodeKind::File)
    }
}

/// A single file or directory mirrored from the file system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathNode {
    /// Full path of the entry.
    pub path: PathBuf,

    /// Node type.
    pub kind: NodeKind,

    /// Children in traversal order (directories only).
    pub children: Vec<NodeId>,
}

impl PathNode {
    /// Create a new file node.
    pub fn new_file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: NodeKind::File,
            children: Vec::new(),
        }
    }

    /// Create a new directory node.
    pub fn new_directory(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: NodeKind::Directory,
            children: Vec::new(),
        }
    }

    /// Check if this node is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    /// Check if this node is a file.
    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }
}

/// Duplicate counters for one node.
///
/// `duplicates` is always a count; zero means "no duplicate descendants",
/// never "unknown".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DupeCounts {
    /// Whether this node is itself a confirmed duplicate file.
    pub duplicate: bool,
    /// Duplicate files in this subtree, the node itself included.
    pub duplicates: u64,
    /// Files in this subtree, at least 1.
    pub total: u64,
}

impl DupeCounts {
    /// Counts for a leaf: one file, duplicate or not.
    ///
    /// Empty directories are leaves as well, so they get a denominator of 1.
    pub fn leaf(duplicate: bool) -> Self {
        Self {
            duplicate,
            duplicates: u64::from(duplicate),
            total: 1,
        }
    }

    /// Sum the counts of a directory's children.
    ///
    /// Falls back to `leaf(false)` when there are no children.
    pub fn sum<'a>(children: impl IntoIterator<Item = &'a DupeCounts>) -> Self {
        let mut counts = Self {
            duplicate: false,
            duplicates: 0,
            total: 0,
        };
        for child in children {
            counts.duplicates += child.duplicates;
            counts.total += child.total;
        }
        if counts.total == 0 {
            counts.total = 1;
        }
        counts
    }

    /// Fraction of files in the subtree that are duplicates.
    pub fn percentage(&self) -> f64 {
        self.duplicates as f64 / self.total as f64
    }
}

/// A path node annotated with duplicate counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DupeNode {
    /// Full path of the entry.
    pub path: PathBuf,

    /// Node type.
    pub kind: NodeKind,

    /// Children, same ids as in the source `PathTree`.
    pub children: Vec<NodeId>,

    /// Whether this node is a confirmed duplicate file.
    pub duplicate: bool,

    /// Duplicate files in this subtree.
    pub duplicates: u64,

    /// Files in this subtree, at least 1.
    pub total: u64,
}

impl DupeNode {
    /// Annotate a path node with computed counts.
    pub fn new(node: &PathNode, counts: DupeCounts) -> Self {
        Self {
            path: node.path.clone(),
            kind: node.kind,
            children: node.children.clone(),
            duplicate: counts.duplicate,
            duplicates: counts.duplicates,
            total: counts.total,
        }
    }

    /// Fraction of files in the subtree that are duplicates, in `[0, 1]`.
    pub fn percentage(&self) -> f64 {
        self.counts().percentage()
    }

    /// The counters of this node.
    pub fn counts(&self) -> DupeCounts {
        DupeCounts {
            duplicate: self.duplicate,
            duplicates: self.duplicates,
            total: self.total,
        }
    }

    /// Check if this node is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    /// Check if this node is a file.
    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }
}
