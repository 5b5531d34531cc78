//! Arena-backed path and duplicate trees.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ScanWarning;
use crate::node::{DupeNode, NodeId, PathNode};

/// Summary statistics for a built tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TreeStats {
    /// Total number of files linked into the tree.
    pub total_files: u64,
    /// Total number of directories, the root included.
    pub total_dirs: u64,
    /// Entries dropped because their parent was not seen first.
    pub orphans: u64,
    /// Maximum depth reached.
    pub max_depth: u32,
}

impl TreeStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a linked file.
    pub fn record_file(&mut self, depth: u32) {
        self.total_files += 1;
        self.max_depth = self.max_depth.max(depth);
    }

    /// Record a linked directory.
    pub fn record_dir(&mut self, depth: u32) {
        self.total_dirs += 1;
        self.max_depth = self.max_depth.max(depth);
    }

    /// Record an entry that could not be linked.
    pub fn record_orphan(&mut self) {
        self.orphans += 1;
    }
}

/// Tree of file system entries, stored in an arena.
///
/// Children are only ever added under an existing parent, so every child
/// has a larger id than its parent and reverse id order is a post-order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathTree {
    nodes: Vec<PathNode>,

    /// Summary statistics.
    pub stats: TreeStats,

    /// Warnings encountered while building.
    pub warnings: Vec<ScanWarning>,

    /// Time spent building the tree.
    pub build_duration: Duration,
}

impl PathTree {
    /// Create a tree holding only the root directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let mut stats = TreeStats::new();
        stats.record_dir(0);
        Self {
            nodes: vec![PathNode::new_directory(root)],
            stats,
            warnings: Vec::new(),
            build_duration: Duration::ZERO,
        }
    }

    /// Id of the root node.
    pub fn root(&self) -> NodeId {
        NodeId::new(0)
    }

    /// Path of the root node.
    pub fn root_path(&self) -> &Path {
        &self.nodes[0].path
    }

    /// Append `node` as the last child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is not a node of this tree.
    pub fn add_child(&mut self, parent: NodeId, node: PathNode) -> NodeId {
        assert!(parent.index() < self.nodes.len(), "unknown parent {parent:?}");
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(node);
        self.nodes[parent.index()].children.push(id);
        id
    }

    /// Get a node by id.
    pub fn get(&self, id: NodeId) -> &PathNode {
        &self.nodes[id.index()]
    }

    /// Number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A tree always holds its root.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// All nodes in id order.
    pub fn nodes(&self) -> &[PathNode] {
        &self.nodes
    }

    /// Node ids with every child before its parent.
    pub fn post_order(&self) -> impl Iterator<Item = NodeId> + use<> {
        (0..self.nodes.len()).rev().map(NodeId::new)
    }

    /// Node ids in depth-first pre-order, children in traversal order.
    pub fn pre_order(&self) -> impl Iterator<Item = NodeId> + '_ {
        pre_order(&self.nodes, self.root())
    }

    /// Check if there were any warnings while building.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Tree of duplicate counters mirroring a `PathTree` id for id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DupeTree {
    nodes: Vec<DupeNode>,
}

impl DupeTree {
    /// Wrap nodes produced from a `PathTree`, indexed by the same ids.
    ///
    /// # Panics
    ///
    /// Panics if `nodes` is empty.
    pub fn from_nodes(nodes: Vec<DupeNode>) -> Self {
        assert!(!nodes.is_empty(), "a duplicate tree needs a root");
        Self { nodes }
    }

    /// Id of the root node.
    pub fn root(&self) -> NodeId {
        NodeId::new(0)
    }

    /// The root node.
    pub fn root_node(&self) -> &DupeNode {
        &self.nodes[0]
    }

    /// Get a node by id.
    pub fn get(&self, id: NodeId) -> &DupeNode {
        &self.nodes[id.index()]
    }

    /// Number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A tree always holds its root.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// All nodes in id order.
    pub fn nodes(&self) -> &[DupeNode] {
        &self.nodes
    }

    /// Children of a node.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &DupeNode> + '_ {
        self.get(id).children.iter().map(|child| self.get(*child))
    }

    /// Node ids in depth-first pre-order.
    pub fn pre_order(&self) -> impl Iterator<Item = NodeId> + '_ {
        pre_order(&self.nodes, self.root())
    }

    /// Nodes in depth-first pre-order.
    pub fn iter(&self) -> impl Iterator<Item = &DupeNode> + '_ {
        self.pre_order().map(|id| self.get(id))
    }
}

/// Arena nodes that list their children by id.
trait Branch {
    fn child_ids(&self) -> &[NodeId];
}

impl Branch for PathNode {
    fn child_ids(&self) -> &[NodeId] {
        &self.children
    }
}

impl Branch for DupeNode {
    fn child_ids(&self) -> &[NodeId] {
        &self.children
    }
}

fn pre_order<N: Branch>(nodes: &[N], root: NodeId) -> impl Iterator<Item = NodeId> + '_ {
    let mut stack = vec![root];
    std::iter::from_fn(move || {
        let id = stack.pop()?;
        stack.extend(nodes[id.index()].child_ids().iter().rev().copied());
        Some(id)
    })
}
