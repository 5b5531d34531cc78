//! Picking removal candidates out of a duplicate tree.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use dupetree_core::{DisposableRoot, DupeNode, DupeTree, NodeId};

/// Default floor for `disposable_candidates`.
pub const DEFAULT_MIN_DUPLICATES: u64 = 20;

/// Errors from candidate selection.
#[derive(Debug, Error)]
pub enum SelectorError {
    #[error("Threshold {threshold} is outside [0, 1]")]
    InvalidThreshold { threshold: f64 },
}

/// Lazy pre-order walk that stops descending at the first qualifying node.
///
/// Created by [`highest_duplicates`].
pub struct HighestDuplicates<'a> {
    tree: &'a DupeTree,
    threshold: f64,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for HighestDuplicates<'a> {
    type Item = &'a DupeNode;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.stack.pop() {
            let node = self.tree.get(id);
            if node.percentage() >= self.threshold || (node.is_file() && node.duplicate) {
                return Some(node);
            }
            self.stack.extend(node.children.iter().rev().copied());
        }
        None
    }
}

/// Yield the shallowest nodes whose duplicate share reaches `threshold`.
///
/// Duplicate files qualify regardless of the threshold. Once a node is
/// yielded its descendants are skipped, so no yielded node is an ancestor of
/// another.
pub fn highest_duplicates(
    tree: &DupeTree,
    threshold: f64,
) -> Result<HighestDuplicates<'_>, SelectorError> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(SelectorError::InvalidThreshold { threshold });
    }
    Ok(HighestDuplicates {
        tree,
        threshold,
        stack: vec![tree.root()],
    })
}

/// Keep disposable nodes with more than `min_duplicates` duplicates.
///
/// Sorted by descending duplicate count; ties keep their input order.
pub fn disposable_candidates<'a>(
    nodes: impl IntoIterator<Item = &'a DupeNode>,
    disposable: &DisposableRoot,
    min_duplicates: u64,
) -> Vec<&'a DupeNode> {
    let mut candidates: Vec<&DupeNode> = nodes
        .into_iter()
        .filter(|node| node.duplicates > min_duplicates && disposable.contains(&node.path))
        .collect();
    candidates.sort_by(|a, b| b.duplicates.cmp(&a.duplicates));
    candidates
}

/// Duplicate files inside the disposable subtree, in pre-order.
pub fn deletable_files<'a>(
    tree: &'a DupeTree,
    disposable: &'a DisposableRoot,
) -> impl Iterator<Item = &'a DupeNode> + 'a {
    tree.iter()
        .filter(move |node| node.is_file() && node.duplicate && disposable.contains(&node.path))
}

/// One selected node in a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub path: PathBuf,
    pub is_dir: bool,
    pub duplicates: u64,
    pub total: u64,
    pub percentage: f64,
}

impl From<&DupeNode> for ReportEntry {
    fn from(node: &DupeNode) -> Self {
        Self {
            path: node.path.clone(),
            is_dir: node.is_dir(),
            duplicates: node.duplicates,
            total: node.total,
            percentage: node.percentage(),
        }
    }
}

/// Summary of one selection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DupeReport {
    /// Root of the analyzed tree.
    pub root: PathBuf,
    /// Disposable prefix used for the run.
    pub disposable_root: DisposableRoot,
    /// Duplicate files under the root.
    pub duplicates: u64,
    /// Counted leaves under the root.
    pub total: u64,
    /// Root duplicate share.
    pub percentage: f64,
    /// Selected nodes, in selection order.
    pub entries: Vec<ReportEntry>,
}

impl DupeReport {
    /// Build a report over `tree` from selected nodes.
    pub fn new<'a>(
        tree: &DupeTree,
        disposable: &DisposableRoot,
        selected: impl IntoIterator<Item = &'a DupeNode>,
    ) -> Self {
        let root = tree.root_node();
        Self {
            root: root.path.clone(),
            disposable_root: disposable.clone(),
            duplicates: root.duplicates,
            total: root.total,
            percentage: root.percentage(),
            entries: selected.into_iter().map(ReportEntry::from).collect(),
        }
    }

    /// Check if anything was selected.
    pub fn has_entries(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Sum of duplicate counts across the selected entries.
    pub fn selected_duplicates(&self) -> u64 {
        self.entries.iter().map(|e| e.duplicates).sum()
    }
}
