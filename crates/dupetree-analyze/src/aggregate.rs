//! Bottom-up duplicate aggregation.
//!
//! Binds fingerprint records to a `PathTree` and folds counts from the
//! leaves up. A file counts as a duplicate only when another file with the
//! same fingerprint lives outside the disposable subtree and is still
//! present in the tree, so the last retained copy of some content is never
//! marked removable, even when the index is stale.

use std::collections::HashSet;
use std::path::Path;

use dupetree_core::{
    DisposableRoot, DupeCounts, DupeNode, DupeTree, FingerprintIndex, PathTree,
};

/// Computes duplicate counters for every node of a path tree.
pub struct Aggregator<'a> {
    index: &'a FingerprintIndex,
    disposable: &'a DisposableRoot,
}

impl<'a> Aggregator<'a> {
    /// Create an aggregator over an index and a disposable root.
    pub fn new(index: &'a FingerprintIndex, disposable: &'a DisposableRoot) -> Self {
        Self { index, disposable }
    }

    /// Check whether a file has a retained copy among `present` files.
    ///
    /// Paths missing from the index are unique. Indexed copies that are no
    /// longer in `present` do not count.
    pub fn is_duplicate(&self, path: &Path, present: &HashSet<&Path>) -> bool {
        self.index.copies_of(path).any(|copy| {
            !self.disposable.contains(&copy.path) && present.contains(copy.path.as_path())
        })
    }

    /// Fold counts over `tree`, children before parents.
    ///
    /// The result is indexed by `NodeId`.
    pub fn aggregate_counts(&self, tree: &PathTree) -> Vec<DupeCounts> {
        // Every slot is overwritten before a parent reads it.
        let mut counts = vec![DupeCounts::leaf(false); tree.len()];
        let present: HashSet<&Path> = tree
            .nodes()
            .iter()
            .filter(|node| node.is_file())
            .map(|node| node.path.as_path())
            .collect();

        for id in tree.post_order() {
            let node = tree.get(id);
            let node_counts = if node.is_file() {
                if self.index.get(&node.path).is_none() {
                    tracing::trace!(path = %node.path.display(), "not in index, treating as unique");
                }
                DupeCounts::leaf(self.is_duplicate(&node.path, &present))
            } else {
                DupeCounts::sum(node.children.iter().map(|child| &counts[child.index()]))
            };
            counts[id.index()] = node_counts;
        }

        counts
    }

    /// Build the duplicate tree mirroring `tree`.
    pub fn aggregate(&self, tree: &PathTree) -> DupeTree {
        let counts = self.aggregate_counts(tree);
        let nodes = tree
            .nodes()
            .iter()
            .zip(counts)
            .map(|(node, counts)| DupeNode::new(node, counts))
            .collect();
        let dupes = DupeTree::from_nodes(nodes);

        let root = dupes.root_node();
        tracing::info!(
            duplicates = root.duplicates,
            total = root.total,
            "aggregated duplicates"
        );

        dupes
    }
}

/// Aggregate `tree` against `index` in one call.
pub fn find_duplicates(
    index: &FingerprintIndex,
    tree: &PathTree,
    disposable: &DisposableRoot,
) -> DupeTree {
    Aggregator::new(index, disposable).aggregate(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dupetree_core::{Fingerprint, FingerprintRecord, PathNode};

    fn record(hash: &str, path: &str) -> FingerprintRecord {
        FingerprintRecord::new(Fingerprint::new(1, hash, hash), path)
    }

    /// /r
    /// ├── a/ (disposable)
    /// │   ├── 1.txt  "x"
    /// │   └── 2.txt  "x"
    /// ├── b/
    /// │   └── 3.txt  "y"
    /// └── empty/
    fn sample_tree() -> PathTree {
        let mut tree = PathTree::new("/r");
        let a = tree.add_child(tree.root(), PathNode::new_directory("/r/a"));
        tree.add_child(a, PathNode::new_file("/r/a/1.txt"));
        tree.add_child(a, PathNode::new_file("/r/a/2.txt"));
        let b = tree.add_child(tree.root(), PathNode::new_directory("/r/b"));
        tree.add_child(b, PathNode::new_file("/r/b/3.txt"));
        tree.add_child(tree.root(), PathNode::new_directory("/r/empty"));
        tree
    }

    #[test]
    fn test_copies_only_inside_disposable_are_not_duplicates() {
        let index = FingerprintIndex::new(vec![
            record("x", "/r/a/1.txt"),
            record("x", "/r/a/2.txt"),
            record("y", "/r/b/3.txt"),
        ]);
        let disposable = DisposableRoot::new("/r/a/");
        let dupes = find_duplicates(&index, &sample_tree(), &disposable);

        assert!(dupes.nodes().iter().all(|n| !n.duplicate));
        assert_eq!(dupes.root_node().duplicates, 0);
        assert_eq!(dupes.root_node().total, 4);
    }

    #[test]
    fn test_copy_outside_disposable_flips_flag() {
        let index = FingerprintIndex::new(vec![
            record("x", "/r/a/1.txt"),
            record("x", "/r/a/2.txt"),
            record("x", "/r/b/3.txt"),
        ]);
        let disposable = DisposableRoot::new("/r/a/");
        let dupes = find_duplicates(&index, &sample_tree(), &disposable);

        let flag = |path: &str| {
            dupes
                .nodes()
                .iter()
                .find(|n| n.path == Path::new(path))
                .unwrap()
                .duplicate
        };
        assert!(flag("/r/a/1.txt"));
        assert!(flag("/r/a/2.txt"));
        // Its only copies are disposable, so it is the retained one.
        assert!(!flag("/r/b/3.txt"));

        let a = dupes.children(dupes.root()).next().unwrap();
        assert_eq!(a.duplicates, 2);
        assert_eq!(a.total, 2);
        assert_eq!(a.percentage(), 1.0);
        assert_eq!(dupes.root_node().duplicates, 2);
    }

    #[test]
    fn test_file_is_not_its_own_copy() {
        let index = FingerprintIndex::new(vec![record("x", "/r/b/3.txt")]);
        let disposable = DisposableRoot::new("/r/a/");
        let aggregator = Aggregator::new(&index, &disposable);
        let present = HashSet::from([Path::new("/r/b/3.txt")]);
        assert!(!aggregator.is_duplicate(Path::new("/r/b/3.txt"), &present));
    }

    #[test]
    fn test_indexed_copy_missing_from_tree_is_not_retained() {
        let index = FingerprintIndex::new(vec![
            record("x", "/r/a/1.txt"),
            record("x", "/r/a/2.txt"),
            record("x", "/r/c/gone.txt"),
        ]);
        let disposable = DisposableRoot::new("/r/a/");
        let dupes = find_duplicates(&index, &sample_tree(), &disposable);

        assert!(dupes.nodes().iter().all(|n| !n.duplicate));
        assert_eq!(dupes.root_node().duplicates, 0);
    }

    #[test]
    fn test_unindexed_files_are_unique() {
        let index = FingerprintIndex::default();
        let disposable = DisposableRoot::new("/r/a/");
        let counts = Aggregator::new(&index, &disposable).aggregate_counts(&sample_tree());

        assert_eq!(counts.len(), 7);
        assert!(counts.iter().all(|c| c.duplicates == 0 && c.total >= 1));
    }

    #[test]
    fn test_empty_directory_counts() {
        let index = FingerprintIndex::default();
        let disposable = DisposableRoot::default();
        let dupes = find_duplicates(&index, &sample_tree(), &disposable);

        let empty = dupes
            .nodes()
            .iter()
            .find(|n| n.path == Path::new("/r/empty"))
            .unwrap();
        assert_eq!(empty.total, 1);
        assert_eq!(empty.duplicates, 0);
        assert_eq!(empty.percentage(), 0.0);
    }

    #[test]
    fn test_dupe_tree_mirrors_path_tree() {
        let tree = sample_tree();
        let index = FingerprintIndex::default();
        let disposable = DisposableRoot::default();
        let dupes = find_duplicates(&index, &tree, &disposable);

        assert_eq!(dupes.len(), tree.len());
        for (path_node, dupe_node) in tree.nodes().iter().zip(dupes.nodes()) {
            assert_eq!(path_node.path, dupe_node.path);
            assert_eq!(path_node.children, dupe_node.children);
        }
    }
}
