use dupetree_core::{FingerprintIndex, IndexReader};
use dupetree_scan::{
    IndexConfig, IndexOutput, Indexer, ScanError, ScanPhase, TreeBuilder, WarningKind,
};
use std::fs;
use tempfile::TempDir;

fn create_fixture() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    fs::create_dir_all(root.join("a")).unwrap();
    fs::create_dir_all(root.join("b/deep")).unwrap();
    fs::write(root.join("a/1.txt"), "x").unwrap();
    fs::write(root.join("a/2.txt"), "x").unwrap();
    fs::write(root.join("b/3.txt"), "y").unwrap();
    fs::write(root.join("b/deep/4.bin"), vec![7u8; 4096]).unwrap();
    fs::write(root.join("b/deep/5.bin"), vec![7u8; 4096]).unwrap();
    fs::write(root.join("b/deep/6.bin"), vec![8u8; 4096]).unwrap();
    fs::write(root.join("lonely.txt"), "only one of this length").unwrap();

    temp
}

#[test]
fn test_index_groups_identical_content() {
    let temp = create_fixture();
    let output = Indexer::new().index(temp.path()).unwrap();

    // Six files share a size with another file; lonely.txt does not.
    assert_eq!(output.records.len(), 6);
    assert_eq!(output.stats.files_hashed, 6);

    let index = FingerprintIndex::new(output.records.clone());
    assert_eq!(index.group_count(), 4);

    let root = temp.path().canonicalize().unwrap();
    let one = index.get(&root.join("a/1.txt")).unwrap();
    let members: Vec<_> = index.group(&one.fingerprint()).map(|r| r.path.clone()).collect();
    assert_eq!(members, vec![root.join("a/1.txt"), root.join("a/2.txt")]);

    let three = index.get(&root.join("b/3.txt")).unwrap();
    assert_eq!(index.group(&three.fingerprint()).count(), 1);
}

#[test]
fn test_sizes_ascending() {
    let temp = create_fixture();
    let output = Indexer::new().index(temp.path()).unwrap();

    let sizes: Vec<u64> = output.records.iter().map(|r| r.size).collect();
    let mut sorted = sizes.clone();
    sorted.sort();
    assert_eq!(sizes, sorted);
    assert_eq!(sizes.first(), Some(&1));
    assert_eq!(sizes.last(), Some(&4096));
}

#[test]
fn test_reindex_is_byte_identical() {
    let temp = create_fixture();
    let out_dir = TempDir::new().unwrap();
    let first = out_dir.path().join("first.csv");
    let second = out_dir.path().join("second.csv");

    Indexer::new().index(temp.path()).unwrap().write_to(&first).unwrap();
    Indexer::new().index(temp.path()).unwrap().write_to(&second).unwrap();

    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
}

#[test]
fn test_persisted_index_rereads_exactly() {
    let temp = create_fixture();
    let out_dir = TempDir::new().unwrap();
    let path = out_dir.path().join("index.csv");

    let output = Indexer::new().index(temp.path()).unwrap();
    let rows = output.write_to(&path).unwrap();
    assert_eq!(rows, 6);

    let read = IndexReader::open(&path).unwrap().read_all().unwrap();
    assert_eq!(read, output.records);
}

#[test]
fn test_small_chunks_match_default() {
    let temp = create_fixture();
    let config = IndexConfig::builder().chunk_size(3usize).build().unwrap();

    let small = Indexer::with_config(config).index(temp.path()).unwrap();
    let default = Indexer::new().index(temp.path()).unwrap();
    assert_eq!(small.records, default.records);
}

#[test]
fn test_tree_and_index_agree_on_paths() {
    let temp = create_fixture();
    let output = Indexer::new().index(temp.path()).unwrap();
    let tree = TreeBuilder::new().build(temp.path()).unwrap();

    for record in &output.records {
        assert!(
            tree.nodes().iter().any(|n| n.path == record.path),
            "{} missing from tree",
            record.path.display()
        );
    }
}

#[test]
fn test_empty_root() {
    let temp = TempDir::new().unwrap();
    let output = Indexer::new().index(temp.path()).unwrap();
    assert!(output.records.is_empty());

    let tree = TreeBuilder::new().build(temp.path()).unwrap();
    assert_eq!(tree.len(), 1);
    assert!(tree.get(tree.root()).is_dir());
}

#[test]
fn test_tree_on_file_root_fails() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("f");
    fs::write(&file, "x").unwrap();
    assert!(matches!(
        TreeBuilder::new().build(&file),
        Err(ScanError::NotADirectory { .. })
    ));
}

/// Three same-size files, so all of them reach the hashing phase.
fn create_hash_fixture() -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("a")).unwrap();
    fs::write(temp.path().join("a/1.txt"), "same").unwrap();
    fs::write(temp.path().join("a/2.txt"), "same").unwrap();
    fs::write(temp.path().join("a/3.txt"), "diff").unwrap();
    temp
}

/// Index with a checkpoint per file, deleting the first file right before
/// it is hashed.
fn index_losing_first_file(
    temp: &TempDir,
    skip_unreadable: bool,
) -> Result<IndexOutput, ScanError> {
    let config = IndexConfig::builder()
        .progress_interval(1u64)
        .skip_unreadable(skip_unreadable)
        .build()
        .unwrap();

    let mut removed = false;
    Indexer::with_config(config).index_with_progress(temp.path(), |p| {
        if p.phase == ScanPhase::Hash && !removed {
            fs::remove_file(&p.current_path).unwrap();
            removed = true;
        }
    })
}

#[test]
fn test_file_vanishing_before_hash_aborts_by_default() {
    let temp = create_hash_fixture();
    let err = index_losing_first_file(&temp, false).unwrap_err();
    assert!(matches!(err, ScanError::NotFound { .. }));
}

#[test]
fn test_file_vanishing_before_hash_is_skipped_when_allowed() {
    let temp = create_hash_fixture();
    let output = index_losing_first_file(&temp, true).unwrap();

    assert_eq!(output.stats.skipped, 1);
    assert_eq!(output.stats.files_hashed, 2);
    assert_eq!(output.records.len(), 2);
    assert_eq!(output.warnings.len(), 1);
    assert_eq!(output.warnings[0].kind, WarningKind::ReadError);
    assert!(!output.warnings[0].path.exists());
}

#[cfg(target_os = "linux")]
#[test]
fn test_non_utf8_names_are_left_out_of_index_and_tree() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let temp = create_hash_fixture();
    let bad = temp.path().join(OsStr::from_bytes(b"\xff.txt"));
    fs::write(&bad, "same").unwrap();

    let output = Indexer::new().index(temp.path()).unwrap();
    assert_eq!(output.records.len(), 3);
    assert!(output.records.iter().all(|r| r.path.to_str().is_some()));
    assert_eq!(output.warnings.len(), 1);
    assert_eq!(output.warnings[0].kind, WarningKind::InvalidPath);

    let out_dir = TempDir::new().unwrap();
    let rows = output.write_to(out_dir.path().join("index.csv")).unwrap();
    assert_eq!(rows, 3);

    let tree = TreeBuilder::new().build(temp.path()).unwrap();
    assert!(tree.nodes().iter().all(|n| n.path.to_str().is_some()));
    assert_eq!(tree.stats.total_files, 3);
    assert!(tree.warnings.iter().any(|w| w.kind == WarningKind::InvalidPath));
}
