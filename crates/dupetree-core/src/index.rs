//! Persisted fingerprint index and its in-memory lookups.
//!
//! The index is a header-less CSV table with one row per fingerprinted
//! file: `size,hash1,hash2,path`. Rows are grouped by size ascending and
//! sorted by the full tuple within a group.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::IndexError;
use crate::fingerprint::{Fingerprint, FingerprintRecord};

/// Writes fingerprint records as CSV rows.
pub struct IndexWriter<W: Write> {
    writer: csv::Writer<W>,
    rows: u64,
}

impl IndexWriter<BufWriter<File>> {
    /// Create (or truncate) an index file.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, IndexError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| IndexError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> IndexWriter<W> {
    /// Wrap an arbitrary writer.
    pub fn new(writer: W) -> Self {
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(writer);
        Self { writer, rows: 0 }
    }

    /// Append one record.
    pub fn write(&mut self, record: &FingerprintRecord) -> Result<(), IndexError> {
        self.writer.serialize(record)?;
        self.rows += 1;
        Ok(())
    }

    /// Append every record from an iterator.
    pub fn write_all<'a>(
        &mut self,
        records: impl IntoIterator<Item = &'a FingerprintRecord>,
    ) -> Result<(), IndexError> {
        for record in records {
            self.write(record)?;
        }
        Ok(())
    }

    /// Number of rows written so far.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Flush buffered rows and return the inner writer.
    pub fn finish(self) -> Result<W, IndexError> {
        self.writer
            .into_inner()
            .map_err(|err| IndexError::Csv(csv::Error::from(err.into_error())))
    }
}

/// Reads fingerprint records back from CSV rows.
pub struct IndexReader<R: Read> {
    reader: csv::Reader<R>,
}

impl IndexReader<File> {
    /// Open an index file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, IndexError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| IndexError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(file))
    }
}

impl<R: Read> IndexReader<R> {
    /// Wrap an arbitrary reader.
    pub fn new(reader: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(false)
            .from_reader(reader);
        Self { reader }
    }

    /// Iterate over records lazily.
    ///
    /// Any undecodable row yields `IndexError::Malformed` with its 1-based
    /// row number.
    pub fn records(&mut self) -> impl Iterator<Item = Result<FingerprintRecord, IndexError>> + '_ {
        self.reader
            .deserialize::<FingerprintRecord>()
            .enumerate()
            .map(|(i, row)| {
                row.map_err(|err| IndexError::Malformed {
                    row: i as u64 + 1,
                    message: err.to_string(),
                })
            })
    }

    /// Read every record, failing on the first malformed row.
    pub fn read_all(mut self) -> Result<Vec<FingerprintRecord>, IndexError> {
        self.records().collect()
    }
}

/// Lookups over a set of fingerprint records.
#[derive(Debug, Clone, Default)]
pub struct FingerprintIndex {
    records: Vec<FingerprintRecord>,
    by_path: HashMap<PathBuf, usize>,
    by_fingerprint: HashMap<Fingerprint, Vec<usize>>,
}

impl FingerprintIndex {
    /// Build the lookups from records.
    ///
    /// If a path appears twice the later record wins the path lookup.
    pub fn new(records: Vec<FingerprintRecord>) -> Self {
        let mut by_path = HashMap::with_capacity(records.len());
        let mut by_fingerprint: HashMap<Fingerprint, Vec<usize>> = HashMap::new();

        for (i, record) in records.iter().enumerate() {
            by_path.insert(record.path.clone(), i);
            by_fingerprint.entry(record.fingerprint()).or_default().push(i);
        }

        Self {
            records,
            by_path,
            by_fingerprint,
        }
    }

    /// Read an index file and build the lookups.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, IndexError> {
        Ok(Self::new(IndexReader::open(path)?.read_all()?))
    }

    /// Record for a path, if the path was indexed.
    pub fn get(&self, path: &Path) -> Option<&FingerprintRecord> {
        self.by_path.get(path).map(|&i| &self.records[i])
    }

    /// All records sharing a fingerprint, including the one asked about.
    pub fn group(&self, fingerprint: &Fingerprint) -> impl Iterator<Item = &FingerprintRecord> + '_ {
        self.by_fingerprint
            .get(fingerprint)
            .into_iter()
            .flatten()
            .map(move |&i| &self.records[i])
    }

    /// Records sharing `path`'s fingerprint, excluding `path` itself.
    ///
    /// Empty when `path` is not indexed.
    pub fn copies_of<'a>(&'a self, path: &'a Path) -> impl Iterator<Item = &'a FingerprintRecord> + 'a {
        let fingerprint = self.get(path).map(FingerprintRecord::fingerprint);
        fingerprint
            .into_iter()
            .flat_map(move |fp| {
                self.by_fingerprint
                    .get(&fp)
                    .into_iter()
                    .flatten()
                    .map(move |&i| &self.records[i])
            })
            .filter(move |record| record.path.as_path() != path)
    }

    /// All records in insertion order.
    pub fn records(&self) -> &[FingerprintRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the index holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of distinct fingerprints.
    pub fn group_count(&self) -> usize {
        self.by_fingerprint.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(size: u64, h1: &str, h2: &str, path: &str) -> FingerprintRecord {
        FingerprintRecord::new(Fingerprint::new(size, h1, h2), path)
    }

    #[test]
    fn test_write_format() {
        let mut writer = IndexWriter::new(Vec::new());
        writer.write(&record(1, "aa", "bb", "/r/a/1.txt")).unwrap();
        writer.write(&record(1, "aa", "bb", "/r/a/2.txt")).unwrap();
        assert_eq!(writer.rows(), 2);

        let bytes = writer.finish().unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "1,aa,bb,/r/a/1.txt\n1,aa,bb,/r/a/2.txt\n"
        );
    }

    #[test]
    fn test_paths_with_commas_survive() {
        let original = vec![record(4, "cc", "dd", "/r/a, b/c.txt")];
        let mut writer = IndexWriter::new(Vec::new());
        writer.write_all(&original).unwrap();
        let bytes = writer.finish().unwrap();

        let read = IndexReader::new(bytes.as_slice()).read_all().unwrap();
        assert_eq!(read, original);
    }

    #[test]
    fn test_malformed_row_reports_position() {
        let data = "1,aa,bb,/ok\nnot-a-size,aa,bb,/bad\n";
        let err = IndexReader::new(data.as_bytes()).read_all().unwrap_err();
        match err {
            IndexError::Malformed { row, .. } => assert_eq!(row, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_column_is_malformed() {
        let data = "1,aa,/missing-hash\n";
        let err = IndexReader::new(data.as_bytes()).read_all().unwrap_err();
        assert!(matches!(err, IndexError::Malformed { row: 1, .. }));
    }

    #[test]
    fn test_lookups() {
        let index = FingerprintIndex::new(vec![
            record(1, "aa", "bb", "/r/a/1.txt"),
            record(1, "aa", "bb", "/r/a/2.txt"),
            record(1, "cc", "dd", "/r/b/3.txt"),
        ]);

        assert_eq!(index.len(), 3);
        assert_eq!(index.group_count(), 2);

        let rec = index.get(Path::new("/r/a/1.txt")).unwrap();
        assert_eq!(index.group(&rec.fingerprint()).count(), 2);

        let copies: Vec<_> = index
            .copies_of(Path::new("/r/a/1.txt"))
            .map(|r| r.path.clone())
            .collect();
        assert_eq!(copies, vec![PathBuf::from("/r/a/2.txt")]);

        assert_eq!(index.copies_of(Path::new("/r/b/3.txt")).count(), 0);
        assert_eq!(index.copies_of(Path::new("/nowhere")).count(), 0);
    }

    #[test]
    fn test_load_missing_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let err = FingerprintIndex::load(temp.path().join("missing.csv")).unwrap_err();
        assert!(matches!(err, IndexError::Io { .. }));
    }
}
