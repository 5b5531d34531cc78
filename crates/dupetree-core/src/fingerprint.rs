//! Content fingerprints produced by the indexer.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Size plus two independent content digests.
///
/// `hash1` is a hex BLAKE3 digest and `hash2` a hex SHA-256 digest. Equal
/// fingerprints are treated as equal content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint {
    /// File size in bytes.
    pub size: u64,
    /// First digest, hex encoded.
    pub hash1: String,
    /// Second digest, hex encoded.
    pub hash2: String,
}

impl Fingerprint {
    /// Create a new fingerprint.
    pub fn new(size: u64, hash1: impl Into<String>, hash2: impl Into<String>) -> Self {
        Self {
            size,
            hash1: hash1.into(),
            hash2: hash2.into(),
        }
    }

    /// Build a fingerprint from raw digest bytes.
    pub fn from_digests(size: u64, hash1: &[u8], hash2: &[u8]) -> Self {
        Self::new(size, to_hex(hash1), to_hex(hash2))
    }
}

/// A fingerprint bound to the file it was computed from.
///
/// Field order matches the persisted column order, and the derived ordering
/// sorts by the full `(size, hash1, hash2, path)` tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FingerprintRecord {
    /// File size in bytes.
    pub size: u64,
    /// First digest, hex encoded.
    pub hash1: String,
    /// Second digest, hex encoded.
    pub hash2: String,
    /// Path of the fingerprinted file.
    pub path: PathBuf,
}

impl FingerprintRecord {
    /// Bind a fingerprint to a path.
    pub fn new(fingerprint: Fingerprint, path: impl Into<PathBuf>) -> Self {
        let Fingerprint { size, hash1, hash2 } = fingerprint;
        Self {
            size,
            hash1,
            hash2,
            path: path.into(),
        }
    }

    /// The content fingerprint of this record, without the path.
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::new(self.size, self.hash1.clone(), self.hash2.clone())
    }
}

/// Hex-encode a digest.
fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
