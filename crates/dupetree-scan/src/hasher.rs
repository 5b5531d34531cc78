//! Single-pass dual content hashing.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

use dupetree_core::Fingerprint;

/// BLAKE3 and SHA-256 accumulators fed in lockstep.
pub struct DualHasher {
    blake: blake3::Hasher,
    sha: Sha256,
    bytes: u64,
}

impl DualHasher {
    /// Create empty accumulators.
    pub fn new() -> Self {
        Self {
            blake: blake3::Hasher::new(),
            sha: Sha256::new(),
            bytes: 0,
        }
    }

    /// Feed one chunk to both accumulators.
    pub fn update(&mut self, chunk: &[u8]) {
        self.blake.update(chunk);
        self.sha.update(chunk);
        self.bytes += chunk.len() as u64;
    }

    /// Finish both digests. The size is the number of bytes fed.
    pub fn finalize(self) -> Fingerprint {
        let blake = self.blake.finalize();
        let sha = self.sha.finalize();
        Fingerprint::from_digests(self.bytes, blake.as_bytes(), &sha)
    }

    /// Stream a file through both accumulators in `chunk_size` reads.
    pub fn hash_file(path: &Path, chunk_size: usize) -> std::io::Result<Fingerprint> {
        let mut file = File::open(path)?;
        let mut hasher = Self::new();
        let mut buffer = vec![0u8; chunk_size.max(1)];

        loop {
            let bytes_read = match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buffer[..bytes_read]);
        }

        Ok(hasher.finalize())
    }
}

impl Default for DualHasher {
    fn default() -> Self {
        Self::new()
    }
}
