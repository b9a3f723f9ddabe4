//! Content digests over canonical bytes.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 digest.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[display("{_0}")]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    /// The hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.0
    }
}

/// Computes the digest used for duplicate detection and file naming.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentHasher;

impl ContentHasher {
    /// Compute SHA-256 of data.
    pub fn hash(data: &[u8]) -> ContentHash {
        let mut hasher = Sha256::new();
        hasher.update(data);
        ContentHash(format!("{:x}", hasher.finalize()))
    }

    /// Verify content hash matches expected hash.
    pub fn verify(data: &[u8], expected: &str) -> bool {
        Self::hash(data).as_str() == expected
    }
}
