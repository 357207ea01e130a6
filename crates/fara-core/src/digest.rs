//! # Content Digest — SHA-256 over Canonical Bytes
//!
//! Defines `ContentDigest`/`DigestAlgorithm` and the `sha256_digest()` /
//! `sha256_hex()` functions used for policy-version stamping and the
//! optional tamper-evident event hash chain (spec §3, ActionEvent).
//!
//! `sha256_digest()` accepts only `&CanonicalBytes`, so it is a compile
//! error to hash anything that hasn't gone through canonicalization first.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::canonical::CanonicalBytes;

/// The hash algorithm used to produce a content digest. SHA-256 is the only
/// algorithm in use; the tag exists so a future algorithm addition doesn't
/// require a wire-format break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DigestAlgorithm {
    Sha256,
}

/// A content-addressed digest with its algorithm tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest {
    pub algorithm: DigestAlgorithm,
    pub bytes: [u8; 32],
}

impl ContentDigest {
    pub fn new(algorithm: DigestAlgorithm, bytes: [u8; 32]) -> Self {
        Self { algorithm, bytes }
    }

    /// Render the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}",
            match self.algorithm {
                DigestAlgorithm::Sha256 => "sha256",
            },
            self.to_hex()
        )
    }
}

/// Compute a SHA-256 content digest from canonical bytes.
pub fn sha256_digest(data: &CanonicalBytes) -> ContentDigest {
    let hash = Sha256::digest(data.as_bytes());
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hash);
    ContentDigest::new(DigestAlgorithm::Sha256, bytes)
}

/// Compute a SHA-256 hex string from canonical bytes. Used directly for
/// `policy_version = H(source_text)` and for event hash chaining.
pub fn sha256_hex(data: &CanonicalBytes) -> String {
    sha256_digest(data).to_hex()
}
