//! SHA-256 checksum utilities
//!
//! Checksums use the canonical `sha256:<hex>` form. Repositories compare them
//! to tell an identical republish apart from a conflicting one.

use sha2::{Digest, Sha256};

/// Prefix for all checksums produced by this module
const PREFIX: &str = "sha256:";

/// Compute the SHA-256 checksum of a byte slice.
pub fn compute_checksum(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{}{:x}", PREFIX, hasher.finalize())
}
