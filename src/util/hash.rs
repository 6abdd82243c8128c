//! Content hashing for cache keys.

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of `data`.
pub fn sha256_bytes(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Cache key for a named input: `<name>-<sha256 of contents>`.
///
/// Two inputs share a key only when both the name and the contents match.
pub fn content_key(name: &str, contents: &[u8]) -> String {
    format!("{}-{}", name, sha256_bytes(contents))
}
