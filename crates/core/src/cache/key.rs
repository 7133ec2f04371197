//! Cache key derivation.

use sha2::{Digest, Sha256};

/// Compute the cache key for a request path on a host.
///
/// The key is `host:uri`, so the same path on different hosts never
/// collides.
pub fn cache_key(host: &str, uri: &str) -> String {
    format!("{host}:{uri}")
}

/// Compute a fixed-length digest of a cache key for use as a row id.
pub fn key_digest(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}
