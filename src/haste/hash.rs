// src/haste/hash.rs

use blake3::Hasher;

/// Hex-encoded blake3 digest of `bytes`.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(bytes);
    hasher.finalize().to_hex().to_string()
}
