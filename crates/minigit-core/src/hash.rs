//! Content fingerprinting using 64-bit FNV-1a.
//!
//! Every object in the store is identified by the FNV-1a hash of its
//! bytes, rendered as 16 lowercase hex characters. FNV-1a is not
//! collision resistant; the object store guards against collisions by
//! comparing bytes on write.

use std::hash::Hasher;

use fnv::FnvHasher;

/// Length of a rendered hash in hex characters.
pub const HASH_LEN: usize = 16;

/// Compute the FNV-1a 64-bit hash of arbitrary bytes, returned as a
/// zero-padded lowercase hex string.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = FnvHasher::default();
    hasher.write(data);
    format!("{:016x}", hasher.finish())
}

/// Compute the hash of a string's UTF-8 bytes.
pub fn hash_str(s: &str) -> String {
    hash_bytes(s.as_bytes())
}

/// True if `s` has the shape of a rendered hash.
pub fn looks_like_hash(s: &str) -> bool {
    s.len() == HASH_LEN && s.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase())
}
