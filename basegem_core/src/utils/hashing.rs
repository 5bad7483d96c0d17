//! Short hashes used to build unique variable ids
use std::hash::{DefaultHasher, Hash, Hasher};

/// Hex string of the hash of `value`
pub(crate) fn hash_as_hex_string<T: Hash + ?Sized>(value: &T) -> String {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    format!("{:x}", hasher.finish())
}
