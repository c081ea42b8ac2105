//! Blake2b hashing.

use blake2::{Blake2b512, Digest};

/// Hash multiple byte slices in sequence with 512-bit Blake2b.
pub fn blake2b_512_multi(parts: &[&[u8]]) -> [u8; 64] {
    let mut hasher = Blake2b512::new();
    for part in parts {
        hasher.update(part);
    }
    let result = hasher.finalize();
    let mut output = [0u8; 64];
    output.copy_from_slice(&result);
    output
}
