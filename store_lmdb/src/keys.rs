//! Key encodings.
//!
//! String components are length-prefixed (u16 big-endian) so that one
//! subject's keys can never be a prefix of another subject's keys. Integers
//! are big-endian so LMDB's lexicographic order is numeric order.

use std::ops::Bound;

/// `len(s) ++ s`, the prefix shared by every key belonging to `s`.
pub fn string_prefix(s: &str) -> Vec<u8> {
    let bytes = s.as_bytes();
    let mut key = Vec::with_capacity(2 + bytes.len() + 8);
    key.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
    key.extend_from_slice(bytes);
    key
}

/// `len(s) ++ s ++ id`.
pub fn string_u64_key(s: &str, id: u64) -> Vec<u8> {
    let mut key = string_prefix(s);
    key.extend_from_slice(&id.to_be_bytes());
    key
}

/// `len(s) ++ s ++ a ++ b`.
pub fn string_u32_pair_key(s: &str, a: u32, b: u32) -> Vec<u8> {
    let mut key = string_prefix(s);
    key.extend_from_slice(&a.to_be_bytes());
    key.extend_from_slice(&b.to_be_bytes());
    key
}

/// Trailing big-endian u64 of a composite key.
pub fn trailing_u64(key: &[u8]) -> Option<u64> {
    let start = key.len().checked_sub(8)?;
    let arr: [u8; 8] = key[start..].try_into().ok()?;
    Some(u64::from_be_bytes(arr))
}

/// Increment a byte string to produce the exclusive upper bound of a prefix scan.
///
/// Returns `false` if the prefix is all `0xFF` (no finite upper bound).
pub fn increment_prefix(prefix: &mut Vec<u8>) -> bool {
    while let Some(last) = prefix.last_mut() {
        if *last < 0xFF {
            *last += 1;
            return true;
        }
        prefix.pop();
    }
    false
}

/// Range bounds covering every key that starts with `prefix`.
pub fn prefix_bounds(prefix: &[u8]) -> (Bound<Vec<u8>>, Bound<Vec<u8>>) {
    let mut upper = prefix.to_vec();
    let end = if increment_prefix(&mut upper) {
        Bound::Excluded(upper)
    } else {
        Bound::Unbounded
    };
    (Bound::Included(prefix.to_vec()), end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_do_not_collide() {
        let a = string_prefix("12");
        let b = string_prefix("123");
        assert!(!b.starts_with(&a));
    }

    #[test]
    fn trailing_id_roundtrip() {
        let key = string_u64_key("subject", 42);
        assert_eq!(trailing_u64(&key), Some(42));
        assert!(key.starts_with(&string_prefix("subject")));
    }

    #[test]
    fn increment_carries() {
        let mut p = vec![0x01, 0xFF];
        assert!(increment_prefix(&mut p));
        assert_eq!(p, vec![0x02]);

        let mut all = vec![0xFF, 0xFF];
        assert!(!increment_prefix(&mut all));
    }
}
