//! Unsigned byte ordering shared by key ranges, navigation and the engine.

use bytes::{Bytes, BytesMut};
use std::cmp::Ordering;

/// Compare two byte strings as sequences of unsigned bytes.
///
/// The first differing byte decides; if one string is a prefix of the other
/// the shorter one sorts first.
pub fn compare(a: &[u8], b: &[u8]) -> Ordering {
    let common = a.len().min(b.len());
    for i in 0..common {
        match a[i].cmp(&b[i]) {
            Ordering::Equal => {}
            ord => return ord,
        }
    }
    a.len().cmp(&b.len())
}

/// Whether the first `prefix.len()` bytes of `key` equal `prefix`.
#[inline]
pub fn has_prefix(key: &[u8], prefix: &[u8]) -> bool {
    key.len() >= prefix.len() && key[..prefix.len()] == *prefix
}

/// The smallest byte string that sorts after every string starting with
/// `prefix`.
///
/// The rightmost byte below `0xFF` is incremented and everything after it is
/// dropped. Returns `None` for an empty prefix or one made only of `0xFF`
/// bytes, since nothing sorts after all of their extensions.
pub fn prefix_successor(prefix: &[u8]) -> Option<Bytes> {
    let idx = prefix.iter().rposition(|&b| b != 0xFF)?;
    let mut succ = BytesMut::from(&prefix[..=idx]);
    succ[idx] += 1;
    Some(succ.freeze())
}

/// Ordering of the keys stored in a cursor engine.
pub trait Comparator: Send + Sync {
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering;

    fn name(&self) -> &str;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UnsignedBytesComparator;

impl Comparator for UnsignedBytesComparator {
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        compare(a, b)
    }

    fn name(&self) -> &str {
        "refstore.UnsignedBytesComparator"
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn compare_basic() {
        assert_eq!(compare(b"", b""), Ordering::Equal);
        assert_eq!(compare(b"", b"a"), Ordering::Less);
        assert_eq!(compare(b"a", b""), Ordering::Greater);
        assert_eq!(compare(b"a", b"ab"), Ordering::Less);
        assert_eq!(compare(b"ab", b"b"), Ordering::Less);
        assert_eq!(compare(b"abc", b"abc"), Ordering::Equal);
    }

    #[test]
    fn compare_is_unsigned() {
        // 0x80 would be negative as a signed byte
        assert_eq!(compare(&[0x7F], &[0x80]), Ordering::Less);
        assert_eq!(compare(&[0xFF], &[0x00]), Ordering::Greater);
        assert_eq!(compare(&[0x01, 0xFF], &[0x02]), Ordering::Less);
    }

    #[test]
    fn prefix_containment() {
        assert!(has_prefix(b"abc", b"ab"));
        assert!(has_prefix(b"ab", b"ab"));
        assert!(has_prefix(b"ab", b""));
        assert!(!has_prefix(b"a", b"ab"));
        assert!(!has_prefix(b"ba", b"ab"));
    }

    #[test]
    fn successor_simple() {
        assert_eq!(prefix_successor(b"a").unwrap().as_ref(), b"b");
        assert_eq!(prefix_successor(&[0x00]).unwrap().as_ref(), &[0x01]);
        assert_eq!(prefix_successor(&[0x61, 0x62]).unwrap().as_ref(), &[0x61, 0x63]);
    }

    #[test]
    fn successor_trailing_ff() {
        assert_eq!(prefix_successor(&[0x61, 0xFF]).unwrap().as_ref(), &[0x62]);
        assert_eq!(
            prefix_successor(&[0x00, 0xFF, 0xFF]).unwrap().as_ref(),
            &[0x01]
        );
    }

    #[test]
    fn successor_none() {
        assert!(prefix_successor(&[]).is_none());
        assert!(prefix_successor(&[0xFF]).is_none());
        assert!(prefix_successor(&[0xFF, 0xFF]).is_none());
    }

    #[test]
    fn comparator_matches_slice_ord() {
        let cmp = UnsignedBytesComparator;
        assert_eq!(cmp.compare(b"x", b"xy"), b"x".as_slice().cmp(b"xy".as_slice()));
        assert_eq!(cmp.name(), "refstore.UnsignedBytesComparator");
    }

    proptest! {
        #[test]
        fn compare_agrees_with_slice_ord(a: Vec<u8>, b: Vec<u8>) {
            prop_assert_eq!(compare(&a, &b), a.cmp(&b));
        }

        #[test]
        fn compare_antisymmetric(a: Vec<u8>, b: Vec<u8>) {
            prop_assert_eq!(compare(&a, &b), compare(&b, &a).reverse());
            prop_assert_eq!(compare(&a, &b) == Ordering::Equal, a == b);
        }

        #[test]
        fn compare_transitive(mut keys in proptest::collection::vec(any::<Vec<u8>>(), 3)) {
            keys.sort_by(|a, b| compare(a, b));
            prop_assert_ne!(compare(&keys[0], &keys[1]), Ordering::Greater);
            prop_assert_ne!(compare(&keys[1], &keys[2]), Ordering::Greater);
            prop_assert_ne!(compare(&keys[0], &keys[2]), Ordering::Greater);
        }

        #[test]
        fn successor_bounds_every_extension(prefix: Vec<u8>, suffix: Vec<u8>) {
            prop_assume!(prefix.iter().any(|&b| b != 0xFF));
            let succ = prefix_successor(&prefix).unwrap();
            let mut extended = prefix.clone();
            extended.extend(&suffix);
            prop_assert_eq!(compare(&extended, &succ), Ordering::Less);
            prop_assert!(!has_prefix(&succ, &prefix));
        }
    }
}
