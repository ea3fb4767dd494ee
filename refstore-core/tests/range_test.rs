use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use refstore_core::{
    compare, Cancellation, Cursor, Error, KeyRange, Memtable, MemtableCursor, RangeIterator,
    RangeStream, Result,
};

mod common;

use common::*;

fn random_keys(rng: &mut StdRng, n: usize) -> Vec<Vec<u8>> {
    // a tiny alphabet with both ends of the byte range gives lots of shared
    // prefixes and 0x00 / 0xFF edges
    const ALPHABET: [u8; 5] = [0x00, 0x01, 0x61, 0xFE, 0xFF];
    (0..n)
        .map(|_| {
            let len = rng.gen_range(0..5);
            (0..len)
                .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())])
                .collect()
        })
        .collect()
}

fn sorted(keys: &[Vec<u8>]) -> Vec<Vec<u8>> {
    let mut keys = keys.to_vec();
    keys.sort_by(|a, b| compare(a, b));
    keys.dedup();
    keys
}

#[test]
fn end_to_end_scenario() {
    init();
    let mut memtable = Memtable::new();
    for key in ["a", "ab", "b", "ba"] {
        memtable.put(key.as_bytes(), b"v");
    }

    let keys = scan_keys(&memtable, KeyRange::prefix("a"));
    assert_eq!(strs(&keys), vec!["a", "ab"]);

    let keys = scan_keys(&memtable, KeyRange::prefix_backward("a"));
    assert_eq!(strs(&keys), vec!["ab", "a"]);

    let range = KeyRange::builder()
        .start("a")
        .stop_with("b", false)
        .build()
        .unwrap();
    let keys = scan_keys(&memtable, range);
    assert_eq!(strs(&keys), vec!["a", "ab"]);
}

#[test]
fn insertion_order_does_not_matter() {
    init();
    let mut rng = StdRng::seed_from_u64(0);
    let mut keys = (0..100).map(|i| format!("key{i:03}")).collect::<Vec<_>>();
    keys.shuffle(&mut rng);
    let memtable = memtable_of(&keys);

    let res = scan_keys(&memtable, KeyRange::closed("key010", "key019").unwrap());
    let expected = (10..20).map(|i| format!("key{i:03}")).collect::<Vec<_>>();
    assert_eq!(strs(&res), expected);
}

#[test]
fn prefix_containment() {
    init();
    let mut rng = StdRng::seed_from_u64(1);
    let keys = random_keys(&mut rng, 300);
    let memtable = memtable_of(&keys);
    let all = sorted(&keys);

    for _ in 0..50 {
        let prefix = random_keys(&mut rng, 1).pop().unwrap();
        let expected = all
            .iter()
            .filter(|k| k.starts_with(&prefix))
            .cloned()
            .collect::<Vec<_>>();

        let forward = scan_keys(&memtable, KeyRange::prefix(&prefix));
        assert!(forward.iter().all(|k| k.starts_with(&prefix)));
        assert_eq!(forward, expected, "prefix {prefix:?}");

        let mut backward = scan_keys(&memtable, KeyRange::prefix_backward(&prefix));
        backward.reverse();
        assert_eq!(backward, expected, "reverse prefix {prefix:?}");
    }
}

#[test]
fn range_bounds_and_reverse() {
    init();
    let mut rng = StdRng::seed_from_u64(2);
    let keys = random_keys(&mut rng, 300);
    let memtable = memtable_of(&keys);
    let all = sorted(&keys);

    for _ in 0..100 {
        let mut bounds = random_keys(&mut rng, 2);
        bounds.sort_by(|a, b| compare(a, b));
        let (lo, hi) = (bounds[0].clone(), bounds[1].clone());
        let lo_incl = rng.gen_bool(0.5);
        let hi_incl = rng.gen_bool(0.5);

        let expected = all
            .iter()
            .filter(|k| {
                let above = match compare(k, &lo) {
                    std::cmp::Ordering::Equal => lo_incl,
                    ord => ord.is_gt(),
                };
                let below = match compare(k, &hi) {
                    std::cmp::Ordering::Equal => hi_incl,
                    ord => ord.is_lt(),
                };
                above && below
            })
            .cloned()
            .collect::<Vec<_>>();

        let forward = KeyRange::builder()
            .start_with(&lo, lo_incl)
            .stop_with(&hi, hi_incl)
            .build()
            .unwrap();
        assert!(expected.iter().all(|k| forward.contains(k)));
        assert_eq!(scan_keys(&memtable, forward), expected);

        let backward = KeyRange::builder()
            .start_with(&hi, hi_incl)
            .stop_with(&lo, lo_incl)
            .reverse()
            .build()
            .unwrap();
        let mut res = scan_keys(&memtable, backward);
        res.reverse();
        assert_eq!(res, expected, "reverse of {lo:?}..{hi:?}");
    }
}

#[test]
fn inclusivity_drops_only_the_boundary() {
    init();
    let memtable = memtable_of(["a", "b", "c", "d", "e"]);
    let closed = scan_keys(&memtable, KeyRange::closed("b", "d").unwrap());
    assert_eq!(strs(&closed), vec!["b", "c", "d"]);
    let closed_open = scan_keys(&memtable, KeyRange::closed_open("b", "d").unwrap());
    assert_eq!(strs(&closed_open), vec!["b", "c"]);
    let open_closed = scan_keys(&memtable, KeyRange::open_closed("b", "d").unwrap());
    assert_eq!(strs(&open_closed), vec!["c", "d"]);
    let open = scan_keys(&memtable, KeyRange::open("b", "d").unwrap());
    assert_eq!(strs(&open), vec!["c"]);

    // bounds that are not keys are unaffected by inclusivity
    let closed = scan_keys(&memtable, KeyRange::closed("bb", "cc").unwrap());
    let open = scan_keys(&memtable, KeyRange::open("bb", "cc").unwrap());
    assert_eq!(closed, open);

    let backward = scan_keys(&memtable, KeyRange::open_closed_backward("d", "b").unwrap());
    assert_eq!(strs(&backward), vec!["c", "b"]);
    let backward = scan_keys(&memtable, KeyRange::at_most_backward("b"));
    assert_eq!(strs(&backward), vec!["e", "d", "c", "b"]);
    let backward = scan_keys(&memtable, KeyRange::less_than_backward("b"));
    assert_eq!(strs(&backward), vec!["e", "d", "c"]);
}

#[test]
fn all_ff_prefix_has_no_successor() {
    init();
    let memtable = memtable_of([
        vec![0xFEu8],
        vec![0xFF],
        vec![0xFF, 0xFF],
        vec![0xFF, 0xFF, 0x00],
        vec![0xFF, 0xFF, 0xFF, 0xFF],
    ]);
    let keys = scan_keys(&memtable, KeyRange::prefix_backward([0xFFu8, 0xFF]));
    assert_eq!(
        keys,
        vec![
            vec![0xFF, 0xFF, 0xFF, 0xFF],
            vec![0xFF, 0xFF, 0x00],
            vec![0xFF, 0xFF]
        ]
    );
}

#[test]
fn empty_memtable_yields_nothing() {
    init();
    let memtable = Memtable::new();
    for range in [
        KeyRange::all(),
        KeyRange::all_backward(),
        KeyRange::prefix("a"),
        KeyRange::prefix_backward("a"),
        KeyRange::at_least_backward("a"),
        KeyRange::less_than("a"),
    ] {
        assert!(scan_keys(&memtable, range).is_empty());
    }
}

/// Cursor that fails every movement after the first `ok_moves`, and counts
/// how often it was dropped.
struct FailingCursor<'a> {
    inner: MemtableCursor<'a>,
    ok_moves: usize,
    closed: Arc<AtomicUsize>,
}

impl<'a> FailingCursor<'a> {
    fn step(&mut self, f: impl FnOnce(&mut MemtableCursor<'a>) -> Result<bool>) -> Result<bool> {
        if self.ok_moves == 0 {
            return Err(Error::Engine("page checksum mismatch".to_owned()));
        }
        self.ok_moves -= 1;
        f(&mut self.inner)
    }
}

impl<'a> Cursor for FailingCursor<'a> {
    fn first(&mut self) -> Result<bool> {
        self.step(|c| c.first())
    }

    fn last(&mut self) -> Result<bool> {
        self.step(|c| c.last())
    }

    fn next(&mut self) -> Result<bool> {
        self.step(|c| c.next())
    }

    fn prev(&mut self) -> Result<bool> {
        self.step(|c| c.prev())
    }

    fn seek(&mut self, key: &[u8]) -> Result<bool> {
        self.step(|c| c.seek(key))
    }

    fn key(&self) -> &[u8] {
        self.inner.key()
    }

    fn val(&self) -> &[u8] {
        self.inner.val()
    }
}

impl<'a> Drop for FailingCursor<'a> {
    fn drop(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn engine_error_closes_cursor() {
    init();
    let memtable = memtable_of(["a", "b", "c", "d"]);
    let closed = Arc::new(AtomicUsize::new(0));
    let failing = |ok_moves| FailingCursor {
        inner: memtable.cursor(),
        ok_moves,
        closed: closed.clone(),
    };

    let mut iter = RangeIterator::new(failing(2), KeyRange::all());
    assert_eq!(iter.next_entry().unwrap().unwrap().key(), b"a");
    assert_eq!(iter.next_entry().unwrap().unwrap().key(), b"b");
    let err = iter.next_entry().unwrap_err();
    assert!(matches!(err, Error::Engine(_)));
    assert!(!err.is_cancelled());
    assert!(iter.is_closed());
    assert_eq!(closed.load(Ordering::SeqCst), 1);
    // stays finished without touching the engine again
    assert!(iter.next_entry().unwrap().is_none());
    drop(iter);
    assert_eq!(closed.load(Ordering::SeqCst), 1);

    let mut seen = 0;
    let err = RangeStream::new(failing(1), KeyRange::prefix_backward("c"))
        .try_for_each(|_| {
            seen += 1;
            Ok(())
        })
        .unwrap_err();
    assert!(matches!(err, Error::Engine(_)));
    assert_eq!(seen, 0);
    assert_eq!(closed.load(Ordering::SeqCst), 2);
}

#[test]
fn cursor_closed_on_every_exit() {
    init();
    let memtable = memtable_of(["a", "b", "c"]);
    let closed = Arc::new(AtomicUsize::new(0));
    let cursor = || FailingCursor {
        inner: memtable.cursor(),
        ok_moves: usize::MAX,
        closed: closed.clone(),
    };

    // exhausted
    let mut iter = RangeIterator::new(cursor(), KeyRange::all());
    while iter.has_next().unwrap() {
        iter.next_entry().unwrap();
    }
    assert_eq!(closed.load(Ordering::SeqCst), 1);
    drop(iter);

    // closed early
    let mut iter = RangeIterator::new(cursor(), KeyRange::all());
    assert!(iter.has_next().unwrap());
    iter.close();
    assert_eq!(closed.load(Ordering::SeqCst), 2);

    // consumer stopped early
    let first = RangeStream::new(cursor(), KeyRange::all())
        .find_map(|entry| Some(entry.key().to_vec()))
        .unwrap();
    assert_eq!(first, Some(b"a".to_vec()));
    assert_eq!(closed.load(Ordering::SeqCst), 3);

    // consumer failed
    let res = RangeStream::new(cursor(), KeyRange::all())
        .try_for_each(|_| Err(Error::Internal("decode failed".to_owned())));
    assert!(res.is_err());
    assert_eq!(closed.load(Ordering::SeqCst), 4);
}

#[test]
fn cancellation_stops_long_scan() {
    init();
    let keys = (0..1_000).map(|i| format!("{i:04}")).collect::<Vec<_>>();
    let memtable = memtable_of(&keys);
    let cancel = Cancellation::new();
    let mut iter = RangeIterator::with_cancellation(memtable.cursor(), KeyRange::all(), cancel.clone());

    let mut seen = 0;
    let err = loop {
        match iter.next_entry() {
            Ok(Some(_)) => {
                seen += 1;
                if seen == 10 {
                    cancel.cancel();
                }
            }
            Ok(None) => panic!("scan finished despite cancellation"),
            Err(e) => break e,
        }
    };
    assert!(err.is_cancelled());
    assert_eq!(seen, 10);
    assert!(iter.is_closed());
}
