#![allow(dead_code)]

use refstore_core::{
    Cancellation, Cursor, KeyRange, Memtable, RangeIterator, RangeStream, Result,
};

pub fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Memtable holding `keys`, each mapped to its own bytes.
pub fn memtable_of<K: AsRef<[u8]>>(keys: impl IntoIterator<Item = K>) -> Memtable {
    let mut memtable = Memtable::new();
    for key in keys {
        memtable.put(key.as_ref(), key.as_ref());
    }
    memtable
}

pub fn iter_keys<C: Cursor>(cursor: C, range: KeyRange) -> Result<Vec<Vec<u8>>> {
    let mut iter = RangeIterator::new(cursor, range);
    let mut keys = vec![];
    while let Some(entry) = iter.next_entry()? {
        keys.push(entry.key().to_vec());
    }
    Ok(keys)
}

pub fn stream_keys<C: Cursor>(cursor: C, range: KeyRange) -> Result<Vec<Vec<u8>>> {
    RangeStream::with_cancellation(cursor, range, Cancellation::never())
        .map(|entry| entry.key().to_vec())
        .collect()
}

/// Keys of the range from both front ends; they must agree.
pub fn scan_keys(memtable: &Memtable, range: KeyRange) -> Vec<Vec<u8>> {
    let from_iter = iter_keys(memtable.cursor(), range.clone()).unwrap();
    let from_stream = stream_keys(memtable.cursor(), range).unwrap();
    assert_eq!(from_iter, from_stream);
    from_iter
}

pub fn strs(keys: &[Vec<u8>]) -> Vec<&str> {
    keys.iter()
        .map(|k| std::str::from_utf8(k).unwrap())
        .collect()
}
