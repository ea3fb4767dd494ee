//! Helpers shared by the end-to-end cases.

use refstore_core::{
    Cancellation, CursorSource, KeyRange, Memtable, RangeIterator, RangeStream, Result,
};

pub fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn put(memtable: &mut Memtable, key: impl AsRef<str>, value: u32) {
    memtable.put(key.as_ref().as_bytes(), &value.to_be_bytes());
}

pub fn value_of(val: &[u8]) -> Option<u32> {
    val.try_into().ok().map(u32::from_be_bytes)
}

/// Keys and decoded values of `range`, read through the pull iterator.
pub fn iterate<S: CursorSource>(source: &S, range: KeyRange) -> Result<Vec<(String, u32)>> {
    let mut iter = RangeIterator::new(source.cursor()?, range);
    let mut res = vec![];
    while let Some(entry) = iter.next_entry()? {
        res.push(decode(entry.key(), entry.val()));
    }
    Ok(res)
}

/// Same as [`iterate`] but read through the stream.
pub fn stream<S: CursorSource>(source: &S, range: KeyRange) -> Result<Vec<(String, u32)>> {
    RangeStream::with_cancellation(source.cursor()?, range, Cancellation::never())
        .map(|entry| decode(entry.key(), entry.val()))
        .collect()
}

fn decode(key: &[u8], val: &[u8]) -> (String, u32) {
    (
        String::from_utf8_lossy(key).into_owned(),
        value_of(val).unwrap_or_default(),
    )
}
