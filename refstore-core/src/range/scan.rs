//! Whole-scan helpers over anything that can open a cursor.
//!
//! Each helper opens a fresh cursor, runs one scan and releases the cursor
//! before returning, whether the scan finished, failed or was cancelled.

use log::{debug, log_enabled, Level};

use crate::cancel::Cancellation;
use crate::cursor::CursorSource;
use crate::key_range::KeyRange;
use crate::Result;

use super::{Entry, OwnedEntry, RangeStream};

/// Run `f` over a stream of `range`. The stream, and with it the cursor, is
/// gone once `f` returns.
pub fn stream_entries<'s, S, T, F>(
    source: &'s S,
    range: KeyRange,
    cancel: &Cancellation,
    f: F,
) -> Result<T>
where
    S: CursorSource,
    F: FnOnce(RangeStream<S::Cursor<'s>>) -> Result<T>,
{
    let cursor = source.cursor()?;
    f(RangeStream::with_cancellation(cursor, range, cancel.clone()))
}

pub fn for_each_entry<S, F>(
    source: &S,
    range: KeyRange,
    cancel: &Cancellation,
    f: F,
) -> Result<()>
where
    S: CursorSource,
    F: FnMut(Entry<'_>) -> Result<()>,
{
    stream_entries(source, range, cancel, |stream| stream.try_for_each(f))
}

/// First entry in range order that matches `pred`, copied out of the cursor.
pub fn find_first<S, P>(
    source: &S,
    range: KeyRange,
    cancel: &Cancellation,
    mut pred: P,
) -> Result<Option<OwnedEntry>>
where
    S: CursorSource,
    P: FnMut(&Entry<'_>) -> bool,
{
    stream_entries(source, range, cancel, |stream| {
        stream.find_map(|entry| pred(&entry).then(|| entry.to_owned()))
    })
}

/// Whether any key in range matches `pred`.
pub fn exists<S, P>(source: &S, range: KeyRange, cancel: &Cancellation, mut pred: P) -> Result<bool>
where
    S: CursorSource,
    P: FnMut(&[u8]) -> bool,
{
    stream_entries(source, range, cancel, |stream| {
        stream.any(|entry| pred(entry.key()))
    })
}

pub fn count_entries<S>(source: &S, range: KeyRange, cancel: &Cancellation) -> Result<usize>
where
    S: CursorSource,
{
    stream_entries(source, range, cancel, |stream| stream.count())
}

pub fn collect_entries<S>(
    source: &S,
    range: KeyRange,
    cancel: &Cancellation,
) -> Result<Vec<OwnedEntry>>
where
    S: CursorSource,
{
    stream_entries(source, range, cancel, |stream| stream.owned().collect())
}

/// Dump every entry in range at debug level, keys and values hex encoded.
/// Does not open a cursor when debug logging is off.
pub fn log_contents<S>(source: &S, range: KeyRange, name: &str) -> Result<()>
where
    S: CursorSource,
{
    if !log_enabled!(Level::Debug) {
        return Ok(());
    }
    debug!("dumping contents of {name} for {:?}", range.kind());
    let n = stream_entries(source, range, &Cancellation::never(), |stream| {
        stream.try_fold(0usize, |n, entry| {
            debug!(
                "{name} {} - {}",
                hex::encode(entry.key()),
                hex::encode(entry.val())
            );
            Ok(n + 1)
        })
    })?;
    debug!("{name} contains {n} entries in range");
    Ok(())
}
