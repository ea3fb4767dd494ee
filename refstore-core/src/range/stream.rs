use std::iter::FusedIterator;

use crate::cancel::Cancellation;
use crate::cursor::Cursor;
use crate::key_range::KeyRange;
use crate::Result;

use super::{Entry, OwnedEntry, Scan};

/// A lazily produced, single-pass sequence of the entries in a range.
///
/// Entries only live as long as one callback, so the sequence is consumed
/// through the combinators below rather than `Iterator`. [`RangeStream::map`]
/// turns it into a real iterator once each entry has been turned into an
/// owned value.
pub struct RangeStream<C: Cursor> {
    scan: Scan<C>,
}

impl<C: Cursor> RangeStream<C> {
    pub fn new(cursor: C, range: KeyRange) -> Self {
        Self::with_cancellation(cursor, range, Cancellation::never())
    }

    pub fn with_cancellation(cursor: C, range: KeyRange, cancel: Cancellation) -> Self {
        Self {
            scan: Scan::new(cursor, range, cancel),
        }
    }

    pub fn try_fold<B, F>(mut self, init: B, mut f: F) -> Result<B>
    where
        F: FnMut(B, Entry<'_>) -> Result<B>,
    {
        let mut acc = init;
        while self.scan.step()? {
            if let Some(entry) = self.scan.current() {
                acc = f(acc, entry)?;
            }
        }
        Ok(acc)
    }

    pub fn try_for_each<F>(self, mut f: F) -> Result<()>
    where
        F: FnMut(Entry<'_>) -> Result<()>,
    {
        self.try_fold((), |_, entry| f(entry))
    }

    /// Stops at the first entry `f` maps to `Some`; the cursor is released
    /// without visiting the rest of the range.
    pub fn find_map<T, F>(mut self, mut f: F) -> Result<Option<T>>
    where
        F: FnMut(Entry<'_>) -> Option<T>,
    {
        while self.scan.step()? {
            if let Some(found) = self.scan.current().and_then(&mut f) {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    pub fn any<F>(self, mut pred: F) -> Result<bool>
    where
        F: FnMut(Entry<'_>) -> bool,
    {
        Ok(self.find_map(|entry| pred(entry).then_some(()))?.is_some())
    }

    pub fn count(self) -> Result<usize> {
        self.try_fold(0, |n, _| Ok(n + 1))
    }

    pub fn map<T, F>(self, f: F) -> MappedStream<C, F>
    where
        F: FnMut(Entry<'_>) -> T,
    {
        MappedStream { scan: self.scan, f }
    }

    /// Copies every entry out of the cursor.
    pub fn owned(self) -> MappedStream<C, fn(Entry<'_>) -> OwnedEntry> {
        self.map(owned_entry as fn(Entry<'_>) -> OwnedEntry)
    }

    /// Stop early and release the cursor. Dropping the stream does the same.
    pub fn close(mut self) {
        self.scan.close();
    }
}

fn owned_entry(entry: Entry<'_>) -> OwnedEntry {
    entry.to_owned()
}

/// Iterator over the values a [`RangeStream`] maps its entries to.
///
/// An error is yielded once and ends the iteration.
pub struct MappedStream<C: Cursor, F> {
    scan: Scan<C>,
    f: F,
}

impl<C: Cursor, F> MappedStream<C, F> {
    pub fn is_closed(&self) -> bool {
        self.scan.is_closed()
    }

    pub fn close(mut self) {
        self.scan.close();
    }
}

impl<C, T, F> Iterator for MappedStream<C, F>
where
    C: Cursor,
    F: FnMut(Entry<'_>) -> T,
{
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.scan.step() {
            Ok(true) => self.scan.current().map(|entry| Ok((self.f)(entry))),
            Ok(false) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

// a failed or finished scan has already released its cursor and stays done
impl<C, T, F> FusedIterator for MappedStream<C, F>
where
    C: Cursor,
    F: FnMut(Entry<'_>) -> T,
{
}
