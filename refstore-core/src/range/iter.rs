use crate::cancel::Cancellation;
use crate::cursor::Cursor;
use crate::key_range::KeyRange;
use crate::Result;

use super::{Entry, Scan};

/// Pull-style scan: `has_next` moves the cursor, `next_entry` hands out the
/// entry it landed on.
///
/// ```
/// use refstore_core::{KeyRange, Memtable, RangeIterator};
///
/// let memtable: Memtable = [("a", "1"), ("ab", "2"), ("b", "3")].into_iter().collect();
/// let mut iter = RangeIterator::new(memtable.cursor(), KeyRange::prefix("a"));
/// let mut keys = vec![];
/// while let Some(entry) = iter.next_entry().unwrap() {
///     keys.push(entry.key().to_vec());
/// }
/// assert_eq!(keys, vec![b"a".to_vec(), b"ab".to_vec()]);
/// ```
pub struct RangeIterator<C: Cursor> {
    scan: Scan<C>,
    // the cursor sits on an entry that has not been handed out yet
    pending: bool,
}

impl<C: Cursor> RangeIterator<C> {
    pub fn new(cursor: C, range: KeyRange) -> Self {
        Self::with_cancellation(cursor, range, Cancellation::never())
    }

    pub fn with_cancellation(cursor: C, range: KeyRange, cancel: Cancellation) -> Self {
        Self {
            scan: Scan::new(cursor, range, cancel),
            pending: false,
        }
    }

    pub fn has_next(&mut self) -> Result<bool> {
        if !self.pending {
            self.pending = self.scan.step()?;
        }
        Ok(self.pending)
    }

    /// `Ok(None)` once the range is exhausted.
    pub fn next_entry(&mut self) -> Result<Option<Entry<'_>>> {
        if !self.has_next()? {
            return Ok(None);
        }
        self.pending = false;
        Ok(self.scan.current())
    }

    /// Whether the cursor has been released.
    pub fn is_closed(&self) -> bool {
        self.scan.is_closed()
    }

    /// Stop early and release the cursor. Dropping the iterator does the same.
    pub fn close(mut self) {
        self.scan.close();
    }
}
