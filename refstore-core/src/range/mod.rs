//! Ordered scans of a [`Cursor`] over a [`KeyRange`].
//!
//! Two front ends share one navigation algorithm:
//! - [`RangeIterator`], pulled with `has_next` / `next_entry`
//! - [`RangeStream`], a single-pass sequence consumed by its combinators
//!
//! Both own the cursor for the whole scan and drop (close) it as soon as the
//! range is exhausted, an engine error occurs, cancellation is observed, or
//! the front end itself is dropped.

use log::debug;

use crate::cancel::Cancellation;
use crate::cursor::Cursor;
use crate::key_range::KeyRange;
use crate::Result;
use bytes::Bytes;
use navigator::Navigator;

mod iter;
mod navigator;
mod scan;
mod stream;

pub use iter::RangeIterator;
pub use scan::{
    collect_entries, count_entries, exists, find_first, for_each_entry, log_contents,
    stream_entries,
};
pub use stream::{MappedStream, RangeStream};

/// A view of the entry under the cursor. It borrows the cursor, so it cannot
/// be held across the next step; use [`Entry::to_owned`] to keep it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry<'a> {
    key: &'a [u8],
    val: &'a [u8],
}

impl<'a> Entry<'a> {
    pub fn key(&self) -> &'a [u8] {
        self.key
    }

    pub fn val(&self) -> &'a [u8] {
        self.val
    }

    pub fn to_owned(&self) -> OwnedEntry {
        OwnedEntry {
            key: Bytes::copy_from_slice(self.key),
            val: Bytes::copy_from_slice(self.val),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedEntry {
    pub key: Bytes,
    pub val: Bytes,
}

/// Cursor plus navigation state; the part both front ends have in common.
pub(crate) struct Scan<C: Cursor> {
    cursor: Option<C>,
    navigator: Navigator,
}

impl<C: Cursor> Scan<C> {
    pub(crate) fn new(cursor: C, range: KeyRange, cancel: Cancellation) -> Self {
        debug!("open range scan {:?}", range.kind());
        Self {
            cursor: Some(cursor),
            navigator: Navigator::new(range, cancel),
        }
    }

    /// Move to the next entry in range. The cursor is closed before this
    /// returns `Ok(false)` or an error.
    pub(crate) fn step(&mut self) -> Result<bool> {
        let Some(cursor) = self.cursor.as_mut() else {
            return Ok(false);
        };
        match self.navigator.advance(cursor) {
            Ok(true) => Ok(true),
            Ok(false) => {
                self.close();
                Ok(false)
            }
            Err(e) => {
                self.close();
                Err(e)
            }
        }
    }

    pub(crate) fn current(&self) -> Option<Entry<'_>> {
        self.cursor.as_ref().map(|cursor| Entry {
            key: cursor.key(),
            val: cursor.val(),
        })
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.cursor.is_none()
    }

    pub(crate) fn close(&mut self) {
        if self.cursor.take().is_some() {
            debug!("close range scan cursor");
        }
    }
}
