use log::trace;

use crate::cancel::Cancellation;
use crate::comparator::{compare, has_prefix, prefix_successor};
use crate::cursor::Cursor;
use crate::key_range::{KeyRange, RangeKind};
use crate::Result;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Unstarted,
    Positioned,
    Exhausted,
}

/// Walks a cursor through one [`KeyRange`].
///
/// Shared by [`super::RangeIterator`] and [`super::RangeStream`]; neither
/// moves the cursor itself.
pub(crate) struct Navigator {
    range: KeyRange,
    cancel: Cancellation,
    state: State,
}

impl Navigator {
    pub(crate) fn new(range: KeyRange, cancel: Cancellation) -> Self {
        Self {
            range,
            cancel,
            state: State::Unstarted,
        }
    }

    /// Move to the next entry of the range. Returns `false` once the range
    /// is used up, after which the cursor is never touched again.
    pub(crate) fn advance<C: Cursor + ?Sized>(&mut self, cursor: &mut C) -> Result<bool> {
        let state = self.state;
        if state == State::Exhausted {
            return Ok(false);
        }
        // anything that fails below leaves the navigation finished
        self.state = State::Exhausted;
        self.cancel.check()?;

        let found = match state {
            State::Unstarted => self.position(cursor)?,
            _ => self.step(cursor)?,
        };
        if !found || !self.within_stop(cursor.key()) {
            trace!("range {:?} exhausted", self.range.kind());
            return Ok(false);
        }
        trace!("range {:?} at key {:?}", self.range.kind(), cursor.key());
        self.state = State::Positioned;
        Ok(true)
    }

    /// First placement of the cursor.
    fn position<C: Cursor + ?Sized>(&self, cursor: &mut C) -> Result<bool> {
        match self.range.kind() {
            RangeKind::All { reverse: false } => cursor.first(),
            RangeKind::All { reverse: true } => cursor.last(),
            RangeKind::Prefix {
                prefix,
                reverse: false,
            } => cursor.seek(prefix),
            RangeKind::Prefix {
                prefix,
                reverse: true,
            } => match prefix_successor(prefix) {
                // land on the first key past every prefixed key, then back off
                Some(successor) => {
                    if cursor.seek(&successor)? {
                        cursor.prev()
                    } else {
                        cursor.last()
                    }
                }
                None => cursor.last(),
            },
            RangeKind::Range {
                start: None,
                reverse,
                ..
            } => {
                if *reverse {
                    cursor.last()
                } else {
                    cursor.first()
                }
            }
            RangeKind::Range {
                start: Some(start),
                start_inclusive,
                reverse: false,
                ..
            } => {
                let mut found = cursor.seek(start)?;
                // seek only lands on keys >= start, so this skips the
                // entries equal to an excluded start
                while found && !past_start(cursor.key(), start, *start_inclusive, false) {
                    found = cursor.next()?;
                }
                Ok(found)
            }
            RangeKind::Range {
                start: Some(start),
                start_inclusive,
                reverse: true,
                ..
            } => {
                let mut found = cursor.seek(start)?;
                if !found {
                    // every key is below start
                    found = cursor.last()?;
                }
                while found && !past_start(cursor.key(), start, *start_inclusive, true) {
                    found = cursor.prev()?;
                }
                Ok(found)
            }
        }
    }

    fn step<C: Cursor + ?Sized>(&self, cursor: &mut C) -> Result<bool> {
        if self.range.is_reverse() {
            cursor.prev()
        } else {
            cursor.next()
        }
    }

    /// Whether `key` has not yet gone beyond the far end of the range.
    fn within_stop(&self, key: &[u8]) -> bool {
        match self.range.kind() {
            RangeKind::All { .. } => true,
            RangeKind::Prefix { prefix, .. } => has_prefix(key, prefix),
            RangeKind::Range {
                stop: None,
                ..
            } => true,
            RangeKind::Range {
                stop: Some(stop),
                stop_inclusive,
                reverse,
                ..
            } => {
                let beyond = if *reverse {
                    Ordering::Greater
                } else {
                    Ordering::Less
                };
                match compare(stop, key) {
                    Ordering::Equal => *stop_inclusive,
                    ord => ord != beyond,
                }
            }
        }
    }
}

/// Whether `key` is on the scanning side of `start`.
fn past_start(key: &[u8], start: &[u8], inclusive: bool, reverse: bool) -> bool {
    match compare(key, start) {
        Ordering::Equal => inclusive,
        Ordering::Greater => !reverse,
        Ordering::Less => reverse,
    }
}
