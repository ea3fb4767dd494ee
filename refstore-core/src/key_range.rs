//! Validated descriptions of a key scan.

use crate::comparator::{compare, has_prefix};
use crate::{Error, Result};
use bytes::Bytes;
use std::cmp::Ordering;

/// The shape of a scan. Obtained from [`KeyRange::kind`]; a [`KeyRange`]
/// itself can only be made through [`KeyRangeBuilder::build`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RangeKind {
    All {
        reverse: bool,
    },
    Prefix {
        prefix: Bytes,
        reverse: bool,
    },
    /// For a forward range `start` is the lower bound and `stop` the upper
    /// one; for a reverse range it is the other way round. An absent bound is
    /// unbounded in that direction.
    Range {
        start: Option<Bytes>,
        stop: Option<Bytes>,
        start_inclusive: bool,
        stop_inclusive: bool,
        reverse: bool,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyRange {
    kind: RangeKind,
}

impl KeyRange {
    pub fn builder() -> KeyRangeBuilder {
        KeyRangeBuilder::default()
    }

    pub fn kind(&self) -> &RangeKind {
        &self.kind
    }

    pub fn is_reverse(&self) -> bool {
        match self.kind {
            RangeKind::All { reverse }
            | RangeKind::Prefix { reverse, .. }
            | RangeKind::Range { reverse, .. } => reverse,
        }
    }

    /// Whether a scan of this range would yield `key`.
    pub fn contains(&self, key: &[u8]) -> bool {
        match &self.kind {
            RangeKind::All { .. } => true,
            RangeKind::Prefix { prefix, .. } => has_prefix(key, prefix),
            RangeKind::Range {
                start,
                stop,
                start_inclusive,
                stop_inclusive,
                reverse,
            } => {
                // In a reverse range the start bound sits above the stop bound.
                let (after, before) = if *reverse {
                    (Ordering::Less, Ordering::Greater)
                } else {
                    (Ordering::Greater, Ordering::Less)
                };
                let start_ok = start.as_ref().map_or(true, |s| {
                    let ord = compare(key, s);
                    ord == after || (ord == Ordering::Equal && *start_inclusive)
                });
                let stop_ok = stop.as_ref().map_or(true, |s| {
                    let ord = compare(key, s);
                    ord == before || (ord == Ordering::Equal && *stop_inclusive)
                });
                start_ok && stop_ok
            }
        }
    }

    pub fn all() -> Self {
        Self {
            kind: RangeKind::All { reverse: false },
        }
    }

    pub fn all_backward() -> Self {
        Self {
            kind: RangeKind::All { reverse: true },
        }
    }

    pub fn prefix(prefix: impl AsRef<[u8]>) -> Self {
        Self {
            kind: RangeKind::Prefix {
                prefix: Bytes::copy_from_slice(prefix.as_ref()),
                reverse: false,
            },
        }
    }

    pub fn prefix_backward(prefix: impl AsRef<[u8]>) -> Self {
        Self {
            kind: RangeKind::Prefix {
                prefix: Bytes::copy_from_slice(prefix.as_ref()),
                reverse: true,
            },
        }
    }

    /// Keys `>= start`.
    pub fn at_least(start: impl AsRef<[u8]>) -> Self {
        Self::one_sided(Some((start.as_ref(), true)), None, false)
    }

    /// Keys `<= start`, descending.
    pub fn at_least_backward(start: impl AsRef<[u8]>) -> Self {
        Self::one_sided(Some((start.as_ref(), true)), None, true)
    }

    /// Keys `> start`.
    pub fn greater_than(start: impl AsRef<[u8]>) -> Self {
        Self::one_sided(Some((start.as_ref(), false)), None, false)
    }

    /// Keys `< start`, descending.
    pub fn greater_than_backward(start: impl AsRef<[u8]>) -> Self {
        Self::one_sided(Some((start.as_ref(), false)), None, true)
    }

    /// Keys `<= stop`.
    pub fn at_most(stop: impl AsRef<[u8]>) -> Self {
        Self::one_sided(None, Some((stop.as_ref(), true)), false)
    }

    /// Keys `>= stop`, descending.
    pub fn at_most_backward(stop: impl AsRef<[u8]>) -> Self {
        Self::one_sided(None, Some((stop.as_ref(), true)), true)
    }

    /// Keys `< stop`.
    pub fn less_than(stop: impl AsRef<[u8]>) -> Self {
        Self::one_sided(None, Some((stop.as_ref(), false)), false)
    }

    /// Keys `> stop`, descending.
    pub fn less_than_backward(stop: impl AsRef<[u8]>) -> Self {
        Self::one_sided(None, Some((stop.as_ref(), false)), true)
    }

    /// `start <= key <= stop`.
    pub fn closed(start: impl AsRef<[u8]>, stop: impl AsRef<[u8]>) -> Result<Self> {
        Self::bounded(start.as_ref(), true, stop.as_ref(), true, false)
    }

    pub fn closed_backward(start: impl AsRef<[u8]>, stop: impl AsRef<[u8]>) -> Result<Self> {
        Self::bounded(start.as_ref(), true, stop.as_ref(), true, true)
    }

    /// `start <= key < stop`.
    pub fn closed_open(start: impl AsRef<[u8]>, stop: impl AsRef<[u8]>) -> Result<Self> {
        Self::bounded(start.as_ref(), true, stop.as_ref(), false, false)
    }

    pub fn closed_open_backward(start: impl AsRef<[u8]>, stop: impl AsRef<[u8]>) -> Result<Self> {
        Self::bounded(start.as_ref(), true, stop.as_ref(), false, true)
    }

    /// `start < key < stop`.
    pub fn open(start: impl AsRef<[u8]>, stop: impl AsRef<[u8]>) -> Result<Self> {
        Self::bounded(start.as_ref(), false, stop.as_ref(), false, false)
    }

    pub fn open_backward(start: impl AsRef<[u8]>, stop: impl AsRef<[u8]>) -> Result<Self> {
        Self::bounded(start.as_ref(), false, stop.as_ref(), false, true)
    }

    /// `start < key <= stop`.
    pub fn open_closed(start: impl AsRef<[u8]>, stop: impl AsRef<[u8]>) -> Result<Self> {
        Self::bounded(start.as_ref(), false, stop.as_ref(), true, false)
    }

    pub fn open_closed_backward(start: impl AsRef<[u8]>, stop: impl AsRef<[u8]>) -> Result<Self> {
        Self::bounded(start.as_ref(), false, stop.as_ref(), true, true)
    }

    // a single bound can never violate the ordering invariant
    fn one_sided(start: Option<(&[u8], bool)>, stop: Option<(&[u8], bool)>, reverse: bool) -> Self {
        Self {
            kind: RangeKind::Range {
                start: start.map(|(k, _)| Bytes::copy_from_slice(k)),
                stop: stop.map(|(k, _)| Bytes::copy_from_slice(k)),
                start_inclusive: start.map_or(true, |(_, inc)| inc),
                stop_inclusive: stop.map_or(true, |(_, inc)| inc),
                reverse,
            },
        }
    }

    fn bounded(
        start: &[u8],
        start_inclusive: bool,
        stop: &[u8],
        stop_inclusive: bool,
        reverse: bool,
    ) -> Result<Self> {
        let mut builder = KeyRange::builder()
            .start_with(start, start_inclusive)
            .stop_with(stop, stop_inclusive);
        if reverse {
            builder = builder.reverse();
        }
        builder.build()
    }
}

/// Builds a [`KeyRange`], checking the bound ordering in [`build`](Self::build).
///
/// Explicit bounds are inclusive unless stated otherwise.
///
/// ```
/// use refstore_core::KeyRange;
///
/// let range = KeyRange::builder()
///     .start("a")
///     .stop_with("b", false)
///     .build()
///     .unwrap();
/// assert!(range.contains(b"ab"));
/// assert!(!range.contains(b"b"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct KeyRangeBuilder {
    prefix: Option<Bytes>,
    start: Option<(Bytes, bool)>,
    stop: Option<(Bytes, bool)>,
    reverse: bool,
}

impl KeyRangeBuilder {
    /// Widen back to every key, dropping any prefix or bounds set so far.
    pub fn all(mut self) -> Self {
        self.prefix = None;
        self.start = None;
        self.stop = None;
        self
    }

    pub fn prefix(mut self, prefix: impl AsRef<[u8]>) -> Self {
        self.prefix = Some(Bytes::copy_from_slice(prefix.as_ref()));
        self
    }

    pub fn start(self, key: impl AsRef<[u8]>) -> Self {
        self.start_with(key, true)
    }

    pub fn start_with(mut self, key: impl AsRef<[u8]>, inclusive: bool) -> Self {
        self.start = Some((Bytes::copy_from_slice(key.as_ref()), inclusive));
        self
    }

    pub fn stop(self, key: impl AsRef<[u8]>) -> Self {
        self.stop_with(key, true)
    }

    pub fn stop_with(mut self, key: impl AsRef<[u8]>, inclusive: bool) -> Self {
        self.stop = Some((Bytes::copy_from_slice(key.as_ref()), inclusive));
        self
    }

    pub fn reverse(mut self) -> Self {
        self.reverse = true;
        self
    }

    pub fn build(self) -> Result<KeyRange> {
        let reverse = self.reverse;
        if let Some(prefix) = self.prefix {
            if self.start.is_some() || self.stop.is_some() {
                return Err(Error::InvalidRange(
                    "a prefix range cannot also have start/stop bounds".to_owned(),
                ));
            }
            return Ok(KeyRange {
                kind: RangeKind::Prefix { prefix, reverse },
            });
        }

        if self.start.is_none() && self.stop.is_none() {
            return Ok(KeyRange {
                kind: RangeKind::All { reverse },
            });
        }

        if let (Some((start, _)), Some((stop, _))) = (&self.start, &self.stop) {
            let ord = compare(start, stop);
            if !reverse && ord == Ordering::Greater {
                return Err(Error::InvalidRange(format!(
                    "start {start:?} is after stop {stop:?} in a forward range"
                )));
            }
            if reverse && ord == Ordering::Less {
                return Err(Error::InvalidRange(format!(
                    "start {start:?} is before stop {stop:?} in a reverse range"
                )));
            }
        }

        let (start, start_inclusive) = split_bound(self.start);
        let (stop, stop_inclusive) = split_bound(self.stop);
        Ok(KeyRange {
            kind: RangeKind::Range {
                start,
                stop,
                start_inclusive,
                stop_inclusive,
                reverse,
            },
        })
    }
}

fn split_bound(bound: Option<(Bytes, bool)>) -> (Option<Bytes>, bool) {
    match bound {
        Some((key, inclusive)) => (Some(key), inclusive),
        None => (None, true),
    }
}
