use log::trace;

use crate::cursor::{Cursor, CursorSource};
use crate::Result;
use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Included, Unbounded};

/// An in memory ordered key-value table.
///
/// `Vec<u8>` orders its contents as unsigned bytes, so the map's order is the
/// same order the range engine navigates by.
#[derive(Default, Clone, Debug)]
pub struct Memtable {
    table: BTreeMap<Vec<u8>, Vec<u8>>,
    // approx size in bytes
    approx_size: usize,
}

impl Memtable {
    pub fn new() -> Self {
        Self {
            table: BTreeMap::new(),
            approx_size: 0,
        }
    }

    pub fn put(&mut self, key: &[u8], value: &[u8]) {
        self.approx_size += key.len() + value.len();
        if let Some(old) = self.table.insert(key.to_vec(), value.to_vec()) {
            self.approx_size -= key.len() + old.len();
        }
    }

    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.table.get(key).map(|v| v.as_slice())
    }

    /// Returns whether the key was present.
    pub fn delete(&mut self, key: &[u8]) -> bool {
        match self.table.remove(key) {
            Some(old) => {
                self.approx_size -= key.len() + old.len();
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn approx_size(&self) -> usize {
        self.approx_size
    }

    pub fn cursor(&self) -> MemtableCursor<'_> {
        trace!("open cursor over memtable of {} entries", self.table.len());
        MemtableCursor {
            table: &self.table,
            current: None,
        }
    }
}

impl<K: AsRef<[u8]>, V: AsRef<[u8]>> FromIterator<(K, V)> for Memtable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut memtable = Memtable::new();
        for (k, v) in iter {
            memtable.put(k.as_ref(), v.as_ref());
        }
        memtable
    }
}

impl CursorSource for Memtable {
    type Cursor<'a> = MemtableCursor<'a>;

    fn cursor(&self) -> Result<Self::Cursor<'_>> {
        Ok(Memtable::cursor(self))
    }
}

/// Bidirectional cursor over a [`Memtable`].
///
/// Once a movement runs off either end the cursor is unpositioned and only
/// `first`, `last` or `seek` can place it again.
pub struct MemtableCursor<'a> {
    table: &'a BTreeMap<Vec<u8>, Vec<u8>>,
    current: Option<(&'a [u8], &'a [u8])>,
}

impl<'a> MemtableCursor<'a> {
    fn set(&mut self, entry: Option<(&'a Vec<u8>, &'a Vec<u8>)>) -> bool {
        self.current = entry.map(|(k, v)| (k.as_slice(), v.as_slice()));
        self.current.is_some()
    }
}

impl<'a> Cursor for MemtableCursor<'a> {
    fn first(&mut self) -> Result<bool> {
        let entry = self.table.iter().next();
        Ok(self.set(entry))
    }

    fn last(&mut self) -> Result<bool> {
        let entry = self.table.iter().next_back();
        Ok(self.set(entry))
    }

    fn next(&mut self) -> Result<bool> {
        let entry = match self.current {
            Some((key, _)) => self
                .table
                .range::<[u8], _>((Excluded(key), Unbounded))
                .next(),
            None => None,
        };
        Ok(self.set(entry))
    }

    fn prev(&mut self) -> Result<bool> {
        let entry = match self.current {
            Some((key, _)) => self
                .table
                .range::<[u8], _>((Unbounded, Excluded(key)))
                .next_back(),
            None => None,
        };
        Ok(self.set(entry))
    }

    fn seek(&mut self, key: &[u8]) -> Result<bool> {
        let entry = self
            .table
            .range::<[u8], _>((Included(key), Unbounded))
            .next();
        Ok(self.set(entry))
    }

    fn key(&self) -> &[u8] {
        match self.current {
            Some((k, _)) => k,
            None => &[],
        }
    }

    fn val(&self) -> &[u8] {
        match self.current {
            Some((_, v)) => v,
            None => &[],
        }
    }
}
