use crate::Result;

/// A positioned handle over an ordered key-value engine, scoped to one
/// transaction.
///
/// Every movement returns whether the cursor ended up on an entry. Keys are
/// ordered by [`crate::comparator::compare`]; an engine whose native order
/// differs must not implement this trait.
///
/// Dropping the cursor closes it.
pub trait Cursor {
    fn first(&mut self) -> Result<bool>;
    fn last(&mut self) -> Result<bool>;
    fn next(&mut self) -> Result<bool>;
    fn prev(&mut self) -> Result<bool>;
    /// Position the cursor on the first entry whose key >= `key`.
    fn seek(&mut self, key: &[u8]) -> Result<bool>;

    /// Key at the current position. Only meaningful after a movement
    /// returned `true`.
    fn key(&self) -> &[u8];
    /// Value at the current position, same validity as [`Cursor::key`].
    fn val(&self) -> &[u8];
}

impl<C: Cursor + ?Sized> Cursor for Box<C> {
    fn first(&mut self) -> Result<bool> {
        (**self).first()
    }

    fn last(&mut self) -> Result<bool> {
        (**self).last()
    }

    fn next(&mut self) -> Result<bool> {
        (**self).next()
    }

    fn prev(&mut self) -> Result<bool> {
        (**self).prev()
    }

    fn seek(&mut self, key: &[u8]) -> Result<bool> {
        (**self).seek(key)
    }

    fn key(&self) -> &[u8] {
        (**self).key()
    }

    fn val(&self) -> &[u8] {
        (**self).val()
    }
}

/// Something that can open fresh cursors, e.g. a read transaction.
pub trait CursorSource {
    type Cursor<'a>: Cursor
    where
        Self: 'a;

    fn cursor(&self) -> Result<Self::Cursor<'_>>;
}
