use bytes::{Buf, BufMut};

/// A fixed capacity byte buffer with a write/read position and a limit.
///
/// Writing advances `position` up to `limit`; [`NativeBuffer::flip`] turns
/// what was written into the readable region. Capacity never changes once the
/// buffer is allocated.
#[derive(Default)]
pub struct NativeBuffer {
    data: Box<[u8]>,
    position: usize,
    limit: usize,
}

impl NativeBuffer {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            data: vec![0u8; capacity].into_boxed_slice(),
            position: 0,
            limit: capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn remaining(&self) -> usize {
        self.limit - self.position
    }

    pub fn has_remaining(&self) -> bool {
        self.position < self.limit
    }

    /// Reset for writing: position 0, limit at capacity. Contents are kept.
    pub fn clear(&mut self) {
        self.position = 0;
        self.limit = self.data.len();
    }

    /// Make the bytes written so far readable from the start.
    pub fn flip(&mut self) {
        self.limit = self.position;
        self.position = 0;
    }

    /// Read the same region again.
    pub fn rewind(&mut self) {
        self.position = 0;
    }

    /// The readable region, `position..limit`.
    pub fn as_slice(&self) -> &[u8] {
        &self.data[self.position..self.limit]
    }

    /// The whole backing storage, ignoring position and limit.
    pub fn as_mut_bytes(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Returns false, writing nothing, when fewer than `src.len()` bytes
    /// remain.
    pub fn put_slice(&mut self, src: &[u8]) -> bool {
        if src.len() > self.remaining() {
            return false;
        }
        let end = self.position + src.len();
        self.data[self.position..end].copy_from_slice(src);
        self.position = end;
        true
    }

    pub fn put_u32(&mut self, v: u32) -> bool {
        self.put_slice(&v.to_be_bytes())
    }

    pub fn put_u64(&mut self, v: u64) -> bool {
        self.put_slice(&v.to_be_bytes())
    }

    /// Take the next `len` readable bytes; `None` if too few remain.
    pub fn get_slice(&mut self, len: usize) -> Option<&[u8]> {
        if len > self.remaining() {
            return None;
        }
        let start = self.position;
        self.position += len;
        Some(&self.data[start..self.position])
    }

    pub fn get_u32(&mut self) -> Option<u32> {
        if self.remaining() < 4 {
            return None;
        }
        let mut readable = self.as_slice();
        let v = readable.get_u32();
        self.position += 4;
        Some(v)
    }

    pub fn get_u64(&mut self) -> Option<u64> {
        if self.remaining() < 8 {
            return None;
        }
        let mut readable = self.as_slice();
        let v = readable.get_u64();
        self.position += 8;
        Some(v)
    }

    /// Writable view of `position..limit` that implements [`BufMut`], for
    /// encoders written against the `bytes` traits. Returns how many bytes
    /// the encoder wrote.
    pub fn write_with<F>(&mut self, f: F) -> usize
    where
        F: FnOnce(&mut &mut [u8]),
    {
        let (start, limit) = (self.position, self.limit);
        let mut window = &mut self.data[start..limit];
        f(&mut window);
        let written = (limit - start) - window.remaining_mut();
        self.position += written;
        written
    }
}

impl std::fmt::Debug for NativeBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeBuffer")
            .field("capacity", &self.capacity())
            .field("position", &self.position)
            .field("limit", &self.limit)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn put_flip_get() {
        let mut buf = NativeBuffer::new(16);
        assert!(buf.put_u32(7));
        assert!(buf.put_slice(b"key"));
        assert_eq!(buf.remaining(), 9);
        buf.flip();
        assert_eq!(buf.as_slice().len(), 7);
        assert_eq!(buf.get_u32(), Some(7));
        assert_eq!(buf.get_slice(3), Some(b"key".as_slice()));
        assert!(!buf.has_remaining());
        assert_eq!(buf.get_u32(), None);
        buf.rewind();
        assert_eq!(buf.remaining(), 7);
        buf.clear();
        assert_eq!(buf.remaining(), 16);
    }

    #[test]
    fn overflow_writes_nothing() {
        let mut buf = NativeBuffer::new(10);
        assert!(buf.put_u64(u64::MAX));
        assert!(!buf.put_u32(1));
        assert_eq!(buf.position(), 8);
        assert!(buf.put_slice(&[1, 2]));
        assert!(!buf.put_slice(&[3]));
    }

    #[test]
    fn write_with_buf_mut() {
        let mut buf = NativeBuffer::new(10);
        let written = buf.write_with(|w| {
            w.put_u16(0xABCD);
            w.put_u8(1);
        });
        assert_eq!(written, 3);
        buf.flip();
        assert_eq!(buf.as_slice(), &[0xABu8, 0xCD, 0x01]);
    }
}
