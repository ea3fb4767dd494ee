use log::trace;

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use super::buffer::NativeBuffer;
use super::size_class::SizeClass;
use super::ByteBufferPool;

enum Owner {
    Pooled { class: Arc<SizeClass>, generation: u64 },
    // oversized, unpooled class or excess over the class limit
    Unpooled,
}

/// Exclusive loan of one [`NativeBuffer`].
///
/// The handle is move-only. Dropping it gives the buffer back to its size
/// class, or destroys it if it never belonged to one, so a buffer cannot be
/// used after it has been returned.
pub struct PooledBuffer {
    buffer: NativeBuffer,
    owner: Owner,
}

impl PooledBuffer {
    pub(crate) fn pooled(mut buffer: NativeBuffer, class: Arc<SizeClass>, generation: u64) -> Self {
        buffer.clear();
        Self {
            buffer,
            owner: Owner::Pooled { class, generation },
        }
    }

    pub(crate) fn unpooled(capacity: usize) -> Self {
        Self {
            buffer: NativeBuffer::new(capacity),
            owner: Owner::Unpooled,
        }
    }

    /// Whether the buffer goes back to a size class when released.
    pub fn is_pooled(&self) -> bool {
        matches!(self.owner, Owner::Pooled { .. })
    }

    /// Return the buffer now. Same as dropping the handle.
    pub fn release(self) {}
}

impl Deref for PooledBuffer {
    type Target = NativeBuffer;

    fn deref(&self) -> &Self::Target {
        &self.buffer
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buffer
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        let buffer = std::mem::take(&mut self.buffer);
        match &self.owner {
            Owner::Pooled { class, generation } => class.release(buffer, *generation),
            Owner::Unpooled => {
                trace!("destroying unpooled buffer of size {}", buffer.capacity());
            }
        }
    }
}

impl std::fmt::Debug for PooledBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledBuffer")
            .field("buffer", &self.buffer)
            .field("pooled", &self.is_pooled())
            .finish()
    }
}

/// A buffer that is only taken from the pool the first time it is used.
///
/// Useful where a code path may or may not need scratch space.
pub struct LazyPooledBuffer {
    pool: ByteBufferPool,
    min_capacity: usize,
    buffer: Option<PooledBuffer>,
}

impl LazyPooledBuffer {
    pub(crate) fn new(pool: ByteBufferPool, min_capacity: usize) -> Self {
        Self {
            pool,
            min_capacity,
            buffer: None,
        }
    }

    pub fn is_acquired(&self) -> bool {
        self.buffer.is_some()
    }

    pub fn min_capacity(&self) -> usize {
        self.min_capacity
    }

    /// The buffer, acquiring it on first call.
    pub fn get(&mut self) -> &mut NativeBuffer {
        let (pool, min_capacity) = (&self.pool, self.min_capacity);
        self.buffer.get_or_insert_with(|| pool.acquire(min_capacity))
    }

    /// Give the buffer back if one was ever acquired.
    pub fn release(self) {}
}

/// Key and value buffers borrowed together.
///
/// The value buffer is returned before the key buffer.
pub struct PooledBufferPair {
    value: PooledBuffer,
    key: PooledBuffer,
}

impl PooledBufferPair {
    pub(crate) fn new(key: PooledBuffer, value: PooledBuffer) -> Self {
        Self { value, key }
    }

    pub fn key_buffer(&mut self) -> &mut NativeBuffer {
        &mut *self.key
    }

    pub fn value_buffer(&mut self) -> &mut NativeBuffer {
        &mut *self.value
    }

    /// Both buffers at once.
    pub fn split(&mut self) -> (&mut NativeBuffer, &mut NativeBuffer) {
        (&mut *self.key, &mut *self.value)
    }

    pub fn release(self) {}
}
