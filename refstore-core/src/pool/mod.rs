//! Size classed pool of scratch byte buffers.
//!
//! Buffers come in power of ten capacities, 1, 10, 100 and so on up to the
//! largest capacity in the config. Each size class caps how many buffers it
//! will ever create; a request is served from its own class, then from the
//! next larger class, and after that it either waits for a release or gets an
//! unpooled buffer that is destroyed when returned.
//!
//! ```
//! use refstore_core::{ByteBufferPool, ByteBufferPoolConfig};
//!
//! let pool = ByteBufferPool::new(&ByteBufferPoolConfig::default()).unwrap();
//! let len = pool.with_buffer(20, |buf| {
//!     assert_eq!(buf.capacity(), 100);
//!     buf.put_slice(b"scratch");
//!     buf.position()
//! });
//! assert_eq!(len, 7);
//! assert_eq!(pool.current_pool_size(), 1);
//! ```

use log::{debug, info, warn};
use serde::Serialize;

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::{ByteBufferPoolConfig, DEFAULT_MAX_BUFFERS_PER_CLASS};
use crate::Result;
use size_class::SizeClass;

mod buffer;
mod handle;
mod size_class;

pub use buffer::NativeBuffer;
pub use handle::{LazyPooledBuffer, PooledBuffer, PooledBufferPair};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Exhausted {
    Block,
    Allocate,
}

/// Thread safe and cheap to clone; clones share the same buffers.
#[derive(Clone)]
pub struct ByteBufferPool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    // classes[i] holds buffers of capacity 10^i
    classes: Vec<Arc<SizeClass>>,
    block_on_exhausted_pool: bool,
}

impl ByteBufferPool {
    pub fn new(config: &ByteBufferPoolConfig) -> Result<Self> {
        config.validate()?;
        for (capacity, count) in &config.pooled_byte_buffer_counts {
            if !is_power_of_ten(*capacity) {
                warn!(
                    "ignoring pooled buffer count {count} for size {capacity}, \
                     sizes must be a power of ten"
                );
            }
        }
        let largest = config
            .pooled_byte_buffer_counts
            .keys()
            .copied()
            .filter(|capacity| is_power_of_ten(*capacity))
            .max();

        let mut classes = vec![];
        if let Some(largest) = largest {
            let mut capacity = 1;
            loop {
                let max = config
                    .pooled_byte_buffer_counts
                    .get(&capacity)
                    .copied()
                    .unwrap_or(DEFAULT_MAX_BUFFERS_PER_CLASS);
                classes.push(Arc::new(SizeClass::new(
                    capacity,
                    max,
                    config.warning_threshold_percentage,
                )));
                if capacity >= largest {
                    break;
                }
                capacity *= 10;
            }
        }

        let summary = classes
            .iter()
            .map(|class| {
                format!(
                    "{}={} (warn at {})",
                    class.capacity(),
                    class.max(),
                    class.warning_threshold()
                )
            })
            .collect::<Vec<_>>()
            .join(", ");
        info!(
            "initialising byte buffer pool, configured counts: {:?}, effective counts: [{summary}], \
             block on exhausted pool: {}",
            config.pooled_byte_buffer_counts, config.block_on_exhausted_pool
        );

        Ok(Self {
            inner: Arc::new(PoolInner {
                classes,
                block_on_exhausted_pool: config.block_on_exhausted_pool,
            }),
        })
    }

    /// Borrow a buffer with capacity >= `min_capacity`, waiting or allocating
    /// an excess buffer when exhausted as configured.
    pub fn acquire(&self, min_capacity: usize) -> PooledBuffer {
        if self.inner.block_on_exhausted_pool {
            self.acquire_blocking(min_capacity)
        } else {
            self.acquire_non_blocking(min_capacity)
        }
    }

    /// Waits for a release when both the matching class and the next larger
    /// one are exhausted.
    pub fn acquire_blocking(&self, min_capacity: usize) -> PooledBuffer {
        self.acquire_with(min_capacity, Exhausted::Block)
    }

    /// Never waits; allocates an excess buffer outside the pool instead.
    pub fn acquire_non_blocking(&self, min_capacity: usize) -> PooledBuffer {
        self.acquire_with(min_capacity, Exhausted::Allocate)
    }

    /// Like [`ByteBufferPool::acquire_blocking`] but gives up after
    /// `timeout`, returning `None`.
    pub fn acquire_blocking_timeout(
        &self,
        min_capacity: usize,
        timeout: Duration,
    ) -> Option<PooledBuffer> {
        let deadline = Instant::now() + timeout;
        let capacity = class_capacity(min_capacity);
        let Some(index) = self.pooled_class(capacity, min_capacity) else {
            return Some(PooledBuffer::unpooled(min_capacity.max(1)));
        };
        if let Some(buffer) = self.take_from(index) {
            return Some(buffer);
        }
        let class = &self.inner.classes[index];
        class
            .take_waiting(Some(deadline))
            .map(|taken| lend(class, taken))
    }

    fn acquire_with(&self, min_capacity: usize, exhausted: Exhausted) -> PooledBuffer {
        let capacity = class_capacity(min_capacity);
        let Some(index) = self.pooled_class(capacity, min_capacity) else {
            return PooledBuffer::unpooled(min_capacity.max(1));
        };
        if let Some(buffer) = self.take_from(index) {
            return buffer;
        }
        let class = &self.inner.classes[index];
        if exhausted == Exhausted::Block {
            if let Some(taken) = class.take_waiting(None) {
                return lend(class, taken);
            }
        }
        debug!(
            "pool for size {capacity} is exhausted, allocating an excess buffer \
             that will be destroyed on release"
        );
        PooledBuffer::unpooled(capacity)
    }

    /// Index of the pooled class for `capacity`, or `None` (logged) when the
    /// request must be served outside the pool.
    fn pooled_class(&self, capacity: usize, min_capacity: usize) -> Option<usize> {
        match self.inner.classes.get(class_index(capacity)) {
            None => {
                warn!(
                    "no pooled buffers of size {capacity} are configured, allocating an \
                     unpooled buffer of {min_capacity} bytes"
                );
                None
            }
            Some(class) if !class.is_pooled() => {
                debug!("buffers of size {capacity} are not pooled, allocating {min_capacity} bytes");
                None
            }
            Some(_) => Some(class_index(capacity)),
        }
    }

    /// Try the class at `index`, then the next larger one only.
    fn take_from(&self, index: usize) -> Option<PooledBuffer> {
        self.inner.classes[index..]
            .iter()
            .take(2)
            .filter(|class| class.is_pooled())
            .find_map(|class| class.take().map(|taken| lend(class, taken)))
    }

    /// A buffer that is only borrowed once it is first used.
    pub fn lazy_buffer(&self, min_capacity: usize) -> LazyPooledBuffer {
        LazyPooledBuffer::new(self.clone(), min_capacity)
    }

    pub fn buffer_pair(&self, min_key_capacity: usize, min_value_capacity: usize) -> PooledBufferPair {
        let key = self.acquire(min_key_capacity);
        let value = self.acquire(min_value_capacity);
        PooledBufferPair::new(key, value)
    }

    /// Run `f` with a borrowed buffer; the buffer goes back to the pool when
    /// `f` returns or unwinds.
    pub fn with_buffer<T, F>(&self, min_capacity: usize, f: F) -> T
    where
        F: FnOnce(&mut NativeBuffer) -> T,
    {
        let mut buffer = self.acquire(min_capacity);
        f(&mut buffer)
    }

    pub fn with_buffer_pair<T, F>(&self, min_key_capacity: usize, min_value_capacity: usize, f: F) -> T
    where
        F: FnOnce(&mut NativeBuffer, &mut NativeBuffer) -> T,
    {
        let mut pair = self.buffer_pair(min_key_capacity, min_value_capacity);
        let (key, value) = pair.split();
        f(key, value)
    }

    /// Destroy every idle buffer. Buffers on loan keep working and are
    /// destroyed, rather than pooled, when they come back.
    pub fn clear(&self) {
        let cleared = self
            .inner
            .classes
            .iter()
            .filter(|class| class.is_pooled())
            .map(|class| (class.capacity(), class.drain()))
            .filter(|(_, n)| *n > 0)
            .map(|(capacity, n)| format!("{capacity}:{n}"))
            .collect::<Vec<_>>();
        info!(
            "cleared buffers from the pool (size:count) - {}",
            cleared.join(", ")
        );
    }

    /// Idle buffers across all classes.
    pub fn current_pool_size(&self) -> usize {
        self.inner.classes.iter().map(|class| class.available()).sum()
    }

    /// Buffers, idle or on loan, that exist for the class serving
    /// `capacity`.
    pub fn pooled_buffer_count(&self, capacity: usize) -> usize {
        self.class_for(capacity).map_or(0, |class| class.live())
    }

    /// Idle buffers in the class serving `capacity`.
    pub fn available_buffer_count(&self, capacity: usize) -> usize {
        self.class_for(capacity).map_or(0, |class| class.available())
    }

    fn class_for(&self, capacity: usize) -> Option<&SizeClass> {
        self.inner
            .classes
            .get(class_index(class_capacity(capacity)))
            .map(|class| class.as_ref())
    }

    pub fn info(&self) -> PoolInfo {
        let classes = self
            .inner
            .classes
            .iter()
            .map(|class| {
                let live = class.live();
                let available = class.available();
                SizeClassInfo {
                    capacity: class.capacity(),
                    configured_max: class.max(),
                    available,
                    live,
                    on_loan: live.saturating_sub(available),
                    total_bytes: live * class.capacity(),
                }
            })
            .collect::<Vec<_>>();
        PoolInfo {
            total_available: classes.iter().map(|c| c.available).sum(),
            total_bytes: classes.iter().map(|c| c.total_bytes).sum(),
            block_on_exhausted_pool: self.inner.block_on_exhausted_pool,
            classes,
        }
    }
}

/// Snapshot of the pool for diagnostics.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PoolInfo {
    pub total_available: usize,
    pub total_bytes: usize,
    pub block_on_exhausted_pool: bool,
    pub classes: Vec<SizeClassInfo>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SizeClassInfo {
    pub capacity: usize,
    pub configured_max: usize,
    pub available: usize,
    pub live: usize,
    pub on_loan: usize,
    pub total_bytes: usize,
}

fn lend(class: &Arc<SizeClass>, (buffer, generation): (NativeBuffer, u64)) -> PooledBuffer {
    PooledBuffer::pooled(buffer, Arc::clone(class), generation)
}

fn is_power_of_ten(mut n: usize) -> bool {
    if n == 0 {
        return false;
    }
    while n % 10 == 0 {
        n /= 10;
    }
    n == 1
}

/// Smallest power of ten >= `min_capacity`; a request for 0 bytes is served
/// like a request for 1.
fn class_capacity(min_capacity: usize) -> usize {
    let mut capacity = 1usize;
    while capacity < min_capacity {
        match capacity.checked_mul(10) {
            Some(next) => capacity = next,
            None => return min_capacity,
        }
    }
    capacity
}

fn class_index(capacity: usize) -> usize {
    capacity.ilog10() as usize
}
