use log::{debug, warn};
use parking_lot::{Condvar, Mutex};

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use super::buffer::NativeBuffer;

struct IdleQueue {
    buffers: VecDeque<NativeBuffer>,
    // bumped by every clear; buffers lent out before that are not taken back
    generation: u64,
}

/// All pooled buffers of one capacity.
///
/// `live` counts buffers that exist for this class, idle or on loan, and is
/// only ever raised through [`SizeClass::try_reserve`], so it never exceeds
/// `max`. The idle queue holds at most `max` buffers.
pub(crate) struct SizeClass {
    capacity: usize,
    max: usize,
    warning_threshold: usize,
    live: AtomicUsize,
    idle: Mutex<IdleQueue>,
    released: Condvar,
}

impl SizeClass {
    pub(crate) fn new(capacity: usize, max: usize, warning_threshold_percentage: u32) -> Self {
        let warning_threshold = if max > 1 {
            let scaled = max as u128 * warning_threshold_percentage as u128;
            // percentage is at most 100, so the result is at most `max`
            usize::try_from(scaled.div_ceil(100)).unwrap_or(max)
        } else {
            0
        };
        Self {
            capacity,
            max,
            warning_threshold,
            live: AtomicUsize::new(0),
            idle: Mutex::new(IdleQueue {
                buffers: VecDeque::with_capacity(max.min(64)),
                generation: 0,
            }),
            released: Condvar::new(),
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn max(&self) -> usize {
        self.max
    }

    pub(crate) fn warning_threshold(&self) -> usize {
        self.warning_threshold
    }

    /// A class with room for at most one buffer is not worth pooling.
    pub(crate) fn is_pooled(&self) -> bool {
        self.max > 1
    }

    pub(crate) fn live(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    pub(crate) fn available(&self) -> usize {
        self.idle.lock().buffers.len()
    }

    /// Pop an idle buffer, or create one if the class has not reached its
    /// maximum. Returns the buffer with the generation it belongs to.
    pub(crate) fn take(&self) -> Option<(NativeBuffer, u64)> {
        let generation = {
            let mut idle = self.idle.lock();
            if let Some(buffer) = idle.buffers.pop_front() {
                return Some((buffer, idle.generation));
            }
            idle.generation
        };
        self.try_reserve()
            .then(|| (NativeBuffer::new(self.capacity), generation))
    }

    /// Like [`SizeClass::take`] but waits for a release when the class is
    /// exhausted. `None` only when `deadline` passes first.
    pub(crate) fn take_waiting(&self, deadline: Option<Instant>) -> Option<(NativeBuffer, u64)> {
        let mut idle = self.idle.lock();
        loop {
            if let Some(buffer) = idle.buffers.pop_front() {
                return Some((buffer, idle.generation));
            }
            // clear() or a discarded release may have freed room
            if self.try_reserve() {
                let generation = idle.generation;
                drop(idle);
                return Some((NativeBuffer::new(self.capacity), generation));
            }
            debug!(
                "buffer pool exhausted for capacity {}, waiting for a release",
                self.capacity
            );
            match deadline {
                Some(deadline) => {
                    if self.released.wait_until(&mut idle, deadline).timed_out() {
                        if let Some(buffer) = idle.buffers.pop_front() {
                            return Some((buffer, idle.generation));
                        }
                        if self.try_reserve() {
                            let generation = idle.generation;
                            drop(idle);
                            return Some((NativeBuffer::new(self.capacity), generation));
                        }
                        return None;
                    }
                }
                None => self.released.wait(&mut idle),
            }
        }
    }

    /// Raise the live count by one unless that would pass `max`.
    fn try_reserve(&self) -> bool {
        let mut current = self.live.load(Ordering::Acquire);
        loop {
            if current >= self.max {
                return false;
            }
            match self.live.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    self.on_created(current + 1);
                    return true;
                }
                Err(actual) => current = actual,
            }
        }
    }

    fn on_created(&self, live: usize) {
        if live == self.warning_threshold {
            warn!(
                "Hit {}% ({}) of the limit of {} for pooled buffers of size {}",
                live as u128 * 100 / self.max as u128,
                live,
                self.max,
                self.capacity
            );
        }
        if live == self.max {
            warn!(
                "Hit limit of {} for pooled buffers of size {}. \
                 Future calls to the pool will create new buffers or block until one is released",
                self.max, self.capacity
            );
        }
    }

    fn forget(&self, n: usize) {
        let mut current = self.live.load(Ordering::Acquire);
        loop {
            let next = current.saturating_sub(n);
            match self
                .live
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }

    /// Give a lent buffer back. It is destroyed instead of queued when the
    /// class was cleared while it was on loan, or when the queue is full.
    pub(crate) fn release(&self, buffer: NativeBuffer, generation: u64) {
        let mut idle = self.idle.lock();
        if generation != idle.generation {
            drop(idle);
            debug!(
                "destroying buffer of size {} lent out before the pool was cleared",
                self.capacity
            );
            self.forget(1);
            self.released.notify_one();
            return;
        }
        if idle.buffers.len() >= self.max {
            drop(idle);
            debug!(
                "idle queue for size {} is full, destroying the returned buffer",
                self.capacity
            );
            self.forget(1);
            return;
        }
        idle.buffers.push_back(buffer);
        drop(idle);
        self.released.notify_one();
    }

    /// Destroy every idle buffer. Returns how many were destroyed.
    pub(crate) fn drain(&self) -> usize {
        let drained = {
            let mut idle = self.idle.lock();
            idle.generation += 1;
            std::mem::take(&mut idle.buffers)
        };
        let n = drained.len();
        drop(drained);
        // buffers still on loan belong to the old generation and count
        // against `live` until they come back
        self.forget(n);
        self.released.notify_all();
        n
    }
}
