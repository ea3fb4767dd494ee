#[macro_use]
mod errors;
mod config;

mod comparator;
mod key_range;
mod cursor;
mod cancel;

mod memtable;
mod range;

mod pool;

pub use errors::{Error, Result};
pub use config::{
    ByteBufferPoolConfig, DEFAULT_MAX_BUFFERS_PER_CLASS, DEFAULT_WARNING_THRESHOLD_PERCENTAGE,
};
pub use comparator::{compare, has_prefix, prefix_successor, Comparator, UnsignedBytesComparator};
pub use key_range::{KeyRange, KeyRangeBuilder, RangeKind};
pub use cursor::{Cursor, CursorSource};
pub use cancel::Cancellation;
pub use memtable::{Memtable, MemtableCursor};
pub use range::{
    collect_entries, count_entries, exists, find_first, for_each_entry, log_contents,
    stream_entries, Entry, MappedStream, OwnedEntry, RangeIterator, RangeStream,
};
pub use pool::{
    ByteBufferPool, LazyPooledBuffer, NativeBuffer, PoolInfo, PooledBuffer, PooledBufferPair,
    SizeClassInfo,
};
