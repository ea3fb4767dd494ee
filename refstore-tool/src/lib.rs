use log::info;
use refstore_core::{
    collect_entries, ByteBufferPool, ByteBufferPoolConfig, Cancellation, Error, KeyRange,
    Memtable, OwnedEntry, PoolInfo, Result,
};
use serde_json::{Map, Value};
use std::path::Path;

/// How to turn the key strings of a dump, and the bounds given on the
/// command line, into bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyEncoding {
    Utf8,
    Hex,
}

impl KeyEncoding {
    pub fn decode(self, s: &str) -> Result<Vec<u8>> {
        match self {
            KeyEncoding::Utf8 => Ok(s.as_bytes().to_vec()),
            KeyEncoding::Hex => {
                hex::decode(s).map_err(|e| Error::Config(format!("invalid hex key {s:?}: {e}")))
            }
        }
    }

    pub fn encode(self, bytes: &[u8]) -> String {
        match self {
            KeyEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            KeyEncoding::Hex => hex::encode(bytes),
        }
    }
}

/// Load a JSON object of key to string value into a memtable.
pub fn load_dump(path: impl AsRef<Path>, encoding: KeyEncoding) -> Result<Memtable> {
    let buf = std::fs::read(path.as_ref())?;
    parse_dump(&buf, encoding)
}

pub fn parse_dump(buf: &[u8], encoding: KeyEncoding) -> Result<Memtable> {
    let entries: Map<String, Value> = serde_json::from_slice(buf)
        .map_err(|e| Error::Config(format!("cannot parse dump: {e}")))?;
    let mut memtable = Memtable::new();
    for (key, value) in entries {
        let value = match value {
            Value::String(s) => s,
            other => other.to_string(),
        };
        memtable.put(&encoding.decode(&key)?, value.as_bytes());
    }
    info!("loaded {} entries", memtable.len());
    Ok(memtable)
}

/// Range selection as given on the command line.
#[derive(Clone, Debug, Default)]
pub struct RangeArgs {
    pub prefix: Option<String>,
    pub start: Option<String>,
    pub stop: Option<String>,
    pub exclude_start: bool,
    pub exclude_stop: bool,
    pub reverse: bool,
}

pub fn build_range(args: &RangeArgs, encoding: KeyEncoding) -> Result<KeyRange> {
    let mut builder = KeyRange::builder();
    if let Some(prefix) = &args.prefix {
        builder = builder.prefix(encoding.decode(prefix)?);
    }
    if let Some(start) = &args.start {
        builder = builder.start_with(encoding.decode(start)?, !args.exclude_start);
    }
    if let Some(stop) = &args.stop {
        builder = builder.stop_with(encoding.decode(stop)?, !args.exclude_stop);
    }
    if args.reverse {
        builder = builder.reverse();
    }
    builder.build()
}

/// At most `limit` entries of `range`, in range order.
pub fn scan(memtable: &Memtable, range: KeyRange, limit: Option<usize>) -> Result<Vec<OwnedEntry>> {
    let mut entries = collect_entries(memtable, range, &Cancellation::never())?;
    if let Some(limit) = limit {
        entries.truncate(limit);
    }
    Ok(entries)
}

pub fn entry_json(entry: &OwnedEntry, encoding: KeyEncoding) -> Value {
    serde_json::json!({
        "key": encoding.encode(&entry.key),
        "value": String::from_utf8_lossy(&entry.val),
    })
}

/// Build a pool from `config` (defaults when absent), exercise one buffer
/// per requested size and report the resulting state.
pub fn pool_info(config: Option<&Path>, sizes: &[usize]) -> Result<PoolInfo> {
    let config = match config {
        Some(path) => ByteBufferPoolConfig::from_file(path)?,
        None => ByteBufferPoolConfig::default(),
    };
    let pool = ByteBufferPool::new(&config)?;
    let held = sizes.iter().map(|n| pool.acquire(*n)).collect::<Vec<_>>();
    let info = pool.info();
    drop(held);
    Ok(info)
}

pub fn to_pretty_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| Error::Internal(format!("cannot serialize output: {e}")))
}
