use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Count used for any size class that is not listed in the config.
pub const DEFAULT_MAX_BUFFERS_PER_CLASS: usize = 50;
pub const DEFAULT_WARNING_THRESHOLD_PERCENTAGE: u32 = 90;

/// Settings for [`crate::ByteBufferPool`].
///
/// `pooled_byte_buffer_counts` maps a buffer capacity (a power of ten) to the
/// maximum number of buffers of that capacity the pool will manage. A count of
/// 0 or 1 means buffers of that size are never pooled.
///
/// ```json
/// {
///     "pooled_byte_buffer_counts": { "1": 50, "10": 50, "100": 20, "1000": 0 },
///     "warning_threshold_percentage": 90,
///     "block_on_exhausted_pool": false
/// }
/// ```
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct ByteBufferPoolConfig {
    pub pooled_byte_buffer_counts: BTreeMap<usize, usize>,
    pub warning_threshold_percentage: u32,
    pub block_on_exhausted_pool: bool,
}

impl Default for ByteBufferPoolConfig {
    fn default() -> Self {
        let pooled_byte_buffer_counts = [
            (1, 50),
            (10, 50),
            (100, 50),
            (1_000, 50),
            (10_000, 50),
            (100_000, 10),
            (1_000_000, 3),
        ]
        .into_iter()
        .collect();
        Self {
            pooled_byte_buffer_counts,
            warning_threshold_percentage: DEFAULT_WARNING_THRESHOLD_PERCENTAGE,
            block_on_exhausted_pool: false,
        }
    }
}

impl ByteBufferPoolConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let buf = map_io_res!(std::fs::read(path.as_ref()))?;
        Self::from_json(&buf)
    }

    pub fn from_json(buf: &[u8]) -> Result<Self> {
        let config: ByteBufferPoolConfig = serde_json::from_slice(buf)
            .map_err(|e| Error::Config(format!("cannot deserialize ByteBufferPoolConfig: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_counts(counts: impl IntoIterator<Item = (usize, usize)>) -> Self {
        Self {
            pooled_byte_buffer_counts: counts.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn warning_threshold_percentage(mut self, percentage: u32) -> Self {
        self.warning_threshold_percentage = percentage;
        self
    }

    pub fn block_on_exhausted_pool(mut self, block: bool) -> Self {
        self.block_on_exhausted_pool = block;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.warning_threshold_percentage > 100 {
            return Err(Error::Config(format!(
                "warning_threshold_percentage must be <= 100, got {}",
                self.warning_threshold_percentage
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_partial_json() {
        let json = br#"{ "pooled_byte_buffer_counts": { "10": 5, "1000": 0 } }"#;
        let config = ByteBufferPoolConfig::from_json(json).unwrap();
        assert_eq!(config.pooled_byte_buffer_counts.get(&10), Some(&5));
        assert_eq!(config.pooled_byte_buffer_counts.get(&1000), Some(&0));
        assert_eq!(
            config.warning_threshold_percentage,
            DEFAULT_WARNING_THRESHOLD_PERCENTAGE
        );
        assert!(!config.block_on_exhausted_pool);
    }

    #[test]
    fn reject_bad_threshold() {
        let json = br#"{ "warning_threshold_percentage": 150 }"#;
        assert!(matches!(
            ByteBufferPoolConfig::from_json(json),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn reject_malformed_json() {
        assert!(ByteBufferPoolConfig::from_json(b"{ not json").is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        let res = ByteBufferPoolConfig::from_file("./no-such-dir/pool.json");
        assert!(matches!(res, Err(Error::IO(_))));
    }
}
