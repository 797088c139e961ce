use crate::error::Error;
use crate::hash::KeyHasher;

/// Number of segments used when none is configured.
pub const DEFAULT_SEGMENT_COUNT: usize = 8;

/// Which hash function to use for segment assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashFunction {
    /// Use ahash (default, fast and well-distributed).
    #[default]
    AHash,
    /// Use fxhash (faster but potentially less distributed).
    #[cfg(feature = "fxhash")]
    FxHash,
}

/// Configuration for a ShardedMap instance.
#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) segment_count: usize,
    pub(crate) hash_function: HashFunction,
    pub(crate) capacity_per_segment: Option<usize>,
}

impl Config {
    /// Create a new config with defaults (8 segments, ahash).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of segments. Must be greater than 0 and fit in a `u32`.
    ///
    /// Unlike power-of-two sharded maps, any positive count is accepted: keys
    /// are routed with `hash % segment_count`.
    pub fn segment_count(mut self, count: usize) -> Result<Self, Error> {
        validate_segment_count(count)?;
        self.segment_count = count;
        Ok(self)
    }

    /// Set the hash function to use.
    pub fn hash_function(mut self, hash_fn: HashFunction) -> Self {
        self.hash_function = hash_fn;
        self
    }

    /// Set initial capacity per segment. Omitted by default (HashMap default).
    pub fn capacity_per_segment(mut self, capacity: usize) -> Self {
        self.capacity_per_segment = Some(capacity);
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            segment_count: DEFAULT_SEGMENT_COUNT,
            hash_function: HashFunction::AHash,
            capacity_per_segment: None,
        }
    }
}

/// Builder for creating a ShardedMap with custom configuration.
#[derive(Debug, Default)]
pub struct ShardedMapBuilder {
    config: Config,
}

impl ShardedMapBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Set the number of segments. Must be greater than 0 and fit in a `u32`.
    pub fn segment_count(mut self, count: usize) -> Result<Self, Error> {
        self.config = self.config.segment_count(count)?;
        Ok(self)
    }

    /// Set the hash function to use.
    pub fn hash_function(mut self, hash_fn: HashFunction) -> Self {
        self.config = self.config.hash_function(hash_fn);
        self
    }

    /// Set initial capacity per segment.
    pub fn capacity_per_segment(mut self, capacity: usize) -> Self {
        self.config = self.config.capacity_per_segment(capacity);
        self
    }

    /// Build a ShardedMap with the configured settings.
    pub fn build<K, V>(self) -> Result<crate::ShardedMap<K, V>, Error>
    where
        K: std::hash::Hash + Eq + Send + Sync,
        V: Send + Sync,
    {
        crate::ShardedMap::with_config(self.config)
    }
}

pub(crate) fn validate_segment_count(count: usize) -> Result<(), Error> {
    if count == 0 || count > u32::MAX as usize {
        return Err(Error::InvalidSegmentCount);
    }
    Ok(())
}

/// Create a hash function instance based on the configuration.
pub(crate) fn create_hasher(hash_fn: HashFunction) -> KeyHasher {
    match hash_fn {
        HashFunction::AHash => KeyHasher::AHash,
        #[cfg(feature = "fxhash")]
        HashFunction::FxHash => KeyHasher::FxHash,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::new();
        assert_eq!(config.segment_count, 8);
        assert_eq!(config.hash_function, HashFunction::AHash);
        assert!(config.capacity_per_segment.is_none());
    }

    #[test]
    fn test_non_power_of_two_is_accepted() {
        let config = Config::new().segment_count(7).unwrap();
        assert_eq!(config.segment_count, 7);
    }

    #[test]
    fn test_zero_segments_rejected() {
        assert_eq!(
            Config::new().segment_count(0).unwrap_err(),
            Error::InvalidSegmentCount
        );
        assert!(ShardedMapBuilder::new().segment_count(0).is_err());
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_oversized_segment_count_rejected() {
        assert!(Config::new().segment_count(u32::MAX as usize + 1).is_err());
    }
}
