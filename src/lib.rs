//! # ShardedMap
//!
//! A fixed-width, lock-sharded concurrent map.
//!
//! The key space is split across a fixed number of segments, each guarded by
//! its own read-write lock. Keyed operations lock only the segment that owns
//! the key, so unrelated keys are read and written concurrently. Whole-map
//! operations lock every segment in a fixed order and hold all of them, so
//! `len`, `clear`, `keys`, `for_each` and friends see one consistent state.
//!
//! ## Features
//!
//! - **Sharded**: keys route to a segment by `hash(key) % segment_count`
//! - **Compound atomics**: compare-and-swap `replace`, `compute_if_absent`,
//!   `compute_if_present`, `compute` and `merge` run under one segment lock
//! - **Consistent snapshots**: whole-map reads hold every segment lock
//! - **Zero-Copy Reads**: values stored as `Arc<V>`
//! - **Statistics**: per-segment loads, and operation counters with the
//!   `metrics` feature
//!
//! ## Example
//!
//! ```rust
//! use sharded_map::ShardedMap;
//!
//! let map = ShardedMap::new();
//!
//! map.put("a", 1);
//! map.put("b", 2);
//! map.put("c", 3);
//! assert_eq!(map.len(), 3);
//!
//! assert_eq!(*map.remove(&"b").unwrap(), 2);
//! assert!(map.get(&"b").is_none());
//!
//! // Compound updates run atomically under the key's segment lock.
//! map.merge("hits", 1, |_, n| Some(n + 1));
//! map.compute_if_absent("d", |_| Some(4));
//! assert!(map.replace(&"a", &1, 10));
//!
//! for (key, value) in map.iter_snapshot() {
//!     println!("{}: {}", key, *value);
//! }
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use sharded_map::{HashFunction, ShardedMapBuilder};
//!
//! let map = ShardedMapBuilder::new()
//!     .segment_count(12)?
//!     .hash_function(HashFunction::AHash)
//!     .build::<String, i32>()?;
//! assert_eq!(map.segment_count(), 12);
//! # Ok::<(), sharded_map::Error>(())
//! ```
//!
//! ## Callbacks
//!
//! Closures passed to the compute family, `merge`, `for_each` and
//! `replace_all` run while the calling thread holds segment locks. They must
//! not call back into the same map.

#![deny(missing_docs)]
#![warn(clippy::all)]

/// Configuration and builder types.
pub mod config;
/// Error types.
pub mod error;
/// Hash function implementations.
pub mod hash;
/// Iterator implementations.
pub mod iter;
mod lock;
mod segment;
/// Main ShardedMap implementation.
pub mod sharded_map;
/// Statistics and metrics collection.
pub mod stats;

// Re-export main types
pub use config::{Config, HashFunction, ShardedMapBuilder, DEFAULT_SEGMENT_COUNT};
pub use error::Error;
pub use iter::SnapshotIter;
pub use sharded_map::ShardedMap;
pub use stats::{Diagnostics, SegmentDiagnostics, SegmentOps, Stats};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_operations() {
        let map = ShardedMap::new();

        assert!(map.put("key1", "value1").is_none());
        assert_eq!(map.put("key1", "value2").unwrap().as_ref(), &"value1");

        assert_eq!(map.get(&"key1").unwrap().as_ref(), &"value2");
        assert!(map.get(&"nonexistent").is_none());

        assert_eq!(map.remove(&"key1").unwrap().as_ref(), &"value2");
        assert!(map.get(&"key1").is_none());
    }

    #[test]
    fn test_default_has_eight_segments() {
        let map: ShardedMap<u64, u64> = ShardedMap::default();
        assert_eq!(map.segment_count(), DEFAULT_SEGMENT_COUNT);
        assert_eq!(map.stats().segment_sizes.len(), 8);
    }

    #[test]
    fn test_merge_counter() {
        let map = ShardedMap::new();
        for _ in 0..3 {
            map.merge("count", 1, |_, cur| Some(cur + 1));
        }
        assert_eq!(*map.get(&"count").unwrap(), 3);
    }

    #[test]
    fn test_stats() {
        let map = ShardedMap::new();
        map.put("key1", "value1");
        map.put("key2", "value2");

        let stats = map.stats();
        assert_eq!(stats.size, 2);
    }

    #[test]
    fn test_builder() {
        let map = ShardedMapBuilder::new()
            .segment_count(8)
            .unwrap()
            .build::<String, i32>()
            .unwrap();

        map.put("test".to_string(), 42);
        assert_eq!(*map.get(&"test".to_string()).unwrap(), 42);
    }

    #[test]
    fn test_debug_lists_entries() {
        let map = ShardedMap::with_segments(1).unwrap();
        map.put("k", 1);
        assert_eq!(format!("{:?}", map), r#"{"k": 1}"#);
    }
}
