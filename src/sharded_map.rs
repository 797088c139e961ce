use crate::config::{create_hasher, validate_segment_count, Config};
use crate::error::Error;
use crate::hash::HashRouter;
use crate::iter::{collect_entries, SnapshotIter};
use crate::lock::{ExclusiveLockSet, SharedLockSet};
use crate::segment::Segment;
use crate::stats::{Counter, Diagnostics, SegmentDiagnostics, SegmentOps, Stats};
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Source of map identities. Two-map operations lock the lower id first.
static NEXT_MAP_ID: AtomicU64 = AtomicU64::new(0);

/// Concurrent map split into a fixed number of lock-guarded segments.
///
/// Every keyed operation is routed to exactly one segment by
/// `hash(key) % segment_count` and runs under that segment's lock alone, so
/// keys living in different segments never block each other. Whole-map
/// operations (`len`, `clear`, `keys`, `for_each`, ...) lock every segment in
/// ascending order and hold the whole set until they finish, which gives them
/// a consistent view across segments.
///
/// Values are stored as `Arc<V>` and handed out without copying.
///
/// # Example
///
/// ```rust
/// use sharded_map::ShardedMap;
///
/// let map = ShardedMap::new();
/// map.put("a", 1);
/// map.put("b", 2);
///
/// assert_eq!(*map.get(&"b").unwrap(), 2);
/// assert_eq!(map.len(), 2);
/// ```
pub struct ShardedMap<K, V> {
    id: u64,
    segments: Vec<Segment<K, V>>,
    router: HashRouter,
}

impl<K, V> ShardedMap<K, V>
where
    K: Hash + Eq + Send + Sync,
    V: Send + Sync,
{
    /// Create a new map with defaults (8 segments, ahash).
    pub fn new() -> Self {
        Self::build(Config::default())
    }

    /// Create a new map with `count` segments and the default hash function.
    pub fn with_segments(count: usize) -> Result<Self, Error> {
        Self::with_config(Config::new().segment_count(count)?)
    }

    /// Create a new map with custom config.
    pub fn with_config(config: Config) -> Result<Self, Error> {
        validate_segment_count(config.segment_count)?;
        Ok(Self::build(config))
    }

    fn build(config: Config) -> Self {
        let id = NEXT_MAP_ID.fetch_add(1, Ordering::Relaxed);
        let segments = (0..config.segment_count)
            .map(|_| Segment::new(config.capacity_per_segment))
            .collect();
        let router = HashRouter::new(
            create_hasher(config.hash_function),
            config.segment_count as u32,
        );

        log::debug!(
            "created sharded map #{} with {} segments ({:?})",
            id,
            config.segment_count,
            config.hash_function
        );

        Self {
            id,
            segments,
            router,
        }
    }

    #[inline]
    fn segment(&self, key: &K) -> &Segment<K, V> {
        &self.segments[self.router.route(key)]
    }

    /// Number of segments, fixed at construction.
    pub fn segment_count(&self) -> usize {
        self.router.segment_count()
    }

    /// Index of the segment that owns `key`.
    pub fn segment_of(&self, key: &K) -> usize {
        self.router.route(key)
    }

    /// Get a value by key. Returns an `Arc<V>` so you can share it without copying.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        self.segment(key).get(key)
    }

    /// Get a value by key, or `default` if the key is absent.
    ///
    /// ```rust
    /// use sharded_map::ShardedMap;
    ///
    /// let map = ShardedMap::new();
    /// map.put("present", 1);
    /// assert_eq!(*map.get_or_default(&"present", 0), 1);
    /// assert_eq!(*map.get_or_default(&"missing", 0), 0);
    /// ```
    pub fn get_or_default(&self, key: &K, default: V) -> Arc<V> {
        self.get(key).unwrap_or_else(|| Arc::new(default))
    }

    /// Check whether the key is present.
    pub fn contains_key(&self, key: &K) -> bool {
        self.segment(key).contains_key(key)
    }

    /// Insert or overwrite. Returns the old value if the key existed.
    pub fn put(&self, key: K, value: V) -> Option<Arc<V>> {
        self.segment(&key).put(key, value)
    }

    /// Insert only if the key is absent.
    ///
    /// Returns the value already present (leaving it untouched), or `None`
    /// if `value` was stored.
    ///
    /// ```rust
    /// use sharded_map::ShardedMap;
    ///
    /// let map = ShardedMap::new();
    /// assert!(map.put_if_absent("x", 10).is_none());
    /// assert_eq!(*map.put_if_absent("x", 20).unwrap(), 10);
    /// assert_eq!(*map.get(&"x").unwrap(), 10);
    /// ```
    pub fn put_if_absent(&self, key: K, value: V) -> Option<Arc<V>> {
        self.segment(&key).put_if_absent(key, value)
    }

    /// Overwrite only if the key is present. Returns the replaced value.
    pub fn put_if_present(&self, key: K, value: V) -> Option<Arc<V>> {
        self.segment(&key).put_if_present(key, value)
    }

    /// Replace the value of `key` with `new_value` only if it currently equals
    /// `expected`. A mismatch leaves the map unchanged and returns `false`.
    pub fn replace(&self, key: &K, expected: &V, new_value: V) -> bool
    where
        V: PartialEq,
    {
        self.segment(key).replace(key, expected, new_value)
    }

    /// Remove a key-value pair, returning the value if it existed.
    pub fn remove(&self, key: &K) -> Option<Arc<V>> {
        self.segment(key).remove(key)
    }

    /// Remove `key` only if its value currently equals `expected`.
    pub fn remove_if_equals(&self, key: &K, expected: &V) -> bool
    where
        V: PartialEq,
    {
        self.segment(key).remove_if_equals(key, expected)
    }

    /// If `key` is absent, store `f(key)` unless it returns `None`.
    ///
    /// `f` is never called when the key already has a value. Returns the
    /// value mapped to `key` afterwards.
    ///
    /// `f` runs while the key's segment is write-locked and must not call
    /// back into this map.
    pub fn compute_if_absent<F>(&self, key: K, f: F) -> Option<Arc<V>>
    where
        F: FnOnce(&K) -> Option<V>,
    {
        self.segment(&key).compute_if_absent(key, f)
    }

    /// If `key` is present, replace its value with `f(key)`, or remove the
    /// entry when `f` returns `None`. Does nothing for an absent key.
    ///
    /// `f` runs under the segment's write lock and must not re-enter the map.
    pub fn compute_if_present<F>(&self, key: &K, f: F) -> Option<Arc<V>>
    where
        F: FnOnce(&K) -> Option<V>,
    {
        self.segment(key).compute_if_present(key, f)
    }

    /// Call `f(key)` exactly once and store the result, or remove the entry
    /// when it returns `None`.
    ///
    /// `f` runs under the segment's write lock and must not re-enter the map.
    pub fn compute<F>(&self, key: K, f: F) -> Option<Arc<V>>
    where
        F: FnOnce(&K) -> Option<V>,
    {
        self.segment(&key).compute(key, f)
    }

    /// Store `default` if `key` is absent, otherwise store
    /// `remap(key, current)`; a `None` from `remap` removes the entry.
    ///
    /// `remap` runs under the segment's write lock and must not re-enter the map.
    ///
    /// ```rust
    /// use sharded_map::ShardedMap;
    ///
    /// let map = ShardedMap::new();
    /// for _ in 0..3 {
    ///     map.merge("count", 1, |_, cur| Some(cur + 1));
    /// }
    /// assert_eq!(*map.get(&"count").unwrap(), 3);
    /// ```
    pub fn merge<F>(&self, key: K, default: V, remap: F) -> Option<Arc<V>>
    where
        F: FnOnce(&K, &V) -> Option<V>,
    {
        self.segment(&key).merge(key, default, remap)
    }

    /// Total number of entries, counted under a read lock on every segment.
    pub fn len(&self) -> usize {
        SharedLockSet::acquire(&self.segments).total_len()
    }

    /// Check if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check whether any entry holds a value equal to `value`.
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        let locks = SharedLockSet::acquire(&self.segments);
        let found = locks
            .tables()
            .any(|table| table.values().any(|stored| **stored == *value));
        found
    }

    /// Remove every entry.
    pub fn clear(&self) {
        let mut locks = ExclusiveLockSet::acquire(&self.segments);
        let mut removed = 0;
        for (segment, table) in locks.iter_mut() {
            let count = table.len();
            table.clear();
            segment.stats().record(Counter::Remove, count as u64);
            removed += count;
        }
        drop(locks);

        log::debug!("cleared {} entries from sharded map #{}", removed, self.id);
    }

    /// All keys, copied out under one snapshot. Order is unspecified.
    pub fn keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        let locks = SharedLockSet::acquire(&self.segments);
        let mut keys = Vec::with_capacity(locks.total_len());
        for table in locks.tables() {
            keys.extend(table.keys().cloned());
        }
        keys
    }

    /// All values, copied out under one snapshot. Order is unspecified.
    pub fn values(&self) -> Vec<Arc<V>> {
        let locks = SharedLockSet::acquire(&self.segments);
        let mut values = Vec::with_capacity(locks.total_len());
        for table in locks.tables() {
            values.extend(table.values().cloned());
        }
        values
    }

    /// All key-value pairs, copied out under one snapshot. Order is unspecified.
    pub fn entries(&self) -> Vec<(K, Arc<V>)>
    where
        K: Clone,
    {
        collect_entries(&SharedLockSet::acquire(&self.segments))
    }

    /// Create a snapshot-based iterator over all key-value pairs.
    ///
    /// The snapshot is taken with every segment read-locked, so it reflects a
    /// single point in time. Later modifications are not visible.
    ///
    /// ```rust
    /// use sharded_map::ShardedMap;
    ///
    /// let map = ShardedMap::new();
    /// map.put("key1", "value1");
    /// map.put("key2", "value2");
    ///
    /// let mut count = 0;
    /// for (_key, _value) in map.iter_snapshot() {
    ///     count += 1;
    /// }
    /// assert_eq!(count, 2);
    /// ```
    pub fn iter_snapshot(&self) -> SnapshotIter<K, V>
    where
        K: Clone,
    {
        SnapshotIter::new(&SharedLockSet::acquire(&self.segments))
    }

    /// Call `action` once per entry while every segment is read-locked.
    ///
    /// `action` must not write to this map.
    pub fn for_each<F>(&self, mut action: F)
    where
        F: FnMut(&K, &V),
    {
        let locks = SharedLockSet::acquire(&self.segments);
        for table in locks.tables() {
            for (key, value) in table.iter() {
                action(key, value);
            }
        }
    }

    /// Replace every value with `function(key, value)` while every segment is
    /// write-locked.
    ///
    /// `function` must not call back into this map.
    pub fn replace_all<F>(&self, mut function: F)
    where
        F: FnMut(&K, &V) -> V,
    {
        let mut locks = ExclusiveLockSet::acquire(&self.segments);
        for (segment, table) in locks.iter_mut() {
            for (key, value) in table.iter_mut() {
                let new_value = function(key, &**value);
                *value = Arc::new(new_value);
                segment.stats().record(Counter::Write, 1);
            }
        }
    }

    /// Copy every entry of `source` into this map, overwriting existing keys.
    ///
    /// Entries are routed by this map's segment count and written into this
    /// map's segments. This map is write-locked and `source` read-locked for
    /// the whole copy; of the two maps, the one created first is always locked
    /// first, so concurrent copies in opposite directions cannot deadlock.
    /// Copying a map into itself does nothing.
    ///
    /// ```rust
    /// use sharded_map::ShardedMap;
    ///
    /// let source = ShardedMap::with_segments(3).unwrap();
    /// source.put("a", 1);
    /// source.put("b", 2);
    ///
    /// let dest = ShardedMap::new();
    /// dest.put("a", 0);
    /// dest.put_all(&source);
    ///
    /// assert_eq!(dest.len(), 2);
    /// assert_eq!(*dest.get(&"a").unwrap(), 1);
    /// ```
    pub fn put_all(&self, source: &ShardedMap<K, V>)
    where
        K: Clone,
    {
        if self.id == source.id {
            log::warn!("ignoring put_all of sharded map #{} into itself", self.id);
            return;
        }

        let (mut dest, src) = if self.id < source.id {
            let dest = ExclusiveLockSet::acquire(&self.segments);
            let src = SharedLockSet::acquire(&source.segments);
            (dest, src)
        } else {
            let src = SharedLockSet::acquire(&source.segments);
            let dest = ExclusiveLockSet::acquire(&self.segments);
            (dest, src)
        };

        let mut copied = 0usize;
        for table in src.tables() {
            for (key, value) in table.iter() {
                let (segment, target) = dest.get_mut(self.router.route(key));
                target.insert(key.clone(), Arc::clone(value));
                segment.stats().record(Counter::Write, 1);
                copied += 1;
            }
        }

        log::trace!(
            "copied {} entries from sharded map #{} into #{}",
            copied,
            source.id,
            self.id
        );
    }

    /// Number of entries in each segment, taken under one snapshot.
    pub fn segment_loads(&self) -> Vec<usize> {
        let locks = SharedLockSet::acquire(&self.segments);
        let loads = locks.tables().map(|table| table.len()).collect();
        loads
    }

    /// Get statistics about the map and its segments.
    ///
    /// Segment sizes come from one snapshot; operation counters are read
    /// alongside and are all zero unless the `metrics` feature is enabled.
    pub fn stats(&self) -> Stats {
        let segment_sizes = self.segment_loads();
        let operations: Vec<SegmentOps> = self
            .segments
            .iter()
            .map(|s| s.stats().snapshot())
            .collect();
        let size = segment_sizes.iter().sum();

        Stats {
            size,
            segment_sizes,
            operations,
        }
    }

    /// Structured per-segment load and operation report.
    pub fn diagnostics(&self) -> Diagnostics {
        let segments = self
            .segment_loads()
            .into_iter()
            .zip(&self.segments)
            .map(|(entries, segment)| SegmentDiagnostics {
                entries,
                ops: segment.stats().snapshot(),
            })
            .collect();
        Diagnostics::from_segments(segments)
    }
}

impl<K, V> Default for ShardedMap<K, V>
where
    K: Hash + Eq + Send + Sync,
    V: Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for ShardedMap<K, V>
where
    K: Hash + Eq + Send + Sync + fmt::Debug,
    V: Send + Sync + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let locks = SharedLockSet::acquire(&self.segments);
        let mut d_map = f.debug_map();
        for table in locks.tables() {
            d_map.entries(table.iter());
        }
        d_map.finish()
    }
}
