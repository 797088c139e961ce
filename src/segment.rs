use crate::stats::{Counter, SegmentStats};
use hashbrown::hash_map::Entry;
use hashbrown::HashMap;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::hash::Hash;
use std::sync::Arc;

/// The table a segment guards.
pub(crate) type Table<K, V> = HashMap<K, Arc<V>>;

/// A single segment containing a HashMap protected by a read-write lock.
///
/// Every method takes the lock itself and releases it before returning, so
/// each call is atomic with respect to every other call on the same segment.
/// Callers never hold a segment lock when calling into it.
pub(crate) struct Segment<K, V> {
    table: RwLock<Table<K, V>>,
    stats: SegmentStats,
}

impl<K, V> Segment<K, V>
where
    K: Hash + Eq + Send + Sync,
    V: Send + Sync,
{
    pub fn new(capacity: Option<usize>) -> Self {
        let table = match capacity {
            Some(capacity) => HashMap::with_capacity(capacity),
            None => HashMap::new(),
        };
        Self {
            table: RwLock::new(table),
            stats: SegmentStats::new(),
        }
    }

    /// Acquire the segment lock in shared mode.
    pub fn read(&self) -> RwLockReadGuard<'_, Table<K, V>> {
        #[cfg(feature = "lock-timing")]
        let started = std::time::Instant::now();
        let guard = self.table.read();
        #[cfg(feature = "lock-timing")]
        self.stats
            .record(Counter::LockWaitNanos, started.elapsed().as_nanos() as u64);
        self.stats.record(Counter::LockAcquisition, 1);
        guard
    }

    /// Acquire the segment lock in exclusive mode.
    pub fn write(&self) -> RwLockWriteGuard<'_, Table<K, V>> {
        #[cfg(feature = "lock-timing")]
        let started = std::time::Instant::now();
        let guard = self.table.write();
        #[cfg(feature = "lock-timing")]
        self.stats
            .record(Counter::LockWaitNanos, started.elapsed().as_nanos() as u64);
        self.stats.record(Counter::LockAcquisition, 1);
        guard
    }

    /// Counters for callers that mutate the table through a guard they hold.
    pub fn stats(&self) -> &SegmentStats {
        &self.stats
    }

    /// Get a value by key, returning an Arc to enable zero-copy access.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let table = self.read();
        let result = table.get(key).cloned();
        if result.is_some() {
            self.stats.record(Counter::Read, 1);
        }
        result
    }

    /// Check if a key exists without cloning the value.
    pub fn contains_key(&self, key: &K) -> bool {
        self.read().contains_key(key)
    }

    /// Insert or overwrite, returning the previous value if any.
    pub fn put(&self, key: K, value: V) -> Option<Arc<V>> {
        let mut table = self.write();
        self.stats.record(Counter::Write, 1);
        table.insert(key, Arc::new(value))
    }

    /// Insert only if the key is absent. Returns the value already present, if any.
    pub fn put_if_absent(&self, key: K, value: V) -> Option<Arc<V>> {
        let mut table = self.write();
        let entry = table.entry(key);
        match entry {
            Entry::Occupied(entry) => Some(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(value));
                self.stats.record(Counter::Write, 1);
                None
            }
        }
    }

    /// Overwrite only if the key is present. Returns the replaced value, if any.
    pub fn put_if_present(&self, key: K, value: V) -> Option<Arc<V>> {
        let mut table = self.write();
        let slot = table.get_mut(&key)?;
        self.stats.record(Counter::Write, 1);
        Some(std::mem::replace(slot, Arc::new(value)))
    }

    /// Compare-and-swap by value equality.
    pub fn replace(&self, key: &K, expected: &V, new_value: V) -> bool
    where
        V: PartialEq,
    {
        let mut table = self.write();
        match table.get_mut(key) {
            Some(slot) if **slot == *expected => {
                *slot = Arc::new(new_value);
                self.stats.record(Counter::Write, 1);
                true
            }
            _ => false,
        }
    }

    /// Remove a key-value pair, returning the value if it existed.
    pub fn remove(&self, key: &K) -> Option<Arc<V>> {
        let mut table = self.write();
        let result = table.remove(key);
        if result.is_some() {
            self.stats.record(Counter::Remove, 1);
        }
        result
    }

    /// Remove the entry only if its current value equals `expected`.
    pub fn remove_if_equals(&self, key: &K, expected: &V) -> bool
    where
        V: PartialEq,
    {
        let mut table = self.write();
        if !matches!(table.get(key), Some(current) if **current == *expected) {
            return false;
        }
        table.remove(key);
        self.stats.record(Counter::Remove, 1);
        true
    }

    /// Returns the resident value, or stores and returns `f(key)` when the key
    /// is absent. A `None` from `f` leaves the key absent.
    pub fn compute_if_absent<F>(&self, key: K, f: F) -> Option<Arc<V>>
    where
        F: FnOnce(&K) -> Option<V>,
    {
        let mut table = self.write();
        if let Some(existing) = table.get(&key) {
            return Some(Arc::clone(existing));
        }
        let value = Arc::new(f(&key)?);
        table.insert(key, Arc::clone(&value));
        self.stats.record(Counter::Write, 1);
        Some(value)
    }

    /// Recomputes a resident value. `None` from `f` removes the entry; an
    /// absent key is left untouched and `f` is not called.
    pub fn compute_if_present<F>(&self, key: &K, f: F) -> Option<Arc<V>>
    where
        F: FnOnce(&K) -> Option<V>,
    {
        let mut table = self.write();
        let slot = table.get_mut(key)?;
        match f(key) {
            Some(value) => {
                let value = Arc::new(value);
                *slot = Arc::clone(&value);
                self.stats.record(Counter::Write, 1);
                Some(value)
            }
            None => {
                table.remove(key);
                self.stats.record(Counter::Remove, 1);
                None
            }
        }
    }

    /// Always calls `f`. `None` removes any resident entry.
    pub fn compute<F>(&self, key: K, f: F) -> Option<Arc<V>>
    where
        F: FnOnce(&K) -> Option<V>,
    {
        let mut table = self.write();
        match f(&key) {
            Some(value) => {
                let value = Arc::new(value);
                table.insert(key, Arc::clone(&value));
                self.stats.record(Counter::Write, 1);
                Some(value)
            }
            None => {
                if table.remove(&key).is_some() {
                    self.stats.record(Counter::Remove, 1);
                }
                None
            }
        }
    }

    /// Stores `default` for an absent key, otherwise stores `remap(key, current)`.
    /// `None` from `remap` removes the entry.
    pub fn merge<F>(&self, key: K, default: V, remap: F) -> Option<Arc<V>>
    where
        F: FnOnce(&K, &V) -> Option<V>,
    {
        let mut table = self.write();
        let entry = table.entry(key);
        match entry {
            Entry::Vacant(entry) => {
                let value = Arc::new(default);
                entry.insert(Arc::clone(&value));
                self.stats.record(Counter::Write, 1);
                Some(value)
            }
            Entry::Occupied(mut entry) => match remap(entry.key(), entry.get().as_ref()) {
                Some(value) => {
                    let value = Arc::new(value);
                    entry.insert(Arc::clone(&value));
                    self.stats.record(Counter::Write, 1);
                    Some(value)
                }
                None => {
                    entry.remove();
                    self.stats.record(Counter::Remove, 1);
                    None
                }
            },
        }
    }
}
