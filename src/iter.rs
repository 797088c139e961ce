use crate::lock::SharedLockSet;
use std::hash::Hash;
use std::sync::Arc;

/// Snapshot-based iterator over the entries of a map.
///
/// The entries are copied out while every segment is read-locked, so the
/// iterator reflects a single point in time across all segments and never
/// sees modifications made after it was created. Order is unspecified.
pub struct SnapshotIter<K, V> {
    entries: std::vec::IntoIter<(K, Arc<V>)>,
}

impl<K, V> SnapshotIter<K, V>
where
    K: Hash + Eq + Send + Sync + Clone,
    V: Send + Sync,
{
    pub(crate) fn new(locks: &SharedLockSet<'_, K, V>) -> Self {
        Self::from_entries(collect_entries(locks))
    }
}

impl<K, V> SnapshotIter<K, V> {
    pub(crate) fn from_entries(entries: Vec<(K, Arc<V>)>) -> Self {
        Self {
            entries: entries.into_iter(),
        }
    }
}

impl<K, V> Iterator for SnapshotIter<K, V> {
    type Item = (K, Arc<V>);

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl<K, V> ExactSizeIterator for SnapshotIter<K, V> {}

/// Concatenate every locked table into one vector of entries.
pub(crate) fn collect_entries<K, V>(locks: &SharedLockSet<'_, K, V>) -> Vec<(K, Arc<V>)>
where
    K: Hash + Eq + Send + Sync + Clone,
    V: Send + Sync,
{
    let mut entries = Vec::with_capacity(locks.total_len());
    for table in locks.tables() {
        for (key, value) in table.iter() {
            entries.push((key.clone(), Arc::clone(value)));
        }
    }
    entries
}
