//! Lock sets held by whole-map operations.
//!
//! A lock set takes every segment lock in ascending segment order and keeps
//! all of them until it is dropped. Every whole-map operation goes through
//! these types, so two whole-map operations on the same map always contend in
//! the same order and cannot wait on each other in a cycle.

use crate::segment::{Segment, Table};
use parking_lot::{RwLockReadGuard, RwLockWriteGuard};
use std::hash::Hash;

/// Shared locks on all segments of one map.
pub(crate) struct SharedLockSet<'a, K, V> {
    guards: Vec<RwLockReadGuard<'a, Table<K, V>>>,
}

impl<'a, K, V> SharedLockSet<'a, K, V>
where
    K: Hash + Eq + Send + Sync,
    V: Send + Sync,
{
    pub fn acquire(segments: &'a [Segment<K, V>]) -> Self {
        let mut guards = Vec::with_capacity(segments.len());
        for segment in segments {
            guards.push(segment.read());
        }
        Self { guards }
    }

    /// Tables in segment order.
    pub fn tables(&self) -> impl Iterator<Item = &Table<K, V>> + '_ {
        self.guards.iter().map(|guard| &**guard)
    }

    pub fn total_len(&self) -> usize {
        self.tables().map(|table| table.len()).sum()
    }
}

/// Exclusive locks on all segments of one map.
pub(crate) struct ExclusiveLockSet<'a, K, V> {
    segments: &'a [Segment<K, V>],
    guards: Vec<RwLockWriteGuard<'a, Table<K, V>>>,
}

impl<'a, K, V> ExclusiveLockSet<'a, K, V>
where
    K: Hash + Eq + Send + Sync,
    V: Send + Sync,
{
    pub fn acquire(segments: &'a [Segment<K, V>]) -> Self {
        let mut guards = Vec::with_capacity(segments.len());
        for segment in segments {
            guards.push(segment.write());
        }
        Self { segments, guards }
    }

    /// Each segment paired with its locked table, in segment order.
    pub fn iter_mut(
        &mut self,
    ) -> impl Iterator<Item = (&'a Segment<K, V>, &mut Table<K, V>)> + '_ {
        let segments: &'a [Segment<K, V>] = self.segments;
        segments
            .iter()
            .zip(self.guards.iter_mut().map(|guard| &mut **guard))
    }

    /// The locked table of one segment.
    pub fn get_mut(&mut self, index: usize) -> (&'a Segment<K, V>, &mut Table<K, V>) {
        let segments: &'a [Segment<K, V>] = self.segments;
        (&segments[index], &mut *self.guards[index])
    }
}
