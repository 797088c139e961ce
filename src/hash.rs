use std::hash::{Hash, Hasher};

/// Hash function implementation for segment assignment.
/// Uses an enum to avoid trait object limitations with generics.
#[derive(Debug, Clone, Copy, Default)]
pub enum KeyHasher {
    /// AHash implementation (default, fast and well-distributed).
    #[default]
    AHash,
    /// FxHash implementation (faster but potentially less distributed).
    #[cfg(feature = "fxhash")]
    FxHash,
}

impl KeyHasher {
    /// Hash a key down to the 32-bit code used for routing.
    ///
    /// `AHasher::default()` runs with fixed keys, so the same key hashes to the
    /// same code in every map instance of a process.
    pub fn hash_key<K: Hash + ?Sized>(&self, key: &K) -> u32 {
        let full = match self {
            KeyHasher::AHash => {
                let mut hasher = ahash::AHasher::default();
                key.hash(&mut hasher);
                hasher.finish()
            }
            #[cfg(feature = "fxhash")]
            KeyHasher::FxHash => {
                let mut hasher = fxhash::FxHasher::default();
                key.hash(&mut hasher);
                hasher.finish()
            }
        };
        full as u32
    }
}

/// Maps a key to the index of the segment that owns it.
///
/// Both the hasher and the segment count are fixed at construction, so a key
/// routes to the same segment for the whole lifetime of a map.
#[derive(Debug, Clone, Copy)]
pub(crate) struct HashRouter {
    hasher: KeyHasher,
    segment_count: u32,
}

impl HashRouter {
    /// `segment_count` must be non-zero; `Config` validates it before we get here.
    pub fn new(hasher: KeyHasher, segment_count: u32) -> Self {
        debug_assert!(segment_count > 0);
        Self {
            hasher,
            segment_count,
        }
    }

    /// `hash(key) mod segment_count`.
    #[inline]
    pub fn route<K: Hash + ?Sized>(&self, key: &K) -> usize {
        (self.hasher.hash_key(key) % self.segment_count) as usize
    }

    pub fn segment_count(&self) -> usize {
        self.segment_count as usize
    }
}
