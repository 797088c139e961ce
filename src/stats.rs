//! Statistics and diagnostics types.

#[cfg(feature = "metrics")]
use std::sync::atomic::{AtomicU64, Ordering};

/// Per-segment operation statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentOps {
    /// Number of read hits on this segment.
    pub reads: u64,
    /// Number of inserts and overwrites on this segment.
    pub writes: u64,
    /// Number of entries removed from this segment.
    pub removes: u64,
    /// Number of lock acquisitions (0 when metrics feature disabled).
    pub lock_acquisitions: u64,
    /// Cumulative lock wait time in nanoseconds (0 when lock-timing disabled).
    pub lock_wait_nanos: u64,
}

impl SegmentOps {
    /// Reads + writes + removes.
    pub fn total(&self) -> u64 {
        self.reads + self.writes + self.removes
    }
}

/// Which per-segment counter an event bumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Counter {
    Read,
    Write,
    Remove,
    LockAcquisition,
    #[cfg_attr(not(feature = "lock-timing"), allow(dead_code))]
    LockWaitNanos,
}

#[cfg(feature = "metrics")]
const COUNTERS: usize = 5;

/// Thread-safe counter table for a single segment, indexed by [`Counter`].
#[cfg(feature = "metrics")]
pub(crate) struct SegmentStats {
    counters: [AtomicU64; COUNTERS],
}

#[cfg(feature = "metrics")]
impl SegmentStats {
    pub fn new() -> Self {
        Self {
            counters: Default::default(),
        }
    }

    #[inline]
    pub fn record(&self, counter: Counter, amount: u64) {
        self.counters[counter as usize].fetch_add(amount, Ordering::Relaxed);
    }

    fn load(&self, counter: Counter) -> u64 {
        self.counters[counter as usize].load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> SegmentOps {
        SegmentOps {
            reads: self.load(Counter::Read),
            writes: self.load(Counter::Write),
            removes: self.load(Counter::Remove),
            lock_acquisitions: self.load(Counter::LockAcquisition),
            // Stays zero unless lock-timing records into it.
            lock_wait_nanos: self.load(Counter::LockWaitNanos),
        }
    }
}

/// Zero-sized placeholder when metrics are disabled.
#[cfg(not(feature = "metrics"))]
pub(crate) struct SegmentStats;

#[cfg(not(feature = "metrics"))]
impl SegmentStats {
    pub fn new() -> Self {
        SegmentStats
    }

    #[inline]
    pub fn record(&self, _counter: Counter, _amount: u64) {}

    pub fn snapshot(&self) -> SegmentOps {
        SegmentOps::default()
    }
}

impl Default for SegmentStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Aggregate statistics for a ShardedMap instance.
#[derive(Debug, Clone)]
pub struct Stats {
    /// Total number of entries across all segments.
    pub size: usize,
    /// Number of entries in each segment, in segment order.
    pub segment_sizes: Vec<usize>,
    /// Operation counts for each segment.
    pub operations: Vec<SegmentOps>,
}

/// Per-segment diagnostics snapshot.
#[derive(Debug, Clone)]
pub struct SegmentDiagnostics {
    /// Number of entries in this segment.
    pub entries: usize,
    /// Operation counters (all 0 when metrics disabled).
    pub ops: SegmentOps,
}

/// Structured snapshot for performance introspection.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    /// Total number of entries across all segments.
    pub total_entries: usize,
    /// Per-segment diagnostics.
    pub segments: Vec<SegmentDiagnostics>,
    /// Total read + write + remove operations (0 when metrics disabled).
    pub total_operations: u64,
    /// Average load (entries) per segment.
    pub avg_load_per_segment: f64,
    /// Max load / avg load ratio. 0.0 for an empty map.
    pub max_load_ratio: f64,
}

impl Diagnostics {
    pub(crate) fn from_segments(segments: Vec<SegmentDiagnostics>) -> Self {
        let total_entries: usize = segments.iter().map(|s| s.entries).sum();
        let total_operations = segments.iter().map(|s| s.ops.total()).sum();
        let avg_load_per_segment = if segments.is_empty() {
            0.0
        } else {
            total_entries as f64 / segments.len() as f64
        };
        let max_load = segments.iter().map(|s| s.entries).max().unwrap_or(0);
        let max_load_ratio = if avg_load_per_segment > 0.0 {
            max_load as f64 / avg_load_per_segment
        } else {
            0.0
        };

        Self {
            total_entries,
            segments,
            total_operations,
            avg_load_per_segment,
            max_load_ratio,
        }
    }
}
