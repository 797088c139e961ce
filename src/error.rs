/// Errors that can occur when building a ShardedMap.
///
/// Keyed and whole-map operations never fail: compare-based operations such
/// as [`replace`](crate::ShardedMap::replace) report a mismatch through their
/// `bool` result instead.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The segment count is invalid (must be greater than 0 and fit in a `u32`).
    #[error("segment count must be greater than 0 and at most u32::MAX")]
    InvalidSegmentCount,
}
