use std::ops::{Range, RangeBounds};

use crate::utils::{index_range_by_key, position_by_key};

/// Ascending, unique candle timestamps that indicator columns are aligned to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeIndex {
    timestamps: Vec<i64>,
}

impl TimeIndex {
    pub fn new(timestamps: Vec<i64>) -> Self {
        debug_assert!(timestamps.windows(2).all(|w| w[0] < w[1]));
        Self { timestamps }
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.timestamps
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn first(&self) -> Option<i64> {
        self.timestamps.first().copied()
    }

    pub fn last(&self) -> Option<i64> {
        self.timestamps.last().copied()
    }

    /// Row of an exact timestamp.
    pub fn position(&self, timestamp_ms: i64) -> Option<usize> {
        position_by_key(&self.timestamps, |t| *t, timestamp_ms)
    }

    pub fn contains(&self, timestamp_ms: i64) -> bool {
        self.position(timestamp_ms).is_some()
    }

    /// Rows whose timestamps fall inside `bounds`.
    pub fn rows<B: RangeBounds<i64>>(&self, bounds: B) -> Range<usize> {
        index_range_by_key(&self.timestamps, |t| *t, bounds)
    }
}
