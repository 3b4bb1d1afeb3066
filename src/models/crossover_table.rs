use std::collections::BTreeMap;
use std::ops::RangeBounds;

use crate::models::{SeriesName, TimeIndex};

/// Ordered pair: events where `rising` goes from strictly below `reference` to >= it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CrossoverKey {
    pub rising: SeriesName,
    pub reference: SeriesName,
}

impl CrossoverKey {
    pub fn new(rising: SeriesName, reference: SeriesName) -> Self {
        Self { rising, reference }
    }
}

impl std::fmt::Display for CrossoverKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} x {}", self.rising, self.reference)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrossoverColumn {
    /// Minutes since the latest crossing at or before each row; `None` before the first.
    pub minutes_since: Vec<Option<f64>>,
    /// Timestamp of the last crossing in the whole column.
    pub last_crossed_ms: i64,
    /// Whether `rising >= reference` on the last row.
    pub currently_above: bool,
}

/// Latest state of one crossover pair.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossoverSummary {
    pub key: CrossoverKey,
    pub minutes_since: f64,
    pub last_crossed_ms: i64,
    pub currently_above: bool,
}

/// Columns only exist for pairs that crossed at least once.
#[derive(Debug, Clone, Default)]
pub struct CrossoverTable {
    index: TimeIndex,
    columns: BTreeMap<CrossoverKey, CrossoverColumn>,
}

impl CrossoverTable {
    pub(crate) fn new(index: TimeIndex, columns: BTreeMap<CrossoverKey, CrossoverColumn>) -> Self {
        debug_assert!(
            columns
                .values()
                .all(|c| c.minutes_since.len() == index.len())
        );
        Self { index, columns }
    }

    pub fn index(&self) -> &TimeIndex {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn contains_key(&self, key: &CrossoverKey) -> bool {
        self.columns.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &CrossoverKey> {
        self.columns.keys()
    }

    pub fn get(&self, key: &CrossoverKey) -> Option<&CrossoverColumn> {
        self.columns.get(key)
    }

    /// Minutes since crossing at an exact timestamp. `None` if the pair never
    /// crossed, the timestamp is unknown, or no crossing has happened yet by then.
    pub fn value_at(&self, key: &CrossoverKey, timestamp_ms: i64) -> Option<f64> {
        let row = self.index.position(timestamp_ms)?;
        self.get(key)?.minutes_since[row]
    }

    pub fn slice<B: RangeBounds<i64>>(&self, key: &CrossoverKey, bounds: B) -> Option<&[Option<f64>]> {
        let rows = self.index.rows(bounds);
        self.get(key).map(|col| &col.minutes_since[rows])
    }

    /// Latest state of every pair, most recent crossing first.
    pub fn latest(&self) -> Vec<CrossoverSummary> {
        let mut summaries: Vec<CrossoverSummary> = self
            .columns
            .iter()
            .filter_map(|(key, col)| {
                let minutes = (*col.minutes_since.last()?)?;
                Some(CrossoverSummary {
                    key: *key,
                    minutes_since: minutes,
                    last_crossed_ms: col.last_crossed_ms,
                    currently_above: col.currently_above,
                })
            })
            .collect();

        summaries.sort_by(|a, b| {
            a.minutes_since
                .total_cmp(&b.minutes_since)
                .then_with(|| a.key.cmp(&b.key))
        });
        summaries
    }
}
