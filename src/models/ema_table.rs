use std::collections::BTreeMap;
use std::ops::RangeBounds;

use crate::models::{PriceField, SeriesName, TimeIndex};

/// EMA columns keyed by (field, span), each aligned 1:1 with the time index.
#[derive(Debug, Clone, Default)]
pub struct EmaTable {
    index: TimeIndex,
    columns: BTreeMap<(PriceField, usize), Vec<f64>>,
}

impl EmaTable {
    pub(crate) fn new(index: TimeIndex) -> Self {
        Self {
            index,
            columns: BTreeMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, field: PriceField, span: usize, values: Vec<f64>) {
        debug_assert_eq!(values.len(), self.index.len());
        self.columns.insert((field, span), values);
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

    pub fn column(&self, field: PriceField, span: usize) -> Option<&[f64]> {
        self.columns.get(&(field, span)).map(Vec::as_slice)
    }

    /// EMA value at an exact candle timestamp.
    pub fn value_at(&self, field: PriceField, span: usize, timestamp_ms: i64) -> Option<f64> {
        let row = self.index.position(timestamp_ms)?;
        self.column(field, span).map(|col| col[row])
    }

    pub fn slice<B: RangeBounds<i64>>(
        &self,
        field: PriceField,
        span: usize,
        bounds: B,
    ) -> Option<&[f64]> {
        let rows = self.index.rows(bounds);
        self.column(field, span).map(|col| &col[rows])
    }

    /// Columns in (field, span) order with their series names.
    pub fn columns(&self) -> impl Iterator<Item = (SeriesName, &[f64])> {
        self.columns
            .iter()
            .map(|(&(field, span), values)| (SeriesName::ema(field, span), values.as_slice()))
    }

    /// Last value of every column.
    pub fn latest(&self) -> Vec<(SeriesName, f64)> {
        self.columns()
            .filter_map(|(name, values)| values.last().map(|v| (name, *v)))
            .collect()
    }
}
