use std::collections::BTreeSet;
use std::ops::RangeBounds;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::config::snapshot_filename;
use crate::data::snapshot::{SnapshotError, SnapshotFile};
use crate::domain::{Candle, PairId};
use crate::utils::{index_range_by_key, position_by_key};

/// Ordered per-minute candles for one pair, backed by a snapshot file.
///
/// Appends land in an unmerged buffer; `merge` (also run by `save`) folds them in,
/// sorting by timestamp and letting the most recently appended candle win on
/// duplicate timestamps. Read accessors only see merged candles.
#[derive(Debug)]
pub struct CandleStore {
    pair: PairId,
    start_date: NaiveDate,
    path: PathBuf,
    candles: Vec<Candle>,
    unmerged: Vec<Candle>,
    days: BTreeSet<NaiveDate>,
}

impl CandleStore {
    /// Empty store; nothing is read from disk.
    pub fn new(data_dir: &Path, pair: PairId, start_date: NaiveDate) -> Self {
        let path = data_dir.join(snapshot_filename(&pair));
        Self {
            pair,
            start_date,
            path,
            candles: Vec::new(),
            unmerged: Vec::new(),
            days: BTreeSet::new(),
        }
    }

    /// Store pre-filled from the pair's snapshot, or empty if there is none usable.
    pub fn open(data_dir: &Path, pair: PairId, start_date: NaiveDate) -> Self {
        let mut store = Self::new(data_dir, pair, start_date);
        store.load();
        store
    }

    /// Replaces the in-memory series with the snapshot's. Any load failure is
    /// logged and leaves the store empty, so the next run re-fetches from `start_date`.
    /// Returns whether a snapshot was used.
    pub fn load(&mut self) -> bool {
        self.candles.clear();
        self.unmerged.clear();
        self.days.clear();

        if !self.path.exists() {
            log::info!("No snapshot for {} at {:?}; starting empty", self.pair, self.path);
            return false;
        }

        match SnapshotFile::read_from_path(&self.path, &self.pair) {
            Ok(snapshot) => {
                if snapshot.start_date != self.start_date {
                    log::info!(
                        "Snapshot for {} was started at {}, now {}",
                        self.pair,
                        snapshot.start_date,
                        self.start_date
                    );
                }
                self.unmerged = snapshot.candles;
                self.merge();
                true
            }
            Err(e) => {
                log::warn!("⚠️  Ignoring unusable snapshot for {}: {:#}", self.pair, e);
                false
            }
        }
    }

    /// Merges pending candles and overwrites the snapshot file. A failure leaves the
    /// in-memory series untouched and authoritative.
    pub fn save(&mut self) -> Result<(), SnapshotError> {
        self.merge();
        SnapshotFile::new(self.pair.clone(), self.start_date, self.candles.clone())
            .write_to_path(&self.path)
    }

    /// True iff at least one candle (merged or pending) falls on `day`.
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.days.contains(&day)
    }

    /// Queues candles for the next merge. No global re-sort happens here.
    pub fn append(&mut self, candles: impl IntoIterator<Item = Candle>) {
        for candle in candles {
            if let Some(day) = candle.day() {
                self.days.insert(day);
            }
            self.unmerged.push(candle);
        }
    }

    /// Folds pending candles into the ordered series.
    pub fn merge(&mut self) {
        if self.unmerged.is_empty() {
            return;
        }

        let mut all = std::mem::take(&mut self.candles);
        all.append(&mut self.unmerged);
        // Stable sort: among equal timestamps the later-appended candle stays last.
        all.sort_by_key(|c| c.timestamp_ms);

        let mut merged: Vec<Candle> = Vec::with_capacity(all.len());
        for candle in all {
            match merged.last_mut() {
                Some(last) if last.timestamp_ms == candle.timestamp_ms => *last = candle,
                _ => merged.push(candle),
            }
        }

        self.days = merged.iter().filter_map(Candle::day).collect();
        self.candles = merged;
    }

    pub fn pair(&self) -> &PairId {
        &self.pair
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn pending(&self) -> usize {
        self.unmerged.len()
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        self.days.first().copied()
    }

    pub fn last_day(&self) -> Option<NaiveDate> {
        self.days.last().copied()
    }

    pub fn day_count(&self) -> usize {
        self.days.len()
    }

    /// Exact timestamp lookup.
    pub fn get(&self, timestamp_ms: i64) -> Option<&Candle> {
        position_by_key(&self.candles, |c| c.timestamp_ms, timestamp_ms).map(|i| &self.candles[i])
    }

    pub fn contains_timestamp(&self, timestamp_ms: i64) -> bool {
        self.get(timestamp_ms).is_some()
    }

    /// Candles whose timestamps fall inside `bounds`.
    pub fn range<B: RangeBounds<i64>>(&self, bounds: B) -> &[Candle] {
        let r = index_range_by_key(&self.candles, |c| c.timestamp_ms, bounds);
        &self.candles[r]
    }
}
