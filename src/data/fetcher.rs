use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::config::{AnalysisConfig, DF};
use crate::data::{CandleStore, MarketDataSource};
use crate::domain::Candle;
use crate::utils::{days_inclusive, previous_day};

/// What one run did. Informational only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchReport {
    /// Days walked in `[start_date, last_day]`, skipped or not.
    pub days_processed: usize,
    /// Successful `fetch_day` calls.
    pub fetched: usize,
    /// Days skipped because the store already had them.
    pub skipped: usize,
    /// Candles received across all fetches.
    pub candles_received: usize,
    /// Snapshot writes attempted (checkpoints plus the final save).
    pub saves_attempted: usize,
    pub saves_failed: usize,
}

impl FetchReport {
    pub fn saves_succeeded(&self) -> usize {
        self.saves_attempted - self.saves_failed
    }
}

/// Walks `[start_date, today]`, fetches the days the store is missing (and today,
/// which is always partial) and checkpoints the store every `checkpoint_every`
/// successful fetches.
pub struct IncrementalFetcher<'a, S: MarketDataSource + ?Sized> {
    source: &'a S,
    checkpoint_every: usize,
    include_today: bool,
}

impl<'a, S: MarketDataSource + ?Sized> IncrementalFetcher<'a, S> {
    pub fn new(source: &'a S, config: &AnalysisConfig) -> Self {
        Self {
            source,
            checkpoint_every: config.checkpoint_every.max(1),
            include_today: config.include_today,
        }
    }

    /// Days that this run would fetch, given the store's current contents.
    pub fn plan(&self, store: &CandleStore, today: NaiveDate) -> Vec<NaiveDate> {
        let Some(last_day) = self.last_day(today) else {
            return Vec::new();
        };
        days_inclusive(store.start_date(), last_day)
            .filter(|&day| day == today || !store.contains(day))
            .collect()
    }

    /// A fetch error aborts the run; whatever was checkpointed before it stays on
    /// disk, and days staged since the last checkpoint are dropped.
    pub async fn run(&self, store: &mut CandleStore, today: NaiveDate) -> Result<FetchReport> {
        let mut report = FetchReport::default();
        let Some(last_day) = self.last_day(today) else {
            return Ok(report);
        };

        let pair = store.pair().clone();
        log::info!(
            "🚀 Updating {} from {} to {} ({} days already cached)",
            pair,
            store.start_date(),
            last_day,
            store.day_count()
        );

        let mut staged: Vec<Vec<Candle>> = Vec::with_capacity(self.checkpoint_every);
        let mut since_checkpoint = 0;

        for day in days_inclusive(store.start_date(), last_day) {
            report.days_processed += 1;

            if day != today && store.contains(day) {
                report.skipped += 1;
                if DF.log_fetch_days {
                    log::debug!("{} {}: cached, skipping", pair, day);
                }
                continue;
            }

            let records = self
                .source
                .fetch_day(&pair, day)
                .await
                .with_context(|| format!("failed to fetch {} for {}", day, pair))?;

            if DF.log_fetch_days {
                log::info!("{} {}: {} candles", pair, day, records.len());
            }
            report.fetched += 1;
            report.candles_received += records.len();
            staged.push(records.into_iter().map(Candle::from).collect());
            since_checkpoint += 1;

            if since_checkpoint >= self.checkpoint_every {
                self.checkpoint(store, &mut staged, &mut report);
                since_checkpoint = 0;
                log::info!(
                    "⏳ {}: {} days processed, {} fetched, {} saved",
                    pair,
                    report.days_processed,
                    report.fetched,
                    report.saves_succeeded()
                );
            }
        }

        // Always end with a save, even if nothing was staged since the last checkpoint.
        self.checkpoint(store, &mut staged, &mut report);

        log::info!(
            "✅ {}: {} days processed, {} fetched, {} skipped, {} candles held, {}/{} saves ok",
            pair,
            report.days_processed,
            report.fetched,
            report.skipped,
            store.len(),
            report.saves_succeeded(),
            report.saves_attempted
        );
        Ok(report)
    }

    fn checkpoint(
        &self,
        store: &mut CandleStore,
        staged: &mut Vec<Vec<Candle>>,
        report: &mut FetchReport,
    ) {
        for day_candles in staged.drain(..) {
            store.append(day_candles);
        }
        report.saves_attempted += 1;
        if let Err(e) = store.save() {
            report.saves_failed += 1;
            log::error!(
                "❌ Checkpoint save for {} failed (continuing with in-memory data): {:#}",
                store.pair(),
                e
            );
        }
    }

    fn last_day(&self, today: NaiveDate) -> Option<NaiveDate> {
        if self.include_today {
            Some(today)
        } else {
            previous_day(today)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SourceError;
    use crate::domain::{PairActivity, PairId, SourceCandle, TokenInfo};
    use crate::utils::{TimeUtils, day_start_ms};
    use async_trait::async_trait;
    use chrono::NaiveDateTime;
    use std::sync::Mutex;

    /// Two candles per day; `fail_on` makes the n-th call (1-based) fail.
    struct ScriptedSource {
        calls: Mutex<Vec<NaiveDate>>,
        fail_on: Option<usize>,
        close: f64,
    }

    impl ScriptedSource {
        fn new(close: f64) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_on: None,
                close,
            }
        }

        fn failing_on(call: usize) -> Self {
            Self {
                fail_on: Some(call),
                ..Self::new(1.0)
            }
        }

        fn calls(&self) -> Vec<NaiveDate> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MarketDataSource for ScriptedSource {
        async fn fetch_day(
            &self,
            _pair: &PairId,
            day: NaiveDate,
        ) -> Result<Vec<SourceCandle>, SourceError> {
            let mut calls = self.calls.lock().unwrap();
            calls.push(day);
            if Some(calls.len()) == self.fail_on {
                return Err(SourceError::Status {
                    status: 502,
                    query: format!("ohlc {}", day),
                });
            }
            let start = day_start_ms(day);
            Ok((0..2)
                .map(|m| SourceCandle {
                    timestamp_ms: start + m * TimeUtils::MS_IN_MIN,
                    open_price: self.close,
                    high_price: None,
                    low_price: None,
                    close_price: self.close,
                    trades: 1,
                })
                .collect())
        }

        async fn recent_tokens(
            &self,
            _since: NaiveDateTime,
            _until: NaiveDateTime,
        ) -> Result<Vec<TokenInfo>, SourceError> {
            Ok(Vec::new())
        }

        async fn daily_top_pairs(&self, _since: NaiveDate) -> Result<Vec<PairActivity>, SourceError> {
            Ok(Vec::new())
        }
    }

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, m, d).unwrap()
    }

    fn pair() -> PairId {
        PairId::new("0xToken", "0xQuote")
    }

    #[tokio::test]
    async fn fetches_every_day_in_range_once() {
        let dir = tempfile::tempdir().unwrap();
        let source = ScriptedSource::new(1.0);
        let config = AnalysisConfig::default();
        let mut store = CandleStore::open(dir.path(), pair(), day(5, 1));

        let report = IncrementalFetcher::new(&source, &config)
            .run(&mut store, day(5, 10))
            .await
            .unwrap();

        assert_eq!(report.days_processed, 10);
        assert_eq!(report.fetched, 10);
        assert_eq!(report.saves_attempted, 1);
        assert_eq!(store.len(), 20);
        assert_eq!(source.calls().first(), Some(&day(5, 1)));
        assert_eq!(source.calls().last(), Some(&day(5, 10)));
    }

    #[tokio::test]
    async fn second_run_only_refetches_today() {
        let dir = tempfile::tempdir().unwrap();
        let config = AnalysisConfig::default();

        let first = ScriptedSource::new(1.0);
        let mut store = CandleStore::open(dir.path(), pair(), day(5, 1));
        IncrementalFetcher::new(&first, &config)
            .run(&mut store, day(5, 10))
            .await
            .unwrap();
        let after_first = store.candles().to_vec();

        let second = ScriptedSource::new(1.0);
        let mut store = CandleStore::open(dir.path(), pair(), day(5, 1));
        let report = IncrementalFetcher::new(&second, &config)
            .run(&mut store, day(5, 10))
            .await
            .unwrap();

        assert_eq!(second.calls(), vec![day(5, 10)]);
        assert_eq!(report.skipped, 9);
        assert_eq!(store.candles(), after_first.as_slice());
    }

    #[tokio::test]
    async fn refetched_today_replaces_partial_candles() {
        let dir = tempfile::tempdir().unwrap();
        let config = AnalysisConfig::default();
        let mut store = CandleStore::open(dir.path(), pair(), day(5, 9));

        IncrementalFetcher::new(&ScriptedSource::new(1.0), &config)
            .run(&mut store, day(5, 10))
            .await
            .unwrap();
        IncrementalFetcher::new(&ScriptedSource::new(2.0), &config)
            .run(&mut store, day(5, 10))
            .await
            .unwrap();

        let today_start = day_start_ms(day(5, 10));
        assert_eq!(store.len(), 4);
        assert_eq!(store.get(today_start).unwrap().close_price, 2.0);
        assert_eq!(store.get(day_start_ms(day(5, 9))).unwrap().close_price, 1.0);
    }

    #[tokio::test]
    async fn checkpoints_every_28_fetches() {
        let dir = tempfile::tempdir().unwrap();
        let source = ScriptedSource::new(1.0);
        let config = AnalysisConfig::default();
        let mut store = CandleStore::open(dir.path(), pair(), day(1, 1));

        // Jan 1 .. Mar 1 = 60 days
        let report = IncrementalFetcher::new(&source, &config)
            .run(&mut store, day(3, 1))
            .await
            .unwrap();

        assert_eq!(report.fetched, 60);
        // floor(60 / 28) checkpoints plus the final save
        assert_eq!(report.saves_attempted, 3);
        assert_eq!(report.saves_failed, 0);
    }

    #[tokio::test]
    async fn crash_after_checkpoint_resumes_with_remaining_days() {
        let dir = tempfile::tempdir().unwrap();
        let config = AnalysisConfig::default();

        // Call 30 fails: 28 days were checkpointed, day 29 was staged and is lost.
        let crashing = ScriptedSource::failing_on(30);
        let mut store = CandleStore::open(dir.path(), pair(), day(1, 1));
        let err = IncrementalFetcher::new(&crashing, &config)
            .run(&mut store, day(3, 1))
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("2021-01-30"));

        let resumed = ScriptedSource::new(1.0);
        let mut store = CandleStore::open(dir.path(), pair(), day(1, 1));
        assert_eq!(store.day_count(), 28);
        let report = IncrementalFetcher::new(&resumed, &config)
            .run(&mut store, day(3, 1))
            .await
            .unwrap();

        assert_eq!(report.fetched, 60 - 28);
        assert_eq!(resumed.calls().first(), Some(&day(1, 29)));
        assert_eq!(store.day_count(), 60);
    }

    #[tokio::test]
    async fn exclude_today_stops_at_yesterday() {
        let dir = tempfile::tempdir().unwrap();
        let source = ScriptedSource::new(1.0);
        let config = AnalysisConfig {
            include_today: false,
            ..Default::default()
        };
        let mut store = CandleStore::open(dir.path(), pair(), day(5, 1));
        let fetcher = IncrementalFetcher::new(&source, &config);

        assert_eq!(fetcher.plan(&store, day(5, 3)), vec![day(5, 1), day(5, 2)]);
        fetcher.run(&mut store, day(5, 3)).await.unwrap();
        assert_eq!(source.calls(), vec![day(5, 1), day(5, 2)]);
        assert!(fetcher.plan(&store, day(5, 3)).is_empty());
    }

    #[tokio::test]
    async fn start_after_today_fetches_nothing_but_still_saves() {
        let dir = tempfile::tempdir().unwrap();
        let source = ScriptedSource::new(1.0);
        let config = AnalysisConfig::default();
        let mut store = CandleStore::open(dir.path(), pair(), day(6, 1));

        let report = IncrementalFetcher::new(&source, &config)
            .run(&mut store, day(5, 1))
            .await
            .unwrap();

        assert_eq!(report.fetched, 0);
        assert_eq!(report.saves_attempted, 1);
        assert!(store.path().exists());
    }

    #[tokio::test]
    async fn failed_saves_do_not_stop_the_run() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the data directory should be: every save fails.
        let blocked = dir.path().join("not_a_dir");
        std::fs::write(&blocked, b"").unwrap();

        let source = ScriptedSource::new(1.0);
        let config = AnalysisConfig {
            checkpoint_every: 3,
            ..Default::default()
        };
        let mut store = CandleStore::open(&blocked, pair(), day(5, 1));

        let report = IncrementalFetcher::new(&source, &config)
            .run(&mut store, day(5, 10))
            .await
            .unwrap();

        assert_eq!(report.fetched, 10);
        // floor(10 / 3) checkpoints plus the final save, all failing
        assert_eq!(report.saves_attempted, 4);
        assert_eq!(report.saves_failed, report.saves_attempted);
        assert_eq!(report.saves_succeeded(), 0);
        assert_eq!(store.len(), 20);
        assert_eq!(store.day_count(), 10);
        assert_eq!(store.pending(), 0);
    }
}
