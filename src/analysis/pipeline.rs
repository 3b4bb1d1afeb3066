use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::analysis::{IndicatorEngine, Indicators};
use crate::config::{AnalysisConfig, WBNB_ADDRESS};
use crate::data::{CandleStore, FetchReport, IncrementalFetcher, MarketDataSource};
use crate::domain::{PairId, TokenInfo};

/// Cached history of one pair after an update, with its indicators.
#[derive(Debug)]
pub struct PairAnalysis {
    pub store: CandleStore,
    pub report: FetchReport,
    pub indicators: Indicators,
}

/// Opens the pair's snapshot, brings it up to `today` and recomputes indicators.
pub async fn analyze_pair<S: MarketDataSource + ?Sized>(
    source: &S,
    data_dir: &Path,
    pair: PairId,
    start: NaiveDate,
    config: &AnalysisConfig,
    today: NaiveDate,
) -> Result<PairAnalysis> {
    let mut store = CandleStore::open(data_dir, pair, start);
    let report = IncrementalFetcher::new(source, config)
        .run(&mut store, today)
        .await?;
    if report.saves_failed > 0 {
        log::warn!(
            "⚠ {}: {} of {} snapshot saves failed; the next run will refetch those days",
            store.pair(),
            report.saves_failed,
            report.saves_attempted
        );
    }

    let indicators = IndicatorEngine::new(config).compute_store(&store);
    Ok(PairAnalysis {
        store,
        report,
        indicators,
    })
}

/// Analyses a freshly discovered token against WBNB from its creation day on.
pub async fn analyze_new_token<S: MarketDataSource + ?Sized>(
    source: &S,
    data_dir: &Path,
    token: &TokenInfo,
    config: &AnalysisConfig,
    today: NaiveDate,
) -> Result<PairAnalysis> {
    let pair = PairId::new(&token.address, WBNB_ADDRESS);
    log::info!(
        "🆕 {} created {} by {}",
        token.label(),
        token.created,
        token.owner
    );
    analyze_pair(source, data_dir, pair, token.created.date(), config, today)
        .await
        .with_context(|| format!("Failed to analyse new token {}", token.label()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SourceError;
    use crate::domain::{PairActivity, SourceCandle};
    use crate::utils::{TimeUtils, day_start_ms};
    use async_trait::async_trait;
    use chrono::NaiveDateTime;
    use std::sync::Mutex;

    /// Sine-shaped minutes for known pairs, a failure for anything else.
    struct RecordingSource {
        requests: Mutex<Vec<(PairId, NaiveDate)>>,
        known_token: String,
    }

    impl RecordingSource {
        fn new(known_token: &str) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                known_token: known_token.to_lowercase(),
            }
        }
    }

    #[async_trait]
    impl MarketDataSource for RecordingSource {
        async fn fetch_day(
            &self,
            pair: &PairId,
            day: NaiveDate,
        ) -> Result<Vec<SourceCandle>, SourceError> {
            self.requests.lock().unwrap().push((pair.clone(), day));
            if pair.token_address() != self.known_token {
                return Err(SourceError::Status {
                    status: 500,
                    query: format!("ohlc {}", pair),
                });
            }
            let start = day_start_ms(day);
            Ok((0..180)
                .map(|m| {
                    let p = 2.0 + ((start / TimeUtils::MS_IN_MIN + m) as f64 / 11.0).sin();
                    SourceCandle {
                        timestamp_ms: start + m * TimeUtils::MS_IN_MIN,
                        open_price: p,
                        high_price: None,
                        low_price: None,
                        close_price: p * 1.001,
                        trades: 2,
                    }
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

    fn may(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 5, d).unwrap()
    }

    fn token(address: &str) -> TokenInfo {
        TokenInfo {
            address: address.to_string(),
            created: may(3).and_hms_opt(10, 15, 0).unwrap(),
            owner: "0xdeployer".to_string(),
            decimals: Some(18),
            name: None,
            symbol: Some("NEW".to_string()),
            token_type: Some("ERC20".to_string()),
        }
    }

    #[tokio::test]
    async fn new_token_is_fetched_from_creation_day_against_wbnb() {
        let dir = tempfile::tempdir().unwrap();
        let source = RecordingSource::new("0xNEW");
        let config = AnalysisConfig::default();

        let analysis = analyze_new_token(&source, dir.path(), &token("0xNEW"), &config, may(5))
            .await
            .unwrap();

        let requests = source.requests.lock().unwrap().clone();
        let expected_pair = PairId::new("0xnew", WBNB_ADDRESS);
        assert_eq!(
            requests,
            vec![
                (expected_pair.clone(), may(3)),
                (expected_pair.clone(), may(4)),
                (expected_pair.clone(), may(5)),
            ]
        );
        assert_eq!(analysis.store.pair(), &expected_pair);
        assert_eq!(analysis.store.start_date(), may(3));
        assert_eq!(analysis.report.fetched, 3);
        assert_eq!(analysis.indicators.index.len(), 3 * 180);
        assert!(!analysis.indicators.crossovers.is_empty());
        assert!(analysis.store.path().exists());
    }

    #[tokio::test]
    async fn failing_token_names_itself_in_the_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = RecordingSource::new("0xsomethingelse");
        let config = AnalysisConfig::default();

        let err = analyze_new_token(&source, dir.path(), &token("0xNEW"), &config, may(5))
            .await
            .unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("NEW"));
        assert!(message.contains("2021-05-03"));
    }

    #[tokio::test]
    async fn analyze_pair_reuses_the_cache() {
        let dir = tempfile::tempdir().unwrap();
        let source = RecordingSource::new("0xabc");
        let config = AnalysisConfig::default();
        let pair = PairId::new("0xABC", WBNB_ADDRESS);

        analyze_pair(&source, dir.path(), pair.clone(), may(1), &config, may(4))
            .await
            .unwrap();
        let again = analyze_pair(&source, dir.path(), pair, may(1), &config, may(4))
            .await
            .unwrap();

        assert_eq!(again.report.fetched, 1);
        assert_eq!(again.report.skipped, 3);
        assert_eq!(source.requests.lock().unwrap().len(), 5);
    }
}
