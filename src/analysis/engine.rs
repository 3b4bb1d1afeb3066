use std::collections::BTreeMap;

use rayon::prelude::*;
use strum::IntoEnumIterator;

use crate::analysis::crossover::{candidate_pairs, crossover_column};
use crate::analysis::ema::ema_series;
use crate::config::AnalysisConfig;
use crate::data::CandleStore;
use crate::domain::Candle;
use crate::models::{CrossoverTable, EmaTable, PriceField, SeriesName, TimeIndex};
use crate::trace_time;

/// Everything derived from one candle sequence.
#[derive(Debug, Clone, Default)]
pub struct Indicators {
    pub index: TimeIndex,
    pub fudge_high: Vec<f64>,
    pub fudge_low: Vec<f64>,
    pub emas: EmaTable,
    pub crossovers: CrossoverTable,
}

impl Indicators {
    /// Any comparable series by name.
    pub fn series(&self, name: SeriesName) -> Option<&[f64]> {
        match name {
            SeriesName::Fudge(PriceField::High) => Some(&self.fudge_high),
            SeriesName::Fudge(PriceField::Low) => Some(&self.fudge_low),
            SeriesName::Ema { field, span } => self.emas.column(field, span),
        }
    }

    /// Raw series first, then EMA columns in (field, span) order.
    pub fn series_names(&self) -> Vec<SeriesName> {
        [SeriesName::FUDGE_HIGH, SeriesName::FUDGE_LOW]
            .into_iter()
            .chain(self.emas.columns().map(|(name, _)| name))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

/// Stateless over its input: the candle slice is only read.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    spans: Vec<usize>,
}

impl IndicatorEngine {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            spans: config.normalized_spans(),
        }
    }

    pub fn spans(&self) -> &[usize] {
        &self.spans
    }

    pub fn compute_store(&self, store: &CandleStore) -> Indicators {
        self.compute(store.candles())
    }

    /// `candles` must be sorted by timestamp with no duplicates (a merged store).
    pub fn compute(&self, candles: &[Candle]) -> Indicators {
        let index = TimeIndex::new(candles.iter().map(|c| c.timestamp_ms).collect());
        let fudge_high: Vec<f64> = candles.iter().map(Candle::fudge_high).collect();
        let fudge_low: Vec<f64> = candles.iter().map(Candle::fudge_low).collect();

        let mut emas = EmaTable::new(index.clone());
        trace_time!("ema columns", 5_000, {
            for field in PriceField::iter() {
                let source = match field {
                    PriceField::High => &fudge_high,
                    PriceField::Low => &fudge_low,
                };
                for &span in &self.spans {
                    emas.insert(field, span, ema_series(source, span));
                }
            }
        });

        let mut indicators = Indicators {
            index,
            fudge_high,
            fudge_low,
            emas,
            crossovers: CrossoverTable::default(),
        };
        if indicators.is_empty() {
            return indicators;
        }

        let crossovers = trace_time!("crossover table", 20_000, {
            Self::crossovers(&indicators)
        });
        log::info!(
            "📈 {} candles, {} EMA columns, {} crossing pairs",
            indicators.index.len(),
            indicators.emas.len(),
            crossovers.len()
        );
        indicators.crossovers = crossovers;
        indicators
    }

    fn crossovers(indicators: &Indicators) -> CrossoverTable {
        let timestamps = indicators.index.as_slice();
        let pairs = candidate_pairs(&indicators.series_names());

        let columns: BTreeMap<_, _> = pairs
            .into_par_iter()
            .filter_map(|key| {
                let a = indicators.series(key.rising)?;
                let b = indicators.series(key.reference)?;
                crossover_column(timestamps, a, b).map(|col| (key, col))
            })
            .collect();

        CrossoverTable::new(indicators.index.clone(), columns)
    }
}
