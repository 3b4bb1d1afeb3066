#![allow(clippy::collapsible_if)]
#![allow(clippy::type_complexity)]

// Core modules
pub mod analysis;
pub mod config;
pub mod data;
pub mod domain;
pub mod models;
pub mod utils;

// Re-export commonly used types outside of crate (for the binaries and tests)
pub use analysis::{IndicatorEngine, Indicators, PairAnalysis, analyze_new_token, analyze_pair};
pub use config::{AnalysisConfig, PERSISTENCE};
pub use data::{BitqueryProvider, CandleStore, FetchReport, IncrementalFetcher, MarketDataSource};
pub use domain::{Candle, PairActivity, PairId, SourceCandle, TokenInfo};
