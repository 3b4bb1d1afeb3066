// Indicator kernels, the engine that runs them over a candle history,
// and the fetch-then-analyse pipeline used by the binaries
pub mod crossover;
pub mod ema;
pub mod engine;
pub mod pipeline;

pub use engine::{IndicatorEngine, Indicators};
pub use pipeline::{PairAnalysis, analyze_new_token, analyze_pair};
