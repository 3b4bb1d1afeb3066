//! Configuration module for the candle cache and indicator engine.

// Can all be private now because we have a public re-export.
mod analysis;
mod bitquery;
mod debug;
mod persistence;

// Re-export commonly used items
pub use analysis::{AnalysisConfig, ConfigError, DEFAULT_CHECKPOINT_EVERY, DEFAULT_EMA_SPANS};
pub use bitquery::{BITQUERY, BitqueryApiConfig, WBNB_ADDRESS};
pub use debug::DF;
pub use persistence::{PERSISTENCE, snapshot_filename};
