//! Fetch and indicator configuration

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_CHECKPOINT_EVERY: usize = 28;
pub const DEFAULT_EMA_SPANS: [usize; 4] = [10, 20, 60, 120];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Runtime knobs shared by the fetcher and the indicator engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Successful day fetches between snapshot saves.
    pub checkpoint_every: usize,

    /// EMA spans, applied to both the fudged high and fudged low series.
    pub ema_spans: Vec<usize>,

    /// Fetch today (always, since it is partial) or stop at yesterday.
    pub include_today: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            checkpoint_every: DEFAULT_CHECKPOINT_EVERY,
            ema_spans: DEFAULT_EMA_SPANS.to_vec(),
            include_today: true,
        }
    }
}

impl AnalysisConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.checkpoint_every == 0 {
            return Err(ConfigError::Invalid(
                "checkpoint_every must be at least 1".to_string(),
            ));
        }
        if self.ema_spans.is_empty() {
            return Err(ConfigError::Invalid("ema_spans must not be empty".to_string()));
        }
        if let Some(span) = self.ema_spans.iter().find(|&&s| s == 0) {
            return Err(ConfigError::Invalid(format!("ema span {} is not allowed", span)));
        }
        Ok(())
    }

    /// Spans sorted and deduplicated, so table columns come out in a stable order.
    pub fn normalized_spans(&self) -> Vec<usize> {
        let mut spans = self.ema_spans.clone();
        spans.sort_unstable();
        spans.dedup();
        spans
    }
}
