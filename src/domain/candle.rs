use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::utils::day_of;

/// One per-minute OHLC bucket as held by the store. High and low are always present.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp_ms: i64,

    pub open_price: f64,
    pub high_price: f64,
    pub low_price: f64,
    pub close_price: f64,

    pub trades: u64,
}

/// A candle as the provider reports it: high/low can be missing.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceCandle {
    pub timestamp_ms: i64,
    pub open_price: f64,
    pub high_price: Option<f64>,
    pub low_price: Option<f64>,
    pub close_price: f64,
    pub trades: u64,
}

impl Candle {
    pub fn new(timestamp_ms: i64, open: f64, high: f64, low: f64, close: f64, trades: u64) -> Self {
        Candle {
            timestamp_ms,
            open_price: open,
            high_price: high,
            low_price: low,
            close_price: close,
            trades,
        }
    }

    /// Top of the body, ignoring wicks.
    pub fn fudge_high(&self) -> f64 {
        self.open_price.max(self.close_price)
    }

    /// Bottom of the body, ignoring wicks.
    pub fn fudge_low(&self) -> f64 {
        self.open_price.min(self.close_price)
    }

    pub fn day(&self) -> Option<NaiveDate> {
        day_of(self.timestamp_ms)
    }
}

impl From<SourceCandle> for Candle {
    fn from(src: SourceCandle) -> Self {
        let high = src
            .high_price
            .unwrap_or_else(|| src.open_price.max(src.close_price));
        let low = src
            .low_price
            .unwrap_or_else(|| src.open_price.min(src.close_price));
        Candle::new(src.timestamp_ms, src.open_price, high, low, src.close_price, src.trades)
    }
}
