use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::PairId;

/// One day of DEX trading for a (base, quote) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairActivity {
    pub day: NaiveDate,
    pub base_address: String,
    pub base_symbol: Option<String>,
    pub quote_address: String,
    pub quote_symbol: Option<String>,
    pub base_amount: f64,
    pub quote_amount: f64,
    pub trades: u64,
    pub open_price: f64,
    pub high_price: Option<f64>,
    pub low_price: Option<f64>,
    pub close_price: f64,
}

impl PairActivity {
    pub fn pair(&self) -> PairId {
        PairId::new(&self.base_address, &self.quote_address)
    }
}
