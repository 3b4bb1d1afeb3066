use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A token contract creation event, as returned by token discovery.
/// Metadata the chain does not report comes through as `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub address: String,
    pub created: NaiveDateTime,
    pub owner: String,
    pub decimals: Option<u32>,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub token_type: Option<String>,
}

impl TokenInfo {
    /// Symbol if known, else the contract address.
    pub fn label(&self) -> &str {
        self.symbol.as_deref().unwrap_or(&self.address)
    }
}
