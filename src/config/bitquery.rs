use crate::utils::TimeUtils;

pub struct BitqueryApiConfig {
    pub endpoint: &'static str,
    pub timeout_ms: u64,
}

impl Default for BitqueryApiConfig {
    fn default() -> Self {
        Self {
            endpoint: BITQUERY.client.endpoint,
            timeout_ms: BITQUERY.client.timeout_ms,
        }
    }
}

/// Query constraints: one day of 1m candles per call, DEX + network filters.
pub struct QueryLimits {
    pub candles_per_day: usize,
    pub network: &'static str,
    pub exchange_names: &'static [&'static str],
    pub period: &'static str,
    pub periods_per_candle: u32,
    /// Rows returned by the daily top-pairs query
    pub top_pairs_limit: usize,
}

pub struct ClientDefaults {
    pub endpoint: &'static str,
    pub timeout_ms: u64,
    pub api_key_header: &'static str,
}

/// Wrapped BNB. Quote side of every pair unless the caller says otherwise.
pub const WBNB_ADDRESS: &str = "0xbb4cdb9cbd36b01bd1cbaebf2de08d9173bc095c";

pub struct BitqueryConfig {
    pub limits: QueryLimits,
    pub client: ClientDefaults,
}

pub const BITQUERY: BitqueryConfig = BitqueryConfig {
    limits: QueryLimits {
        candles_per_day: TimeUtils::MINUTES_IN_D,
        network: "bsc",
        exchange_names: &["Pancake", "Pancake v2"],
        period: "minute",
        periods_per_candle: 1,
        top_pairs_limit: 10_000,
    },
    client: ClientDefaults {
        endpoint: "https://graphql.bitquery.io",
        timeout_ms: 60_000,
        api_key_header: "X-API-KEY",
    },
};
