use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::domain::{PairActivity, PairId, SourceCandle, TokenInfo};

/// Failures of the remote market data service. All of them abort the current run.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Network / transport failure before a status code was seen.
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success HTTP status.
    #[error("query failed with status {status}: {query}")]
    Status { status: u16, query: String },

    /// Well-formed response that reports application-level errors.
    #[error("query ({params}) failed with {errors}")]
    QueryResult { params: String, errors: String },

    /// Response body did not have the expected shape.
    #[error("malformed response for ({params}): {reason}")]
    Malformed { params: String, reason: String },
}

/// Abstract interface for fetching market data.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// All per-minute candles for `pair` on the UTC calendar day `day`.
    /// An empty vec means the pair did not trade that day.
    async fn fetch_day(
        &self,
        pair: &PairId,
        day: NaiveDate,
    ) -> Result<Vec<SourceCandle>, SourceError>;

    /// Tokens whose contracts were created inside `[since, until]`.
    async fn recent_tokens(
        &self,
        since: NaiveDateTime,
        until: NaiveDateTime,
    ) -> Result<Vec<TokenInfo>, SourceError>;

    /// Per-day trading activity of the busiest pairs since `since`, most trades first.
    async fn daily_top_pairs(&self, since: NaiveDate) -> Result<Vec<PairActivity>, SourceError>;
}
