use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, de::DeserializeOwned};

use crate::config::{BITQUERY, BitqueryApiConfig, WBNB_ADDRESS};
use crate::data::{MarketDataSource, SourceError};
use crate::domain::{PairActivity, PairId, SourceCandle, TokenInfo};
use crate::utils::TimeUtils;

/// Bitquery GraphQL client for BSC DEX trades.
pub struct BitqueryProvider {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl BitqueryProvider {
    pub fn new(api_key: String) -> Result<Self> {
        let config = BitqueryApiConfig::default();
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self {
            client,
            api_key,
            endpoint: config.endpoint.to_string(),
        })
    }

    async fn run_query<T: DeserializeOwned>(&self, query: &str, params: &str) -> Result<T, SourceError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(BITQUERY.client.api_key_header, &self.api_key)
            .json(&serde_json::json!({ "query": query }))
            .send()
            .await
            .map_err(|source| SourceError::Transport {
                endpoint: self.endpoint.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            log::error!("Bitquery answered {} for ({})", status, params);
            return Err(SourceError::Status {
                status: status.as_u16(),
                query: query.to_string(),
            });
        }

        let body = response.text().await.map_err(|source| SourceError::Transport {
            endpoint: self.endpoint.clone(),
            source,
        })?;
        decode_response(&body, params)
    }
}

#[async_trait]
impl MarketDataSource for BitqueryProvider {
    async fn fetch_day(
        &self,
        pair: &PairId,
        day: NaiveDate,
    ) -> Result<Vec<SourceCandle>, SourceError> {
        let params = ohlc_params(pair, day);
        let query = q_ohlc_day(pair, day);
        let data: OhlcData = self.run_query(&query, &params).await?;
        data.ethereum
            .dex_trades
            .unwrap_or_default()
            .into_iter()
            .map(|trade| trade.into_source_candle(&params))
            .collect()
    }

    async fn recent_tokens(
        &self,
        since: NaiveDateTime,
        until: NaiveDateTime,
    ) -> Result<Vec<TokenInfo>, SourceError> {
        let params = format!("tokens created {} .. {}", since, until);
        let query = q_tokens_created(since, until);
        let data: TokensData = self.run_query(&query, &params).await?;
        data.ethereum
            .smart_contract_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| call.into_token_info(&params))
            .collect()
    }

    async fn daily_top_pairs(&self, since: NaiveDate) -> Result<Vec<PairActivity>, SourceError> {
        let params = format!(
            "top pairs vs {} since {}, limit {}",
            WBNB_ADDRESS, since, BITQUERY.limits.top_pairs_limit
        );
        let query = q_top_pairs_daily(since);
        let data: DailyTradesData = self.run_query(&query, &params).await?;
        data.ethereum
            .dex_trades
            .unwrap_or_default()
            .into_iter()
            .map(|row| row.into_pair_activity(&params))
            .collect()
    }
}

// --- Query construction ---

fn ohlc_params(pair: &PairId, day: NaiveDate) -> String {
    format!(
        "{}, {}, {}, {}, {}, {}",
        pair.token_address(),
        pair.quote_address(),
        day,
        BITQUERY.limits.period,
        BITQUERY.limits.periods_per_candle,
        BITQUERY.limits.candles_per_day
    )
}

fn exchange_list() -> String {
    BITQUERY
        .limits
        .exchange_names
        .iter()
        .map(|name| format!("\"{}\"", name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// One UTC day of OHLC candles for `pair`, oldest first.
pub(crate) fn q_ohlc_day(pair: &PairId, day: NaiveDate) -> String {
    let limits = &BITQUERY.limits;
    format!(
        r#"{{
  ethereum(network: {network}) {{
    dexTrades(
      options: {{limit: {limit}, asc: "timeInterval.{period}"}}
      date: {{is: "{day}"}}
      exchangeName: {{in: [{exchanges}]}}
      baseCurrency: {{is: "{base}"}}
      quoteCurrency: {{is: "{quote}"}}
    ) {{
      timeInterval {{
        {period}(count: {count})
      }}
      trades: count
      open_price: minimum(of: block, get: quote_price)
      high_price: quotePrice(calculate: maximum)
      low_price: quotePrice(calculate: minimum)
      close_price: maximum(of: block, get: quote_price)
    }}
  }}
}}"#,
        network = limits.network,
        limit = limits.candles_per_day,
        period = limits.period,
        count = limits.periods_per_candle,
        day = day.format(TimeUtils::STANDARD_DATE_FORMAT),
        exchanges = exchange_list(),
        base = pair.token_address(),
        quote = pair.quote_address(),
    )
}

/// Token contracts created inside the window.
pub(crate) fn q_tokens_created(since: NaiveDateTime, until: NaiveDateTime) -> String {
    format!(
        r#"{{
  ethereum(network: {network}) {{
    smartContractCalls(
      options: {{asc: "block.height", limit: 2147483647}}
      smartContractMethod: {{is: "Contract Creation"}}
      smartContractType: {{is: Token}}
      time: {{after: "{since}", before: "{until}"}}
    ) {{
      block {{
        height
        timestamp {{
          iso8601
        }}
      }}
      smartContract {{
        address {{
          address
        }}
        currency {{
          name
          symbol
          decimals
          tokenType
        }}
      }}
      caller {{
        address
      }}
    }}
  }}
}}"#,
        network = BITQUERY.limits.network,
        since = since.format("%Y-%m-%dT%H:%M:%S"),
        until = until.format("%Y-%m-%dT%H:%M:%S"),
    )
}

/// Daily activity of every pair quoted in WBNB since `since`, busiest first.
pub(crate) fn q_top_pairs_daily(since: NaiveDate) -> String {
    let limits = &BITQUERY.limits;
    format!(
        r#"{{
  ethereum(network: {network}) {{
    dexTrades(
      options: {{limit: {limit}, desc: "trades"}}
      date: {{since: "{since}"}}
      exchangeName: {{in: [{exchanges}]}}
      quoteCurrency: {{is: "{quote}"}}
    ) {{
      timeInterval {{
        day(count: 1)
      }}
      baseCurrency {{
        symbol
        address
      }}
      baseAmount
      quoteCurrency {{
        symbol
        address
      }}
      quoteAmount
      trades: count
      open_price: minimum(of: block, get: quote_price)
      high_price: quotePrice(calculate: maximum)
      low_price: quotePrice(calculate: minimum)
      close_price: maximum(of: block, get: quote_price)
    }}
  }}
}}"#,
        network = limits.network,
        limit = limits.top_pairs_limit,
        since = since.format(TimeUtils::STANDARD_DATE_FORMAT),
        exchanges = exchange_list(),
        quote = WBNB_ADDRESS,
    )
}

// --- Response decoding ---

#[derive(Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Option<serde_json::Value>,
}

/// Splits a GraphQL body into data or the matching `SourceError`.
pub(crate) fn decode_response<T: DeserializeOwned>(body: &str, params: &str) -> Result<T, SourceError> {
    let response: GraphQlResponse<T> =
        serde_json::from_str(body).map_err(|e| SourceError::Malformed {
            params: params.to_string(),
            reason: e.to_string(),
        })?;

    if let Some(errors) = response.errors.filter(|e| !e.is_null()) {
        return Err(SourceError::QueryResult {
            params: params.to_string(),
            errors: errors.to_string(),
        });
    }

    response.data.ok_or_else(|| SourceError::Malformed {
        params: params.to_string(),
        reason: "response has neither data nor errors".to_string(),
    })
}

/// Bitquery returns some aggregates as JSON numbers and others as strings.
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

impl NumberOrString {
    fn as_f64(&self) -> Option<f64> {
        match self {
            NumberOrString::Number(n) => Some(*n),
            NumberOrString::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct OhlcData {
    ethereum: OhlcEthereum,
}

#[derive(Deserialize)]
struct OhlcEthereum {
    #[serde(rename = "dexTrades", default)]
    dex_trades: Option<Vec<DexTradeCandle>>,
}

#[derive(Deserialize)]
struct TimeInterval {
    minute: String,
}

#[derive(Deserialize)]
struct DexTradeCandle {
    #[serde(rename = "timeInterval")]
    time_interval: TimeInterval,
    trades: u64,
    open_price: NumberOrString,
    #[serde(default)]
    high_price: Option<NumberOrString>,
    #[serde(default)]
    low_price: Option<NumberOrString>,
    close_price: NumberOrString,
}

impl DexTradeCandle {
    fn into_source_candle(self, params: &str) -> Result<SourceCandle, SourceError> {
        let malformed = |reason: String| SourceError::Malformed {
            params: params.to_string(),
            reason,
        };

        let minute = NaiveDateTime::parse_from_str(&self.time_interval.minute, "%Y-%m-%d %H:%M:%S")
            .map_err(|e| malformed(format!("bad minute '{}': {}", self.time_interval.minute, e)))?;
        let open = self
            .open_price
            .as_f64()
            .ok_or_else(|| malformed(format!("bad open price {:?}", self.open_price)))?;
        let close = self
            .close_price
            .as_f64()
            .ok_or_else(|| malformed(format!("bad close price {:?}", self.close_price)))?;

        Ok(SourceCandle {
            timestamp_ms: minute.and_utc().timestamp_millis(),
            open_price: open,
            high_price: self.high_price.as_ref().and_then(NumberOrString::as_f64),
            low_price: self.low_price.as_ref().and_then(NumberOrString::as_f64),
            close_price: close,
            trades: self.trades,
        })
    }
}

#[derive(Deserialize)]
pub(crate) struct TokensData {
    ethereum: TokensEthereum,
}

#[derive(Deserialize)]
struct TokensEthereum {
    #[serde(rename = "smartContractCalls", default)]
    smart_contract_calls: Option<Vec<ContractCreation>>,
}

#[derive(Deserialize)]
struct Iso8601 {
    iso8601: String,
}

#[derive(Deserialize)]
struct Block {
    timestamp: Iso8601,
}

#[derive(Deserialize)]
struct Address {
    address: String,
}

#[derive(Deserialize)]
struct Currency {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    decimals: Option<u32>,
    #[serde(rename = "tokenType", default)]
    token_type: Option<String>,
}

#[derive(Deserialize)]
struct SmartContract {
    address: Address,
    currency: Currency,
}

#[derive(Deserialize)]
struct ContractCreation {
    block: Block,
    #[serde(rename = "smartContract")]
    smart_contract: SmartContract,
    caller: Address,
}

impl ContractCreation {
    fn into_token_info(self, params: &str) -> Result<TokenInfo, SourceError> {
        let created = DateTime::parse_from_rfc3339(&self.block.timestamp.iso8601)
            .map_err(|e| SourceError::Malformed {
                params: params.to_string(),
                reason: format!("bad creation time '{}': {}", self.block.timestamp.iso8601, e),
            })?
            .naive_utc();

        Ok(TokenInfo {
            address: self.smart_contract.address.address,
            created,
            owner: self.caller.address,
            decimals: self.smart_contract.currency.decimals,
            name: self.smart_contract.currency.name,
            symbol: self.smart_contract.currency.symbol,
            token_type: self.smart_contract.currency.token_type,
        })
    }
}

#[derive(Deserialize)]
pub(crate) struct DailyTradesData {
    ethereum: DailyTradesEthereum,
}

#[derive(Deserialize)]
struct DailyTradesEthereum {
    #[serde(rename = "dexTrades", default)]
    dex_trades: Option<Vec<DailyTrade>>,
}

#[derive(Deserialize)]
struct DayInterval {
    day: String,
}

#[derive(Deserialize)]
struct TradedCurrency {
    #[serde(default)]
    symbol: Option<String>,
    address: String,
}

#[derive(Deserialize)]
struct DailyTrade {
    #[serde(rename = "timeInterval")]
    time_interval: DayInterval,
    #[serde(rename = "baseCurrency")]
    base_currency: TradedCurrency,
    #[serde(rename = "baseAmount", default)]
    base_amount: Option<NumberOrString>,
    #[serde(rename = "quoteCurrency")]
    quote_currency: TradedCurrency,
    #[serde(rename = "quoteAmount", default)]
    quote_amount: Option<NumberOrString>,
    trades: u64,
    open_price: NumberOrString,
    #[serde(default)]
    high_price: Option<NumberOrString>,
    #[serde(default)]
    low_price: Option<NumberOrString>,
    close_price: NumberOrString,
}

impl DailyTrade {
    fn into_pair_activity(self, params: &str) -> Result<PairActivity, SourceError> {
        let malformed = |reason: String| SourceError::Malformed {
            params: params.to_string(),
            reason,
        };

        let day = NaiveDate::parse_from_str(&self.time_interval.day, TimeUtils::STANDARD_DATE_FORMAT)
            .map_err(|e| malformed(format!("bad day '{}': {}", self.time_interval.day, e)))?;
        let open = self
            .open_price
            .as_f64()
            .ok_or_else(|| malformed(format!("bad open price {:?}", self.open_price)))?;
        let close = self
            .close_price
            .as_f64()
            .ok_or_else(|| malformed(format!("bad close price {:?}", self.close_price)))?;
        let amount = |v: &Option<NumberOrString>| v.as_ref().and_then(NumberOrString::as_f64).unwrap_or(0.0);

        Ok(PairActivity {
            day,
            base_amount: amount(&self.base_amount),
            quote_amount: amount(&self.quote_amount),
            base_address: self.base_currency.address,
            base_symbol: self.base_currency.symbol,
            quote_address: self.quote_currency.address,
            quote_symbol: self.quote_currency.symbol,
            trades: self.trades,
            open_price: open,
            high_price: self.high_price.as_ref().and_then(NumberOrString::as_f64),
            low_price: self.low_price.as_ref().and_then(NumberOrString::as_f64),
            close_price: close,
        })
    }
}
