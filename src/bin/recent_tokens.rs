use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::{TimeDelta, Utc};
use clap::Parser;
use tabled::{Table, Tabled, settings::Style};

use token_trends::utils::{TimeUtils, format_duration, today_utc};
use token_trends::{
    AnalysisConfig, BitqueryProvider, MarketDataSource, PERSISTENCE, PairActivity, PairAnalysis,
    TokenInfo, analyze_new_token,
};

/// List BSC tokens created inside a window of days before now, and optionally
/// cache and analyse each of them against WBNB.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Window start, in days before now
    #[arg(long, default_value_t = 5)]
    from_days_ago: i64,

    /// Window end, in days before now
    #[arg(long, default_value_t = 4)]
    to_days_ago: i64,

    /// Fetch candles from each token's creation day and report its crossovers
    #[arg(long, default_value_t = false)]
    analyze: bool,

    /// Analyse at most this many of the discovered tokens
    #[arg(long, default_value_t = 10)]
    max_tokens: usize,

    /// Instead of new tokens, list the busiest WBNB pairs per day since --from-days-ago
    #[arg(long, default_value_t = false)]
    top_pairs: bool,

    /// Directory holding the per-pair snapshot files
    #[arg(long, default_value = PERSISTENCE.snapshot.directory)]
    data_dir: PathBuf,

    /// JSON file with an AnalysisConfig
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, env = "BITQUERY_API_KEY", hide_env_values = true)]
    api_key: String,
}

#[derive(Tabled)]
struct TokenRow {
    created: String,
    symbol: String,
    name: String,
    decimals: String,
    address: String,
}

impl From<&TokenInfo> for TokenRow {
    fn from(token: &TokenInfo) -> Self {
        Self {
            created: token.created.format(TimeUtils::STANDARD_TIME_FORMAT).to_string(),
            symbol: token.symbol.clone().unwrap_or_default(),
            name: token.name.clone().unwrap_or_default(),
            decimals: token.decimals.map(|d| d.to_string()).unwrap_or_default(),
            address: token.address.clone(),
        }
    }
}

#[derive(Tabled)]
struct AnalysisRow {
    token: String,
    candles: usize,
    #[tabled(rename = "crossing pairs")]
    crossing_pairs: usize,
    #[tabled(rename = "latest crossover")]
    latest: String,
    ago: String,
}

impl AnalysisRow {
    fn new(token: &TokenInfo, analysis: &PairAnalysis) -> Self {
        let indicators = &analysis.indicators;
        let latest = indicators.crossovers.latest().into_iter().next();
        let last_ts = indicators.index.last();
        Self {
            token: token.label().to_string(),
            candles: analysis.store.len(),
            crossing_pairs: indicators.crossovers.len(),
            latest: latest.as_ref().map(|s| s.key.to_string()).unwrap_or_default(),
            ago: match (latest, last_ts) {
                (Some(s), Some(last)) => format_duration(last - s.last_crossed_ms),
                _ => String::new(),
            },
        }
    }
}

#[derive(Tabled)]
struct PairRow {
    day: String,
    base: String,
    trades: u64,
    #[tabled(rename = "base amount")]
    base_amount: String,
    #[tabled(rename = "WBNB amount")]
    quote_amount: String,
    close: String,
    address: String,
}

impl From<&PairActivity> for PairRow {
    fn from(row: &PairActivity) -> Self {
        Self {
            day: row.day.format(TimeUtils::STANDARD_DATE_FORMAT).to_string(),
            base: row.base_symbol.clone().unwrap_or_default(),
            trades: row.trades,
            base_amount: format!("{:.2}", row.base_amount),
            quote_amount: format!("{:.2}", row.quote_amount),
            close: format!("{:.10}", row.close_price),
            address: row.base_address.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if args.from_days_ago < args.to_days_ago {
        bail!(
            "--from-days-ago ({}) must not be smaller than --to-days-ago ({})",
            args.from_days_ago,
            args.to_days_ago
        );
    }

    let now = Utc::now().naive_utc();
    let since = now - TimeDelta::days(args.from_days_ago);
    let until = now - TimeDelta::days(args.to_days_ago);

    let provider = BitqueryProvider::new(args.api_key.clone()).context("Failed to build Bitquery client")?;

    if args.top_pairs {
        log::info!("🔎 Busiest WBNB pairs per day since {}", since.date());
        let pairs = provider
            .daily_top_pairs(since.date())
            .await
            .context("Top pairs query failed")?;
        log::info!("✅ {} pair-days found", pairs.len());
        let rows: Vec<PairRow> = pairs.iter().map(PairRow::from).collect();
        println!("{}", Table::new(rows).with(Style::rounded()));
        return Ok(());
    }

    log::info!("🔎 Looking for tokens created {} .. {}", since, until);
    let tokens = provider
        .recent_tokens(since, until)
        .await
        .context("Token discovery query failed")?;

    log::info!("✅ {} tokens found", tokens.len());
    let rows: Vec<TokenRow> = tokens.iter().map(TokenRow::from).collect();
    println!("{}", Table::new(rows).with(Style::rounded()));

    if !args.analyze {
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => AnalysisConfig::load(path)
            .with_context(|| format!("Failed to load analysis config {:?}", path))?,
        None => AnalysisConfig::default(),
    };
    let today = today_utc();

    let mut analysed = Vec::new();
    for token in tokens.iter().take(args.max_tokens) {
        // One token with no trades or a failed query should not sink the batch.
        match analyze_new_token(&provider, &args.data_dir, token, &config, today).await {
            Ok(analysis) => analysed.push(AnalysisRow::new(token, &analysis)),
            Err(e) => log::error!("❌ {:#}", e),
        }
    }

    if analysed.is_empty() {
        log::warn!("⚠ No token could be analysed.");
    } else {
        println!("{}", Table::new(analysed).with(Style::rounded()));
    }
    Ok(())
}
