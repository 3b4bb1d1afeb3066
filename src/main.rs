use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::{Days, NaiveDate};
use clap::Parser;
use tabled::{Table, Tabled, settings::Style};

use token_trends::config::WBNB_ADDRESS;
use token_trends::utils::{epoch_ms_to_utc, format_duration, today_utc};
use token_trends::{
    AnalysisConfig, BitqueryProvider, CandleStore, IndicatorEngine, Indicators, PERSISTENCE,
    PairId, analyze_pair,
};

const DEFAULT_LOOKBACK_DAYS: u64 = 30;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Per-minute candle cache and EMA crossover report for BSC tokens", long_about = None)]
struct Cli {
    /// Token contract address (base side of the pair)
    #[arg(long)]
    token: String,

    /// Quote token contract address
    #[arg(long, default_value = WBNB_ADDRESS)]
    quote: String,

    /// First day to cache (YYYY-MM-DD). Defaults to 30 days ago.
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Directory holding the per-pair snapshot files
    #[arg(long, default_value = PERSISTENCE.snapshot.directory)]
    data_dir: PathBuf,

    /// JSON file with an AnalysisConfig
    #[arg(long)]
    config: Option<PathBuf>,

    /// Stop at yesterday instead of refreshing today's partial day
    #[arg(long, default_value_t = false)]
    no_today: bool,

    /// Skip fetching and analyse whatever is cached
    #[arg(long, default_value_t = false)]
    offline: bool,

    /// Rows in the crossover table
    #[arg(long, default_value_t = 15)]
    top: usize,

    #[arg(long, env = "BITQUERY_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

#[derive(Tabled)]
struct EmaRow {
    #[tabled(rename = "series")]
    name: String,
    #[tabled(rename = "latest")]
    value: String,
}

#[derive(Tabled)]
struct CrossoverRow {
    #[tabled(rename = "rising")]
    rising: String,
    #[tabled(rename = "over")]
    reference: String,
    #[tabled(rename = "crossed (UTC)")]
    crossed_at: String,
    #[tabled(rename = "ago")]
    ago: String,
    #[tabled(rename = "above now")]
    above: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter(None, log::LevelFilter::Warn)
        .filter(Some("token_trends"), log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = Cli::parse();

    let mut config = match &args.config {
        Some(path) => AnalysisConfig::load(path)
            .with_context(|| format!("Failed to load analysis config {:?}", path))?,
        None => AnalysisConfig::default(),
    };
    if args.no_today {
        config.include_today = false;
    }

    let today = today_utc();
    let start = match args.start {
        Some(start) => start,
        None => today
            .checked_sub_days(Days::new(DEFAULT_LOOKBACK_DAYS))
            .context("Start date out of range")?,
    };

    let pair = PairId::new(&args.token, &args.quote);

    let (store, indicators) = if args.offline {
        let store = CandleStore::open(&args.data_dir, pair, start);
        log::info!("📴 Offline: using {} cached candles", store.len());
        let indicators = IndicatorEngine::new(&config).compute_store(&store);
        (store, indicators)
    } else {
        let Some(api_key) = args.api_key.clone() else {
            bail!("No API key: pass --api-key or set BITQUERY_API_KEY (or use --offline)");
        };
        let provider = BitqueryProvider::new(api_key).context("Failed to build Bitquery client")?;
        let analysis = analyze_pair(&provider, &args.data_dir, pair, start, &config, today).await?;
        (analysis.store, analysis.indicators)
    };

    if store.is_empty() {
        log::warn!("⚠ No candles for {}. Nothing to analyse.", store.pair());
        return Ok(());
    }

    print_report(&store, &indicators, args.top);
    Ok(())
}

fn print_report(store: &CandleStore, indicators: &Indicators, top: usize) {
    let (Some(first), Some(last)) = (indicators.index.first(), indicators.index.last()) else {
        return;
    };
    println!(
        "{}: {} candles, {} .. {}",
        store.pair(),
        indicators.index.len(),
        epoch_ms_to_utc(first),
        epoch_ms_to_utc(last)
    );

    let mut ema_rows = vec![
        EmaRow {
            name: "fudge_high".to_string(),
            value: format_price(indicators.fudge_high.last().copied()),
        },
        EmaRow {
            name: "fudge_low".to_string(),
            value: format_price(indicators.fudge_low.last().copied()),
        },
    ];
    ema_rows.extend(indicators.emas.latest().into_iter().map(|(name, value)| EmaRow {
        name: name.to_string(),
        value: format_price(Some(value)),
    }));
    println!("{}", Table::new(ema_rows).with(Style::rounded()));

    let crossover_rows: Vec<CrossoverRow> = indicators
        .crossovers
        .latest()
        .into_iter()
        .take(top)
        .map(|s| CrossoverRow {
            rising: s.key.rising.to_string(),
            reference: s.key.reference.to_string(),
            crossed_at: epoch_ms_to_utc(s.last_crossed_ms),
            ago: format_duration(last - s.last_crossed_ms),
            above: s.currently_above,
        })
        .collect();

    if crossover_rows.is_empty() {
        println!("No crossovers in the cached history.");
    } else {
        println!("{}", Table::new(crossover_rows).with(Style::rounded()));
    }
}

fn format_price(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.10}", v))
}
