use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use fairfx::app::{self, AppCfg, Overrides};
use fairfx::config::Config;
use fairfx::domain::pair::PairId;

#[derive(Parser, Debug)]
#[command(version, about = "Fair-value gauges for USD/KRW and JPY/KRW")]
struct Args {
    /// Path to config file (optional)
    #[arg(long)]
    config: Option<String>,

    /// Pairs to evaluate: usd-krw, jpy-krw or all (comma-separated)
    #[arg(long, default_value = "all")]
    pair: String,

    /// Lookback window in weeks (overrides config)
    #[arg(long)]
    weeks: Option<u32>,

    /// Historical rows to show, 1-200 (overrides config)
    #[arg(long)]
    rows: Option<usize>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Append the fresh snapshot to the trend sheet
    #[arg(long)]
    record: bool,

    /// Skip reading historical rows
    #[arg(long)]
    no_history: bool,

    /// Skip the scraped quote
    #[arg(long)]
    no_scrape: bool,

    /// Log filter when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn parse_pairs(raw: &str) -> Result<Vec<PairId>> {
    if raw.trim().eq_ignore_ascii_case("all") {
        return Ok(PairId::ALL.to_vec());
    }
    let mut pairs = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let pair: PairId = part.parse().map_err(|e: String| anyhow::anyhow!(e))?;
        if !pairs.contains(&pair) {
            pairs.push(pair);
        }
    }
    if pairs.is_empty() {
        return Err(anyhow::anyhow!("--pair needs at least one pair"));
    }
    Ok(pairs)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Priority: CLI args > Config file > Defaults
    let base_config = match &args.config {
        Some(path) => Config::from_file(path).with_context(|| format!("load config {}", path))?,
        None => Config::default(),
    };

    let overrides = Overrides {
        pairs: Some(parse_pairs(&args.pair)?),
        weeks: args.weeks,
        rows: args.rows,
        json: args.json,
        record: args.record,
        no_history: args.no_history,
        no_scrape: args.no_scrape,
    };
    let app_cfg = AppCfg::from_config(base_config, overrides)?;

    app::run(app_cfg).await
}
