// src/app.rs
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn};

use crate::application::{Dashboard, DashboardSettings, EvaluationCycle, HistoryRanges};
use crate::config::{validate_trend_rows, Config};
use crate::domain::indicator::AlignmentPolicy;
use crate::domain::pair::PairId;
use crate::infrastructure::market_data::YahooChartClient;
use crate::infrastructure::scrape::QuoteScraper;
use crate::infrastructure::sheets::{SheetsAuth, SheetsClient};

pub const ACCESS_TOKEN_ENV: &str = "SHEETS_ACCESS_TOKEN";
pub const API_KEY_ENV: &str = "SHEETS_API_KEY";

/// Everything a run needs, after CLI > config file > defaults
#[derive(Debug, Clone)]
pub struct AppCfg {
    pub pairs: Vec<PairId>,
    pub market_base_url: String,
    pub market_timeout: Duration,
    pub lookback_weeks: u32,
    pub recent_hours: u32,
    pub alignment: AlignmentPolicy,

    pub spreadsheet_id: Option<String>,
    pub sheets_base_url: String,
    pub sheets_auth: SheetsAuth,
    pub sheets_timeout: Duration,
    pub trend_rows: usize,
    pub history_ranges: Vec<HistoryRanges>,
    pub history: bool,
    pub record: bool,

    pub scrape: bool,
    pub quote_url: String,
    pub quote_selector: String,
    pub scrape_timeout: Duration,

    pub json: bool,
}

/// CLI values that override the config file when given
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub pairs: Option<Vec<PairId>>,
    pub weeks: Option<u32>,
    pub rows: Option<usize>,
    pub json: bool,
    pub record: bool,
    pub no_history: bool,
    pub no_scrape: bool,
}

impl AppCfg {
    pub fn from_config(cfg: Config, overrides: Overrides) -> Result<Self> {
        let trend_rows = overrides.rows.unwrap_or(cfg.sheets.trend_rows);
        validate_trend_rows(trend_rows)?;
        let lookback_weeks = overrides.weeks.unwrap_or(cfg.market_data.lookback_weeks);
        if lookback_weeks == 0 {
            return Err(anyhow::anyhow!("--weeks must be at least 1"));
        }

        let access_token = cfg
            .sheets
            .access_token
            .clone()
            .or_else(|| std::env::var(ACCESS_TOKEN_ENV).ok())
            .filter(|t| !t.is_empty());
        let api_key = cfg
            .sheets
            .api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|k| !k.is_empty());
        let sheets_auth = match (access_token, api_key) {
            (Some(token), _) => SheetsAuth::Bearer(token),
            (None, Some(key)) => SheetsAuth::ApiKey(key),
            (None, None) => SheetsAuth::Anonymous,
        };

        let history_ranges = cfg
            .sheets
            .ranges
            .iter()
            .map(|r| HistoryRanges {
                pair: r.pair,
                trend: r.trend.clone(),
                trend_layout: r.trend_layout,
                history: r.history.clone(),
                history_layout: r.history_layout,
            })
            .collect();

        Ok(Self {
            pairs: overrides.pairs.unwrap_or_else(|| PairId::ALL.to_vec()),
            market_base_url: cfg.market_data.base_url,
            market_timeout: Duration::from_secs(cfg.market_data.timeout_secs),
            lookback_weeks,
            recent_hours: cfg.market_data.recent_hours,
            alignment: cfg.engine.alignment_policy(),

            spreadsheet_id: cfg.sheets.spreadsheet_id,
            sheets_base_url: cfg.sheets.base_url,
            sheets_auth,
            sheets_timeout: Duration::from_secs(cfg.sheets.timeout_secs),
            trend_rows,
            history_ranges,
            history: !overrides.no_history,
            record: overrides.record,

            scrape: cfg.scrape.enabled && !overrides.no_scrape,
            quote_url: cfg.scrape.url,
            quote_selector: cfg.scrape.selector,
            scrape_timeout: Duration::from_secs(cfg.scrape.timeout_secs),

            json: overrides.json,
        })
    }
}

pub async fn run(app_cfg: AppCfg) -> Result<()> {
    info!("Starting fair-value evaluation for {:?}", app_cfg.pairs);

    let fetcher = YahooChartClient::new(&app_cfg.market_base_url, app_cfg.market_timeout)
        .context("build market-data client")?;

    let scraper = if app_cfg.scrape {
        Some(QuoteScraper::new(app_cfg.scrape_timeout).context("build quote scraper")?)
    } else {
        None
    };

    let sheets = match (&app_cfg.spreadsheet_id, app_cfg.history || app_cfg.record) {
        (Some(id), true) => Some(
            SheetsClient::new(
                &app_cfg.sheets_base_url,
                id.clone(),
                app_cfg.sheets_auth.clone(),
                app_cfg.sheets_timeout,
            )
            .context("build sheets client")?,
        ),
        (None, true) => {
            warn!("No spreadsheet_id configured, history is not shown");
            None
        }
        _ => None,
    };

    let cycle = EvaluationCycle::new(
        &fetcher,
        app_cfg.lookback_weeks,
        app_cfg.recent_hours,
        app_cfg.alignment,
    );
    let settings = DashboardSettings {
        trend_rows: app_cfg.trend_rows,
        history_ranges: app_cfg.history_ranges.clone(),
        quote_url: app_cfg.quote_url.clone(),
        quote_selector: app_cfg.quote_selector.clone(),
        record: app_cfg.record,
    };
    let dashboard = Dashboard::new(cycle, scraper.as_ref(), sheets.as_ref(), settings);

    let report = dashboard.run(&app_cfg.pairs, Utc::now()).await;

    if app_cfg.json {
        println!("{}", report.to_json().context("serialize report")?);
    } else {
        print!("{}", report.render_text());
    }

    if !report.any_evaluated() {
        return Err(anyhow::anyhow!("no pair could be evaluated"));
    }
    Ok(())
}
