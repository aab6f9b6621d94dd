use std::{fs, path::Path};

use serde::Deserialize;

use crate::domain::indicator::{AlignmentPolicy, DEFAULT_TOLERANCE_HOURS};
use crate::domain::pair::PairId;
use crate::infrastructure::market_data;
use crate::infrastructure::scrape::{DEFAULT_QUOTE_SELECTOR, DEFAULT_QUOTE_URL};
use crate::infrastructure::sheets::{self, RowLayout};
use crate::shared::errors::ConfigError;

pub const MAX_TREND_ROWS: usize = 200;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MarketDataCfg {
    pub base_url: String,
    pub timeout_secs: u64,
    pub lookback_weeks: u32,
    pub recent_hours: u32,
}

impl Default for MarketDataCfg {
    fn default() -> Self {
        Self {
            base_url: market_data::DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            lookback_weeks: 4,
            recent_hours: 24,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SheetRangeCfg {
    pub pair: PairId,
    pub trend: String,
    pub history: String,
    #[serde(default = "default_trend_layout")]
    pub trend_layout: RowLayout,
    #[serde(default = "default_history_layout")]
    pub history_layout: RowLayout,
}

fn default_trend_layout() -> RowLayout {
    RowLayout::RateOnly
}

fn default_history_layout() -> RowLayout {
    RowLayout::Full
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SheetsCfg {
    pub base_url: String,
    pub spreadsheet_id: Option<String>,
    pub access_token: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub trend_rows: usize,
    pub ranges: Vec<SheetRangeCfg>,
}

impl Default for SheetsCfg {
    fn default() -> Self {
        Self {
            base_url: sheets::DEFAULT_BASE_URL.to_string(),
            spreadsheet_id: None,
            access_token: None,
            api_key: None,
            timeout_secs: 30,
            trend_rows: 24,
            ranges: vec![
                SheetRangeCfg {
                    pair: PairId::UsdKrw,
                    trend: "달러_4주_환율만!A2:F".to_string(),
                    history: "달러_4주!A2:F".to_string(),
                    trend_layout: RowLayout::FairActual,
                    history_layout: RowLayout::Full,
                },
                SheetRangeCfg {
                    pair: PairId::JpyKrw,
                    trend: "엔_4주_환율만!A2:F".to_string(),
                    history: "엔_4주!A2:F".to_string(),
                    trend_layout: RowLayout::RateOnly,
                    history_layout: RowLayout::Full,
                },
            ],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScrapeCfg {
    pub enabled: bool,
    pub url: String,
    pub selector: String,
    pub timeout_secs: u64,
}

impl Default for ScrapeCfg {
    fn default() -> Self {
        Self {
            enabled: true,
            url: DEFAULT_QUOTE_URL.to_string(),
            selector: DEFAULT_QUOTE_SELECTOR.to_string(),
            timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentMode {
    Positional,
    Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineCfg {
    pub alignment: AlignmentMode,
    pub alignment_tolerance_hours: i64,
}

impl Default for EngineCfg {
    fn default() -> Self {
        Self {
            alignment: AlignmentMode::Timestamp,
            alignment_tolerance_hours: DEFAULT_TOLERANCE_HOURS,
        }
    }
}

impl EngineCfg {
    pub fn alignment_policy(&self) -> AlignmentPolicy {
        match self.alignment {
            AlignmentMode::Positional => AlignmentPolicy::Positional,
            AlignmentMode::Timestamp => AlignmentPolicy::timestamp_hours(self.alignment_tolerance_hours),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub market_data: MarketDataCfg,
    pub sheets: SheetsCfg,
    pub scrape: ScrapeCfg,
    pub engine: EngineCfg,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let s = fs::read_to_string(path.as_ref())?;
        Self::from_toml(&s)
    }

    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.market_data.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("market_data.base_url is empty".into()));
        }
        if self.market_data.lookback_weeks == 0 {
            return Err(ConfigError::Invalid("market_data.lookback_weeks must be at least 1".into()));
        }
        if self.market_data.recent_hours == 0 {
            return Err(ConfigError::Invalid("market_data.recent_hours must be at least 1".into()));
        }
        validate_trend_rows(self.sheets.trend_rows)?;
        if self.engine.alignment == AlignmentMode::Timestamp && self.engine.alignment_tolerance_hours < 0 {
            return Err(ConfigError::Invalid("engine.alignment_tolerance_hours must not be negative".into()));
        }
        Ok(())
    }
}

pub fn validate_trend_rows(rows: usize) -> Result<(), ConfigError> {
    if rows == 0 || rows > MAX_TREND_ROWS {
        return Err(ConfigError::Invalid(format!(
            "trend rows must be between 1 and {}, got {}",
            MAX_TREND_ROWS, rows
        )));
    }
    Ok(())
}
