//! Error handling for the application

use thiserror::Error;

/// Market-data fetch errors
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Request for {symbol} failed: {source}")]
    Request {
        symbol: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Provider returned status {status} for {symbol}")]
    Status { symbol: String, status: u16 },

    #[error("Provider error for {symbol}: {message}")]
    Provider { symbol: String, message: String },

    #[error("Could not decode response for {symbol}: {message}")]
    Decode { symbol: String, message: String },

    #[error("No observations returned for {symbol}")]
    Empty { symbol: String },

    #[error("Observations for {symbol} are not in time order")]
    Unordered { symbol: String },

    #[error("Series {symbol} contains a close that cannot be inverted")]
    InvalidClose { symbol: String },
}

/// Which side of a pair a series plays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesRole {
    Reference,
    Cross,
}

impl std::fmt::Display for SeriesRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeriesRole::Reference => write!(f, "reference"),
            SeriesRole::Cross => write!(f, "cross"),
        }
    }
}

/// Indicator computation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndicatorError {
    #[error("The {0} series is empty")]
    EmptySeries(SeriesRole),

    #[error("Positional alignment needs equal lengths (reference={reference}, cross={cross})")]
    LengthMismatch { reference: usize, cross: usize },

    #[error("Reference and cross series do not overlap in time")]
    NoOverlap,

    #[error("Indicator {0} is not a finite number")]
    NonFinite(&'static str),
}

/// Quote page scrape errors
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("Scrape request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Quote page returned status {0}")]
    Status(u16),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("No text found for selector {0}")]
    NodeNotFound(String),
}

/// Spreadsheet store errors
#[derive(Error, Debug)]
pub enum SheetError {
    #[error("Sheets request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Sheets API returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Could not decode Sheets response: {0}")]
    Decode(String),

    #[error("Sheets credentials missing: {0}")]
    MissingAuth(&'static str),

    #[error("Invalid spreadsheet range: {0}")]
    InvalidRange(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Failure of one pair evaluation
#[derive(Error, Debug)]
pub enum EvaluationError {
    #[error("Data unavailable: {0}")]
    Fetch(#[from] FetchError),

    #[error("Indicator computation failed: {0}")]
    Indicator(#[from] IndicatorError),
}

impl EvaluationError {
    /// True when the provider failed or returned nothing to compute on.
    pub fn is_data_unavailable(&self) -> bool {
        matches!(
            self,
            EvaluationError::Fetch(_) | EvaluationError::Indicator(IndicatorError::EmptySeries(_))
        )
    }
}
