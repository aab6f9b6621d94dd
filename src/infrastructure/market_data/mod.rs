//! Market-data access

mod yahoo;

pub use yahoo::{YahooChartClient, DEFAULT_BASE_URL};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::shared::errors::FetchError;
use crate::shared::types::{Interval, PriceSeries};

/// Symbol and time window to fetch
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesRequest {
    pub symbol: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub interval: Interval,
}

impl SeriesRequest {
    pub fn new(symbol: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>, interval: Interval) -> Self {
        Self {
            symbol: symbol.into(),
            start,
            end,
            interval,
        }
    }
}

/// Source of close-price series
#[async_trait]
pub trait SeriesFetcher: Send + Sync {
    /// Fetch closes for the request window. An empty result is an error.
    async fn fetch(&self, request: &SeriesRequest) -> Result<PriceSeries, FetchError>;
}
