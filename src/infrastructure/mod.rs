//! Infrastructure layer - clients for the external collaborators

pub mod market_data;
pub mod scrape;
pub mod sheets;

pub use market_data::{SeriesFetcher, SeriesRequest, YahooChartClient};
pub use scrape::QuoteScraper;
pub use sheets::{HistoricalRow, RowLayout, SheetsClient};
