//! fairfx - fair-value gauges for KRW currency pairs
//! USD/KRW is measured against the dollar index, JPY/KRW against the Nikkei 225

pub mod app;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod report;
pub mod shared;

// Re-export main types for convenience
pub use application::{Dashboard, EvaluationCycle, PairEvaluation};
pub use domain::indicator::{ConditionSet, IndicatorEngine, IndicatorSnapshot, Valuation};
pub use domain::pair::{PairId, PairSpec};
pub use infrastructure::market_data::{SeriesFetcher, YahooChartClient};
pub use shared::types::{Observation, PriceSeries};
