//! Application layer - use cases and services

pub mod dashboard;
pub mod evaluation;

pub use dashboard::{Dashboard, DashboardSettings, HistoryRanges};
pub use evaluation::{EvaluationCycle, PairEvaluation, RecentWindow};
