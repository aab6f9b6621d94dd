//! One evaluation cycle: fetch both series, compute, classify

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::indicator::{
    AlignmentPolicy, ConditionSet, DeltaBaseline, IndicatorEngine, IndicatorSnapshot, Valuation,
};
use crate::domain::pair::{PairId, PairSpec};
use crate::infrastructure::market_data::{SeriesFetcher, SeriesRequest};
use crate::shared::errors::EvaluationError;
use crate::shared::types::PriceSeries;

/// Cross-rate observations inside the recent window. Reported only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentWindow {
    pub hours: u32,
    pub count: usize,
    pub low: Option<f64>,
    pub high: Option<f64>,
}

impl RecentWindow {
    fn from_series(series: &PriceSeries, now: DateTime<Utc>, hours: u32) -> Self {
        let recent = series.since(now - Duration::hours(hours as i64));
        let closes = recent.iter().map(|o| o.close);
        Self {
            hours,
            count: recent.len(),
            low: closes.clone().reduce(f64::min),
            high: closes.reduce(f64::max),
        }
    }
}

/// Result of evaluating one pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairEvaluation {
    pub pair: PairId,
    pub evaluated_at: DateTime<Utc>,
    pub window_start: DateTime<Utc>,
    pub reference_symbol: String,
    pub cross_symbol: String,
    pub reference_points: usize,
    pub cross_points: usize,
    pub recent: RecentWindow,
    pub snapshot: IndicatorSnapshot,
    pub conditions: ConditionSet,
    pub valuation: Valuation,
    pub delta_baseline: DeltaBaseline,
    pub delta: f64,
}

/// Fetcher plus window parameters; holds no state between evaluations
pub struct EvaluationCycle<'a> {
    fetcher: &'a dyn SeriesFetcher,
    lookback_weeks: u32,
    recent_hours: u32,
    alignment: AlignmentPolicy,
}

impl<'a> EvaluationCycle<'a> {
    pub fn new(
        fetcher: &'a dyn SeriesFetcher,
        lookback_weeks: u32,
        recent_hours: u32,
        alignment: AlignmentPolicy,
    ) -> Self {
        Self {
            fetcher,
            lookback_weeks,
            recent_hours,
            alignment,
        }
    }

    pub fn lookback_weeks(&self) -> u32 {
        self.lookback_weeks
    }

    /// Evaluate `spec` as of `now`. Any fetch failure aborts this pair only.
    pub async fn evaluate(&self, spec: &PairSpec, now: DateTime<Utc>) -> Result<PairEvaluation, EvaluationError> {
        let window_start = now - Duration::weeks(self.lookback_weeks as i64);
        info!("Evaluating {} over {} weeks", spec.label, self.lookback_weeks);

        let reference = self
            .fetcher
            .fetch(&SeriesRequest::new(spec.reference.symbol, window_start, now, spec.reference.interval))
            .await?;
        let raw_cross = self
            .fetcher
            .fetch(&SeriesRequest::new(spec.cross.symbol, window_start, now, spec.cross.interval))
            .await?;
        let cross = if spec.invert_cross {
            raw_cross.inverted()?
        } else {
            raw_cross
        };

        let recent = RecentWindow::from_series(&cross, now, self.recent_hours);

        let engine = IndicatorEngine::new(spec.precision, self.alignment);
        let snapshot = engine.compute(&reference, &cross)?;
        let conditions = snapshot.conditions();
        let valuation = snapshot.valuation();
        let delta = snapshot.delta(spec.delta_baseline);

        info!(
            "{}: {} vs fair {} -> {} ({}/4 conditions)",
            spec.label,
            snapshot.latest_cross,
            snapshot.estimated_fair_cross,
            valuation.label(),
            conditions.satisfied()
        );

        Ok(PairEvaluation {
            pair: spec.id,
            evaluated_at: now,
            window_start,
            reference_symbol: reference.symbol().to_string(),
            cross_symbol: cross.symbol().to_string(),
            reference_points: reference.len(),
            cross_points: cross.len(),
            recent,
            snapshot,
            conditions,
            valuation,
            delta_baseline: spec.delta_baseline,
            delta,
        })
    }
}
