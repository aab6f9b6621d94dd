//! Indicator domain - fair-value ratios for a reference index / cross rate pair

mod alignment;
mod engine;

pub use alignment::{aligned_ratios, AlignmentPolicy, DEFAULT_TOLERANCE_HOURS};
pub use engine::IndicatorEngine;

use serde::{Deserialize, Serialize};

use crate::shared::utils::round_to;

/// Decimal places per quantity class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Precision {
    /// Index-like values (dollar index, Nikkei 225)
    pub index: u32,
    /// Cross-rate values
    pub rate: u32,
    /// Gap ratios
    pub ratio: u32,
    /// Gap percentage
    pub percentage: u32,
}

impl Precision {
    /// Rates quoted in whole won (USD/KRW)
    pub const fn whole_unit() -> Self {
        Self { index: 2, rate: 2, ratio: 2, percentage: 1 }
    }

    /// Rates with a small unit value (JPY/KRW ~ 9.xx)
    pub const fn small_unit() -> Self {
        Self { index: 2, rate: 4, ratio: 2, percentage: 1 }
    }
}

impl Default for Precision {
    fn default() -> Self {
        Self::whole_unit()
    }
}

/// What the displayed delta is measured against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaBaseline {
    FairEstimate,
    PreviousClose,
}

/// Verdict for the cross rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Valuation {
    Fair,
    Overvalued,
}

impl Valuation {
    pub fn icon(&self) -> &'static str {
        match self {
            Valuation::Fair => "☀️",
            Valuation::Overvalued => "🌧️",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Valuation::Fair => "fair",
            Valuation::Overvalued => "overvalued",
        }
    }
}

/// Derived values for one evaluation instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub latest_reference: f64,
    pub latest_cross: f64,
    pub previous_cross: Option<f64>,
    pub median_reference: f64,
    pub median_cross: f64,
    pub mean_reference: f64,
    pub mean_cross: f64,
    /// latest / median of the reference index, in percent
    pub gap_ratio: f64,
    /// mean of reference[i] / cross[i], in percent
    pub avg_gap_ratio: f64,
    pub estimated_fair_cross: f64,
    pub gap_percentage: f64,
    /// latest reference / median cross, in percent
    pub gap_ratio_new: f64,
    pub precision: Precision,
}

/// The four fair-value conditions, evaluated independently
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionSet {
    /// cross rate below its window mean
    pub c1: bool,
    /// reference index below its window mean
    pub c2: bool,
    /// gap_ratio_new above avg_gap_ratio
    pub c3: bool,
    /// cross rate below the fair estimate
    pub c4: bool,
}

impl ConditionSet {
    pub fn as_array(&self) -> [bool; 4] {
        [self.c1, self.c2, self.c3, self.c4]
    }

    pub fn satisfied(&self) -> usize {
        self.as_array().iter().filter(|c| **c).count()
    }
}

impl IndicatorSnapshot {
    pub fn conditions(&self) -> ConditionSet {
        ConditionSet {
            c1: self.latest_cross < self.mean_cross,
            c2: self.latest_reference < self.mean_reference,
            c3: self.gap_ratio_new > self.avg_gap_ratio,
            c4: self.latest_cross < self.estimated_fair_cross,
        }
    }

    pub fn is_fair_value(&self) -> bool {
        self.latest_cross < self.estimated_fair_cross
    }

    pub fn valuation(&self) -> Valuation {
        if self.is_fair_value() {
            Valuation::Fair
        } else {
            Valuation::Overvalued
        }
    }

    /// Display delta. Falls back to the fair estimate when no previous close exists.
    pub fn delta(&self, baseline: DeltaBaseline) -> f64 {
        let base = match (baseline, self.previous_cross) {
            (DeltaBaseline::PreviousClose, Some(previous)) => previous,
            (DeltaBaseline::PreviousClose, None) => {
                tracing::warn!("No previous close available, delta measured against fair estimate");
                self.estimated_fair_cross
            }
            (DeltaBaseline::FairEstimate, _) => self.estimated_fair_cross,
        };
        round_to(self.latest_cross - base, self.precision.rate)
    }
}
