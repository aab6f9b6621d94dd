// src/report.rs
use std::fmt::{self, Display};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::application::evaluation::PairEvaluation;
use crate::domain::indicator::DeltaBaseline;
use crate::domain::pair::{PairId, PairSpec};
use crate::infrastructure::sheets::HistoricalRow;
use crate::shared::utils::format_delta;

/// A report section that either loaded or failed with a reportable message
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum Section<T> {
    Ready(T),
    Failed { message: String },
}

impl<T> Section<T> {
    pub fn failed(err: impl Display) -> Self {
        Section::Failed { message: err.to_string() }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Section::Ready(value) => Some(value),
            Section::Failed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryView {
    /// rate-only rows, most recent first
    pub trend: Vec<HistoricalRow>,
    /// full-layout rows, most recent first
    pub table: Vec<HistoricalRow>,
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairReport {
    pub pair: PairId,
    pub label: String,
    pub lookback_weeks: u32,
    pub condition_labels: [String; 4],
    pub evaluation: Section<PairEvaluation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote: Option<Section<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Section<HistoryView>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recorded: Option<Section<String>>,
}

impl PairReport {
    pub fn new(spec: &PairSpec, lookback_weeks: u32, evaluation: Section<PairEvaluation>) -> Self {
        Self {
            pair: spec.id,
            label: spec.label.to_string(),
            lookback_weeks,
            condition_labels: spec.condition_labels(lookback_weeks),
            evaluation,
            quote: None,
            history: None,
            recorded: None,
        }
    }
}

impl Display for PairReport {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(out, "== {} fair value ==", self.label)?;

        if let Some(quote) = &self.quote {
            match quote {
                Section::Ready(text) => writeln!(out, "Quote page: {}", text.replace('\n', " "))?,
                Section::Failed { message } => writeln!(out, "Quote page unavailable: {}", message)?,
            }
        }

        match &self.evaluation {
            Section::Ready(eval) => {
                let snap = &eval.snapshot;
                let places = snap.precision.rate as usize;
                let metric = match (eval.delta_baseline, snap.previous_cross) {
                    (DeltaBaseline::PreviousClose, Some(previous)) => format!(
                        "Yahoo Finance (previous close {:.*} KRW, now {:.*} KRW)",
                        places, previous, places, snap.latest_cross
                    ),
                    _ => format!("Yahoo Finance now: {:.*} KRW", places, snap.latest_cross),
                };
                writeln!(
                    out,
                    "{}  {}  {} KRW",
                    metric,
                    eval.valuation.icon(),
                    format_delta(eval.delta, snap.precision.rate)
                )?;
                writeln!(
                    out,
                    "{} is {} against a fair rate of {:.*} KRW.",
                    self.label,
                    eval.valuation.label(),
                    places,
                    snap.estimated_fair_cross
                )?;
                for (i, (label, met)) in self
                    .condition_labels
                    .iter()
                    .zip(eval.conditions.as_array())
                    .enumerate()
                {
                    writeln!(out, "C{} ({}): {}", i + 1, label, if met { "✅" } else { "❌" })?;
                }
                writeln!(
                    out,
                    "Last {}h: {} quotes",
                    eval.recent.hours, eval.recent.count
                )?;
            }
            Section::Failed { message } => {
                writeln!(out, "{} could not be evaluated: {}", self.label, message)?;
            }
        }

        match &self.history {
            Some(Section::Ready(history)) => {
                writeln!(out, "Trend (last {} rows):", history.trend.len())?;
                render_rows(out, &history.trend)?;
                writeln!(out, "History (last {} rows):", history.table.len())?;
                render_rows(out, &history.table)?;
                if history.skipped > 0 {
                    writeln!(out, "({} malformed sheet rows skipped)", history.skipped)?;
                }
            }
            Some(Section::Failed { message }) => writeln!(out, "History unavailable: {}", message)?,
            None => {}
        }

        match &self.recorded {
            Some(Section::Ready(range)) => writeln!(out, "Snapshot recorded to {}", range)?,
            Some(Section::Failed { message }) => writeln!(out, "Snapshot not recorded: {}", message)?,
            None => {}
        }
        Ok(())
    }
}

fn render_rows(out: &mut fmt::Formatter<'_>, rows: &[HistoricalRow]) -> fmt::Result {
    writeln!(out, "  {:<20} {:>12} {:>12}", "time", "fair", "actual")?;
    for row in rows {
        writeln!(
            out,
            "  {:<20} {:>12} {:>12}",
            row.display_timestamp(),
            row.fair_value,
            row.actual_value
        )?;
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub generated_at: DateTime<Utc>,
    pub pairs: Vec<PairReport>,
}

impl DashboardReport {
    pub fn new(generated_at: DateTime<Utc>, pairs: Vec<PairReport>) -> Self {
        Self { generated_at, pairs }
    }

    /// True when at least one pair produced a snapshot
    pub fn any_evaluated(&self) -> bool {
        self.pairs.iter().any(|p| p.evaluation.ready().is_some())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for (i, pair) in self.pairs.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&pair.to_string());
        }
        out
    }
}
