//! Row layouts of the historical snapshot sheets

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y. %m. %d %H:%M:%S",
];

/// Column layout of a sheet range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowLayout {
    /// `[fair, actual]`, no timestamp column
    FairActual,
    /// `[timestamp, fair, actual]`
    RateOnly,
    /// `[timestamp, period, fair, _, _, actual]`
    Full,
}

impl RowLayout {
    fn has_timestamp(&self) -> bool {
        !matches!(self, RowLayout::FairActual)
    }

    fn fair_column(&self) -> usize {
        match self {
            RowLayout::FairActual => 0,
            RowLayout::RateOnly => 1,
            RowLayout::Full => 2,
        }
    }

    fn actual_column(&self) -> usize {
        match self {
            RowLayout::FairActual => 1,
            RowLayout::RateOnly => 2,
            RowLayout::Full => 5,
        }
    }
}

/// One persisted snapshot: when, the fair estimate, the actual rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRow {
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<NaiveDateTime>,
    pub fair_value: f64,
    pub actual_value: f64,
}

impl HistoricalRow {
    pub fn new(timestamp: impl Into<String>, fair_value: f64, actual_value: f64) -> Self {
        let timestamp = timestamp.into();
        let recorded_at = parse_timestamp(&timestamp);
        Self {
            timestamp,
            recorded_at,
            fair_value,
            actual_value,
        }
    }

    /// `MM/DD HH:00` when the timestamp parses, the raw cell otherwise
    pub fn display_timestamp(&self) -> String {
        match self.recorded_at {
            Some(at) => at.format("%m/%d %H:00").to_string(),
            None if self.timestamp.is_empty() => "-".to_string(),
            None => self.timestamp.clone(),
        }
    }

    /// Cells laid out for appending to a range of `layout`
    pub fn to_cells(&self, layout: RowLayout) -> Vec<Value> {
        let timestamp = Value::String(self.timestamp.clone());
        let blank = || Value::String(String::new());
        match layout {
            RowLayout::FairActual => vec![Value::from(self.fair_value), Value::from(self.actual_value)],
            RowLayout::RateOnly => vec![timestamp, Value::from(self.fair_value), Value::from(self.actual_value)],
            RowLayout::Full => vec![
                timestamp,
                blank(),
                Value::from(self.fair_value),
                blank(),
                blank(),
                Value::from(self.actual_value),
            ],
        }
    }
}

/// Rows decoded from a range, with the count of rows that did not fit the layout
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedRows {
    pub rows: Vec<HistoricalRow>,
    pub skipped: usize,
}

pub fn parse_rows(values: &[Vec<Value>], layout: RowLayout) -> ParsedRows {
    let mut parsed = ParsedRows::default();
    for (i, cells) in values.iter().enumerate() {
        match parse_row(cells, layout) {
            Some(row) => parsed.rows.push(row),
            None => {
                warn!("Skipping sheet row {} ({:?} layout): {:?}", i + 1, layout, cells);
                parsed.skipped += 1;
            }
        }
    }
    parsed
}

fn parse_row(cells: &[Value], layout: RowLayout) -> Option<HistoricalRow> {
    let timestamp = if layout.has_timestamp() {
        cell_text(cells.first()?)?
    } else {
        String::new()
    };
    let fair_value = cell_number(cells.get(layout.fair_column())?)?;
    let actual_value = cell_number(cells.get(layout.actual_column())?)?;
    Some(HistoricalRow::new(timestamp, fair_value, actual_value))
}

fn cell_text(cell: &Value) -> Option<String> {
    match cell {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn cell_number(cell: &Value) -> Option<f64> {
    match cell {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    }
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw.trim(), fmt).ok())
}

/// Most recent `n` rows first; rows are stored oldest first
pub fn trend(rows: &[HistoricalRow], n: usize) -> Vec<HistoricalRow> {
    rows.iter().rev().take(n).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cells(v: Value) -> Vec<Vec<Value>> {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn test_rate_only_layout() {
        let values = cells(json!([
            ["2024-05-01 09:00:00", "1,350.25", "1,362.10"],
            ["2024-05-01 10:00:00", "1351.00", 1360.5]
        ]));
        let parsed = parse_rows(&values, RowLayout::RateOnly);
        assert_eq!(parsed.skipped, 0);
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[0].fair_value, 1350.25);
        assert_eq!(parsed.rows[0].actual_value, 1362.10);
        assert_eq!(parsed.rows[1].actual_value, 1360.5);
        assert_eq!(parsed.rows[0].display_timestamp(), "05/01 09:00");
    }

    #[test]
    fn test_full_layout_discards_middle_columns() {
        let values = cells(json!([
            ["2024-05-01 09:00", "4w", "9.0412", "x", "y", "9.1034"]
        ]));
        let parsed = parse_rows(&values, RowLayout::Full);
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].fair_value, 9.0412);
        assert_eq!(parsed.rows[0].actual_value, 9.1034);
    }

    #[test]
    fn test_fair_actual_layout_has_no_timestamp() {
        let values = cells(json!([
            ["1,350.25", "1,362.10"],
            ["1351.00", 1360.5],
            ["1352.00"]
        ]));
        let parsed = parse_rows(&values, RowLayout::FairActual);
        assert_eq!(parsed.skipped, 1);
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[0].fair_value, 1350.25);
        assert_eq!(parsed.rows[1].actual_value, 1360.5);
        assert_eq!(parsed.rows[0].display_timestamp(), "-");

        // the same two-column sheet does not fit the timestamped layout
        assert_eq!(parse_rows(&values, RowLayout::RateOnly).rows.len(), 0);
    }

    #[test]
    fn test_cells_follow_layout() {
        let row = HistoricalRow::new("2024-05-01 12:00:00", 1343.67, 1320.0);
        assert_eq!(row.to_cells(RowLayout::FairActual), vec![json!(1343.67), json!(1320.0)]);
        assert_eq!(row.to_cells(RowLayout::RateOnly)[0], json!("2024-05-01 12:00:00"));
        let full = row.to_cells(RowLayout::Full);
        assert_eq!(full.len(), 6);
        assert_eq!(full[2], json!(1343.67));
        assert_eq!(full[5], json!(1320.0));
    }

    #[test]
    fn test_short_and_malformed_rows_are_skipped() {
        let values = cells(json!([
            ["2024-05-01 09:00:00", "1350"],
            ["2024-05-01 10:00:00", "n/a", "1360"],
            ["", "1350", "1360"],
            ["2024-05-01 11:00:00", "1352", "1361"]
        ]));
        let parsed = parse_rows(&values, RowLayout::RateOnly);
        assert_eq!(parsed.skipped, 3);
        assert_eq!(parsed.rows.len(), 1);
    }

    #[test]
    fn test_unparsed_timestamp_is_kept_raw() {
        let row = HistoricalRow::new("yesterday noon", 1.0, 2.0);
        assert_eq!(row.recorded_at, None);
        assert_eq!(row.display_timestamp(), "yesterday noon");
    }

    #[test]
    fn test_trend_reverses_and_truncates() {
        let rows: Vec<HistoricalRow> = (0..30)
            .map(|i| HistoricalRow::new(format!("row {}", i), i as f64, i as f64))
            .collect();
        let recent = trend(&rows, 24);
        assert_eq!(recent.len(), 24);
        assert_eq!(recent[0].timestamp, "row 29");
        assert_eq!(recent[23].timestamp, "row 6");

        assert_eq!(trend(&rows[..3], 24).len(), 3);
    }
}
