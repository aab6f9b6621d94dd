//! Common types used across the application

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::errors::FetchError;

/// Bar interval requested from the market-data provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1h")]
    Hourly,
    #[serde(rename = "1d")]
    Daily,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Hourly => "1h",
            Interval::Daily => "1d",
        }
    }
}

/// One close observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
}

impl Observation {
    pub fn new(timestamp: DateTime<Utc>, close: f64) -> Self {
        Self { timestamp, close }
    }
}

/// Time-ordered close series for one symbol, normalised to UTC
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: String,
    observations: Vec<Observation>,
}

impl PriceSeries {
    /// Build a series, rejecting observations that go back in time.
    pub fn new(symbol: impl Into<String>, observations: Vec<Observation>) -> Result<Self, FetchError> {
        let symbol = symbol.into();
        if observations.windows(2).any(|w| w[1].timestamp < w[0].timestamp) {
            return Err(FetchError::Unordered { symbol });
        }
        Ok(Self { symbol, observations })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.close).collect()
    }

    pub fn last(&self) -> Option<&Observation> {
        self.observations.last()
    }

    /// Close before the latest one
    pub fn previous_close(&self) -> Option<f64> {
        let n = self.observations.len();
        if n < 2 {
            return None;
        }
        Some(self.observations[n - 2].close)
    }

    /// Series with every close replaced by its reciprocal (KRW/JPY -> JPY/KRW).
    pub fn inverted(&self) -> Result<Self, FetchError> {
        let mut observations = Vec::with_capacity(self.observations.len());
        for obs in &self.observations {
            if obs.close == 0.0 || !obs.close.is_finite() {
                return Err(FetchError::InvalidClose { symbol: self.symbol.clone() });
            }
            observations.push(Observation::new(obs.timestamp, 1.0 / obs.close));
        }
        Ok(Self {
            symbol: self.symbol.clone(),
            observations,
        })
    }

    /// Observations at or after `cutoff`
    pub fn since(&self, cutoff: DateTime<Utc>) -> &[Observation] {
        let start = self.observations.partition_point(|o| o.timestamp < cutoff);
        &self.observations[start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn series(closes: &[f64]) -> PriceSeries {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let observations = closes
            .iter()
            .enumerate()
            .map(|(i, c)| Observation::new(start + Duration::hours(i as i64), *c))
            .collect();
        PriceSeries::new("TEST", observations).unwrap()
    }

    #[test]
    fn test_rejects_decreasing_timestamps() {
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let obs = vec![
            Observation::new(t, 1.0),
            Observation::new(t - Duration::hours(1), 2.0),
        ];
        assert!(matches!(
            PriceSeries::new("X", obs),
            Err(FetchError::Unordered { .. })
        ));
    }

    #[test]
    fn test_equal_timestamps_are_allowed() {
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let obs = vec![Observation::new(t, 1.0), Observation::new(t, 2.0)];
        assert_eq!(PriceSeries::new("X", obs).unwrap().len(), 2);
    }

    #[test]
    fn test_inverted() {
        let inv = series(&[0.1, 0.125]).inverted().unwrap();
        assert_eq!(inv.closes(), vec![10.0, 8.0]);
        assert_eq!(inv.symbol(), "TEST");
    }

    #[test]
    fn test_inverted_rejects_zero() {
        assert!(matches!(
            series(&[0.1, 0.0]).inverted(),
            Err(FetchError::InvalidClose { .. })
        ));
    }

    #[test]
    fn test_since_and_previous_close() {
        let s = series(&[1.0, 2.0, 3.0, 4.0]);
        let cutoff = Utc.with_ymd_and_hms(2024, 5, 1, 2, 0, 0).unwrap();
        let recent = s.since(cutoff);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].close, 3.0);
        assert_eq!(s.previous_close(), Some(3.0));
        assert_eq!(series(&[1.0]).previous_close(), None);
    }
}
