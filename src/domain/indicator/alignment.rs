//! Pairing reference and cross observations for the mean-of-ratio step

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::shared::errors::IndicatorError;
use crate::shared::types::PriceSeries;

/// Hourly quotes sit on the hour, so daily bars find an exact partner.
pub const DEFAULT_TOLERANCE_HOURS: i64 = 1;

/// How reference observations are matched with cross observations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum AlignmentPolicy {
    /// Match by position; both series must have the same length.
    Positional,
    /// Each reference observation takes the cross observation nearest to
    /// its timestamp, if that one is no further than `tolerance` away.
    /// Ties go to the earlier cross observation.
    Timestamp {
        #[serde(with = "tolerance_hours")]
        tolerance: Duration,
    },
}

impl Default for AlignmentPolicy {
    fn default() -> Self {
        AlignmentPolicy::timestamp_hours(DEFAULT_TOLERANCE_HOURS)
    }
}

impl AlignmentPolicy {
    pub fn timestamp_hours(hours: i64) -> Self {
        AlignmentPolicy::Timestamp { tolerance: Duration::hours(hours) }
    }
}

/// Elementwise `reference / cross` over the aligned observations.
pub fn aligned_ratios(
    reference: &PriceSeries,
    cross: &PriceSeries,
    policy: AlignmentPolicy,
) -> Result<Vec<f64>, IndicatorError> {
    match policy {
        AlignmentPolicy::Positional => {
            if reference.len() != cross.len() {
                return Err(IndicatorError::LengthMismatch {
                    reference: reference.len(),
                    cross: cross.len(),
                });
            }
            Ok(reference
                .observations()
                .iter()
                .zip(cross.observations())
                .map(|(r, c)| r.close / c.close)
                .collect())
        }
        AlignmentPolicy::Timestamp { tolerance } => {
            let cross_obs = cross.observations();
            let mut ratios = Vec::with_capacity(reference.len());
            for r in reference.observations() {
                let idx = cross_obs.partition_point(|c| c.timestamp < r.timestamp);
                let before = idx.checked_sub(1).map(|i| &cross_obs[i]);
                let after = cross_obs.get(idx);
                let partner = match (before, after) {
                    (Some(b), Some(a)) => {
                        if a.timestamp - r.timestamp < r.timestamp - b.timestamp {
                            a
                        } else {
                            b
                        }
                    }
                    (Some(b), None) => b,
                    (None, Some(a)) => a,
                    (None, None) => continue,
                };
                let gap = if partner.timestamp >= r.timestamp {
                    partner.timestamp - r.timestamp
                } else {
                    r.timestamp - partner.timestamp
                };
                if gap > tolerance {
                    continue;
                }
                ratios.push(r.close / partner.close);
            }
            if ratios.is_empty() {
                return Err(IndicatorError::NoOverlap);
            }
            Ok(ratios)
        }
    }
}

mod tolerance_hours {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_i64(d.num_hours())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::hours(i64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::types::Observation;
    use chrono::{TimeZone, Utc};

    fn at(day: u32, hour: u32, close: f64) -> Observation {
        Observation::new(Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap(), close)
    }

    #[test]
    fn test_positional_requires_equal_length() {
        let r = PriceSeries::new("R", vec![at(1, 0, 100.0), at(2, 0, 102.0)]).unwrap();
        let c = PriceSeries::new("C", vec![at(1, 0, 1300.0)]).unwrap();
        assert_eq!(
            aligned_ratios(&r, &c, AlignmentPolicy::Positional),
            Err(IndicatorError::LengthMismatch { reference: 2, cross: 1 })
        );
    }

    #[test]
    fn test_positional_ignores_timestamps() {
        let r = PriceSeries::new("R", vec![at(1, 0, 100.0), at(2, 0, 200.0)]).unwrap();
        let c = PriceSeries::new("C", vec![at(9, 0, 50.0), at(9, 1, 100.0)]).unwrap();
        let ratios = aligned_ratios(&r, &c, AlignmentPolicy::Positional).unwrap();
        assert_eq!(ratios, vec![2.0, 2.0]);
    }

    #[test]
    fn test_default_is_timestamp_join() {
        assert_eq!(AlignmentPolicy::default(), AlignmentPolicy::timestamp_hours(1));
    }

    #[test]
    fn test_timestamp_join_prefers_nearest_then_earlier() {
        let r = PriceSeries::new("R", vec![at(1, 4, 100.0), at(2, 4, 200.0)]).unwrap();
        let c = PriceSeries::new(
            "C",
            vec![at(1, 3, 1000.0), at(1, 6, 2000.0), at(2, 2, 500.0), at(2, 6, 800.0)],
        )
        .unwrap();
        let ratios = aligned_ratios(&r, &c, AlignmentPolicy::timestamp_hours(3)).unwrap();
        assert_eq!(ratios, vec![100.0 / 1000.0, 200.0 / 500.0]);
    }

    #[test]
    fn test_timestamp_join_takes_exact_partner() {
        // daily reference bars against hourly cross quotes
        let r = PriceSeries::new("R", vec![at(1, 0, 100.0), at(2, 0, 110.0)]).unwrap();
        let c = PriceSeries::new(
            "C",
            vec![at(1, 0, 1000.0), at(1, 23, 1250.0), at(2, 0, 1100.0), at(2, 5, 1400.0)],
        )
        .unwrap();
        let ratios = aligned_ratios(&r, &c, AlignmentPolicy::timestamp_hours(1)).unwrap();
        assert_eq!(ratios, vec![100.0 / 1000.0, 110.0 / 1100.0]);
    }

    #[test]
    fn test_timestamp_join_drops_unmatched_reference() {
        let r = PriceSeries::new("R", vec![at(1, 0, 100.0), at(10, 0, 110.0)]).unwrap();
        let c = PriceSeries::new("C", vec![at(1, 0, 1000.0)]).unwrap();
        let ratios = aligned_ratios(&r, &c, AlignmentPolicy::timestamp_hours(2)).unwrap();
        assert_eq!(ratios, vec![0.1]);
    }

    #[test]
    fn test_timestamp_join_without_overlap() {
        let r = PriceSeries::new("R", vec![at(1, 0, 100.0)]).unwrap();
        let c = PriceSeries::new("C", vec![at(5, 0, 1000.0)]).unwrap();
        assert_eq!(
            aligned_ratios(&r, &c, AlignmentPolicy::timestamp_hours(24)),
            Err(IndicatorError::NoOverlap)
        );
    }
}
