//! Fair-value indicator computation

use tracing::debug;

use super::{aligned_ratios, AlignmentPolicy, IndicatorSnapshot, Precision};
use crate::shared::errors::{IndicatorError, SeriesRole};
use crate::shared::types::PriceSeries;
use crate::shared::utils::{mean, median, round_to};

/// Turns a reference index series and a cross-rate series into an
/// [`IndicatorSnapshot`]. Pure; holds only its parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndicatorEngine {
    precision: Precision,
    alignment: AlignmentPolicy,
}

impl IndicatorEngine {
    pub fn new(precision: Precision, alignment: AlignmentPolicy) -> Self {
        Self { precision, alignment }
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// Each value is rounded to its class precision and later steps use the
    /// rounded figures.
    pub fn compute(
        &self,
        reference: &PriceSeries,
        cross: &PriceSeries,
    ) -> Result<IndicatorSnapshot, IndicatorError> {
        let p = self.precision;

        let ref_closes = reference.closes();
        let cross_closes = cross.closes();
        let (Some(&last_ref), Some(&last_cross)) = (ref_closes.last(), cross_closes.last()) else {
            let role = if ref_closes.is_empty() { SeriesRole::Reference } else { SeriesRole::Cross };
            return Err(IndicatorError::EmptySeries(role));
        };

        let latest_reference = finite("latest_reference", round_to(last_ref, p.index))?;
        let latest_cross = finite("latest_cross", round_to(last_cross, p.rate))?;
        let previous_cross = cross.previous_close().map(|c| round_to(c, p.rate));

        let median_reference = finite(
            "median_reference",
            round_to(median(&ref_closes).unwrap_or(f64::NAN), p.index),
        )?;
        let median_cross = finite(
            "median_cross",
            round_to(median(&cross_closes).unwrap_or(f64::NAN), p.rate),
        )?;
        let mean_reference = finite(
            "mean_reference",
            round_to(mean(&ref_closes).unwrap_or(f64::NAN), p.index),
        )?;
        let mean_cross = finite(
            "mean_cross",
            round_to(mean(&cross_closes).unwrap_or(f64::NAN), p.rate),
        )?;

        let gap_ratio = finite(
            "gap_ratio",
            round_to(latest_reference / median_reference * 100.0, p.ratio),
        )?;

        let ratios = aligned_ratios(reference, cross, self.alignment)?;
        let avg_gap_ratio = finite(
            "avg_gap_ratio",
            round_to(mean(&ratios).unwrap_or(f64::NAN) * 100.0, p.ratio),
        )?;

        let estimated_fair_cross = finite(
            "estimated_fair_cross",
            round_to(latest_reference / avg_gap_ratio * 100.0, p.rate),
        )?;
        let gap_percentage = finite(
            "gap_percentage",
            round_to(
                (latest_reference - median_reference) / median_reference * 100.0,
                p.percentage,
            ),
        )?;
        let gap_ratio_new = finite(
            "gap_ratio_new",
            round_to(latest_reference / median_cross * 100.0, p.ratio),
        )?;

        debug!(
            reference = reference.symbol(),
            cross = cross.symbol(),
            paired = ratios.len(),
            avg_gap_ratio,
            estimated_fair_cross,
            "indicators computed"
        );

        Ok(IndicatorSnapshot {
            latest_reference,
            latest_cross,
            previous_cross,
            median_reference,
            median_cross,
            mean_reference,
            mean_cross,
            gap_ratio,
            avg_gap_ratio,
            estimated_fair_cross,
            gap_percentage,
            gap_ratio_new,
            precision: p,
        })
    }
}

fn finite(name: &'static str, value: f64) -> Result<f64, IndicatorError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(IndicatorError::NonFinite(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::{DeltaBaseline, Valuation};
    use crate::shared::types::Observation;
    use chrono::{Duration, TimeZone, Utc};

    fn series(symbol: &str, closes: &[f64]) -> PriceSeries {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let observations = closes
            .iter()
            .enumerate()
            .map(|(i, c)| Observation::new(start + Duration::days(i as i64), *c))
            .collect();
        PriceSeries::new(symbol, observations).unwrap()
    }

    fn usd_engine() -> IndicatorEngine {
        IndicatorEngine::new(Precision::whole_unit(), AlignmentPolicy::Positional)
    }

    #[test]
    fn test_dollar_index_scenario() {
        let reference = series("DX-Y.NYB", &[100.0, 102.0, 98.0, 104.0]);
        let cross = series("USDKRW=X", &[1300.0, 1310.0, 1290.0, 1320.0]);

        let snap = usd_engine().compute(&reference, &cross).unwrap();

        assert_eq!(snap.latest_reference, 104.0);
        assert_eq!(snap.median_reference, 101.0);
        assert_eq!(snap.mean_reference, 101.0);
        assert_eq!(snap.latest_cross, 1320.0);
        assert_eq!(snap.mean_cross, 1305.0);
        assert_eq!(snap.gap_ratio, 102.97);
        assert_eq!(snap.avg_gap_ratio, 7.74);
        assert_eq!(snap.estimated_fair_cross, 1343.67);
        assert_eq!(snap.gap_percentage, 3.0);
        assert_eq!(snap.gap_ratio_new, 7.97);
        assert_eq!(snap.previous_cross, Some(1290.0));

        let conditions = snap.conditions();
        assert!(!conditions.c1);
        assert!(!conditions.c2);
        assert!(conditions.c3);
        assert!(conditions.c4);
        assert_eq!(conditions.satisfied(), 2);

        assert!(snap.is_fair_value());
        assert_eq!(snap.valuation(), Valuation::Fair);
        assert_eq!(snap.delta(DeltaBaseline::FairEstimate), -23.67);
        assert_eq!(snap.delta(DeltaBaseline::PreviousClose), 30.0);
    }

    #[test]
    fn test_avg_gap_ratio_is_mean_of_elementwise_ratios() {
        let refs = [98.5, 99.1, 101.7, 100.2, 103.9];
        let crosses = [1288.0, 1301.5, 1333.2, 1319.9, 1350.4];
        let snap = usd_engine()
            .compute(&series("R", &refs), &series("C", &crosses))
            .unwrap();

        let expected = refs.iter().zip(crosses.iter()).map(|(r, c)| r / c).sum::<f64>()
            / refs.len() as f64
            * 100.0;
        assert!((snap.avg_gap_ratio - expected).abs() <= 0.005);
    }

    #[test]
    fn test_gap_percentage_sign() {
        let cross = series("C", &[10.0, 10.0, 10.0]);
        let engine = usd_engine();

        let flat = engine.compute(&series("R", &[100.0, 90.0, 100.0]), &cross).unwrap();
        assert_eq!(flat.gap_percentage, 0.0);

        let above = engine.compute(&series("R", &[100.0, 90.0, 120.0]), &cross).unwrap();
        assert!(above.gap_percentage > 0.0);

        let below = engine.compute(&series("R", &[100.0, 110.0, 80.0]), &cross).unwrap();
        assert!(below.gap_percentage < 0.0);
    }

    #[test]
    fn test_c4_always_matches_fair_value() {
        let engine = usd_engine();
        let reference = series("R", &[100.0, 101.0, 102.0]);
        for last in [1200.0, 1290.0, 1300.0, 1350.0, 1500.0] {
            let cross = series("C", &[1300.0, 1300.0, last]);
            let snap = engine.compute(&reference, &cross).unwrap();
            assert_eq!(snap.conditions().c4, snap.is_fair_value());
            assert_eq!(snap.is_fair_value(), snap.latest_cross < snap.estimated_fair_cross);
        }
    }

    #[test]
    fn test_empty_series_yields_no_snapshot() {
        let engine = usd_engine();
        let full = series("C", &[1300.0]);
        let empty = PriceSeries::new("E", vec![]).unwrap();

        assert_eq!(
            engine.compute(&empty, &full),
            Err(IndicatorError::EmptySeries(SeriesRole::Reference))
        );
        assert_eq!(
            engine.compute(&full, &empty),
            Err(IndicatorError::EmptySeries(SeriesRole::Cross))
        );
    }

    #[test]
    fn test_zero_median_is_non_finite() {
        let engine = usd_engine();
        let result = engine.compute(&series("R", &[0.0, 0.0, 0.0]), &series("C", &[1.0, 1.0, 1.0]));
        assert_eq!(result, Err(IndicatorError::NonFinite("gap_ratio")));
    }

    #[test]
    fn test_rounding_is_deterministic() {
        let engine = IndicatorEngine::new(Precision::small_unit(), AlignmentPolicy::Positional);
        let reference = series("^N225", &[38_210.55, 38_402.11, 37_990.02, 38_620.87]);
        let cross = series("KRWJPY=X", &[0.11321, 0.11298, 0.11345, 0.11310])
            .inverted()
            .unwrap();

        let first = engine.compute(&reference, &cross).unwrap();
        let second = engine.compute(&reference, &cross).unwrap();
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
        // four places for a rate under ten won
        assert_eq!(first.latest_cross, round_to(1.0 / 0.11310, 4));
    }
}
