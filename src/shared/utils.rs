//! Utility functions and helpers

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10_f64.powi(places as i32);
    (value * factor).round() / factor
}

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median; an even-length slice yields the mean of the two middle values
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Format a signed delta with an explicit sign
pub fn format_delta(value: f64, places: u32) -> String {
    let places = places as usize;
    if value > 0.0 {
        format!("+{:.*}", places, value)
    } else {
        format!("{:.*}", places, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(102.970297, 2), 102.97);
        assert_eq!(round_to(9.123456, 4), 9.1235);
        assert_eq!(round_to(-0.04, 1), -0.0);
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(median(&[100.0, 102.0, 98.0, 104.0]), Some(101.0));
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[1300.0, 1310.0, 1290.0, 1320.0]), Some(1305.0));
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_format_delta() {
        assert_eq!(format_delta(13.5, 2), "+13.50");
        assert_eq!(format_delta(-0.0123, 4), "-0.0123");
    }
}
