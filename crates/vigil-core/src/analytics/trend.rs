//! Trend fitting with ordinary least squares
//!
//! x is the 0-based day index within the series, y is the day's value.

use super::types::{TimeSeriesPoint, TrendKind, TrendResult};

/// |slope| below this is considered flat
pub const STABLE_SLOPE: f64 = 0.01;

pub struct TrendFitter;

impl TrendFitter {
    /// Fit a line through the series
    ///
    /// Fewer than two points cannot define a slope: the result is a flat,
    /// stable line through the mean (or 0 when empty) with R² of 0.
    pub fn fit(series: &[TimeSeriesPoint]) -> TrendResult {
        let n = series.len();
        if n < 2 {
            let intercept = series.first().map(|p| p.value).unwrap_or(0.0);
            return TrendResult::flat(intercept);
        }

        let n_f = n as f64;
        let mean_x = (n_f - 1.0) / 2.0;
        let mean_y = series.iter().map(|p| p.value).sum::<f64>() / n_f;

        let (mut sxy, mut sxx) = (0.0, 0.0);
        for (i, point) in series.iter().enumerate() {
            let dx = i as f64 - mean_x;
            sxy += dx * (point.value - mean_y);
            sxx += dx * dx;
        }

        // sxx > 0 whenever n >= 2
        let slope = sxy / sxx;
        let intercept = mean_y - slope * mean_x;

        let (mut ss_res, mut ss_tot) = (0.0, 0.0);
        for (i, point) in series.iter().enumerate() {
            let predicted = slope * i as f64 + intercept;
            ss_res += (point.value - predicted).powi(2);
            ss_tot += (point.value - mean_y).powi(2);
        }

        let r_squared = if ss_tot > 0.0 {
            (1.0 - ss_res / ss_tot).clamp(0.0, 1.0)
        } else {
            0.0
        };

        TrendResult {
            trend_kind: classify(slope),
            slope,
            intercept,
            r_squared,
        }
    }
}

/// Direction of a slope
///
/// A slope sitting exactly on ±0.01 is neither stable nor directional and
/// reads as volatile.
pub fn classify(slope: f64) -> TrendKind {
    if slope.abs() < STABLE_SLOPE {
        TrendKind::Stable
    } else if slope > STABLE_SLOPE {
        TrendKind::Increasing
    } else if slope < -STABLE_SLOPE {
        TrendKind::Decreasing
    } else {
        TrendKind::Volatile
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn series(values: &[f64]) -> Vec<TimeSeriesPoint> {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, v)| TimeSeriesPoint::new(start + Duration::days(i as i64), *v))
            .collect()
    }

    #[test]
    fn test_perfect_line() {
        let values: Vec<f64> = (0..30).map(|i| i as f64 * 2.0 + 10.0).collect();
        let trend = TrendFitter::fit(&series(&values));

        assert!((trend.slope - 2.0).abs() < 1e-9);
        assert!((trend.intercept - 10.0).abs() < 1e-9);
        assert!((trend.r_squared - 1.0).abs() < 1e-9);
        assert_eq!(trend.trend_kind, TrendKind::Increasing);
    }

    #[test]
    fn test_unit_line() {
        let trend = TrendFitter::fit(&series(&[1.0, 2.0, 3.0, 4.0, 5.0]));

        assert!((trend.slope - 1.0).abs() < 1e-9);
        assert!((trend.intercept - 1.0).abs() < 1e-9);
        assert!((trend.r_squared - 1.0).abs() < 1e-9);
        assert_eq!(trend.trend_kind, TrendKind::Increasing);
    }

    #[test]
    fn test_constant_series() {
        let trend = TrendFitter::fit(&series(&[5.0; 10]));
        assert_eq!(trend.slope, 0.0);
        assert!((trend.intercept - 5.0).abs() < 1e-9);
        assert_eq!(trend.r_squared, 0.0);
        assert_eq!(trend.trend_kind, TrendKind::Stable);
    }

    #[test]
    fn test_decreasing() {
        let values: Vec<f64> = (0..20).map(|i| 100.0 - i as f64 * 3.0).collect();
        let trend = TrendFitter::fit(&series(&values));
        assert!((trend.slope + 3.0).abs() < 1e-9);
        assert_eq!(trend.trend_kind, TrendKind::Decreasing);
    }

    #[test]
    fn test_short_series() {
        let empty = TrendFitter::fit(&[]);
        assert_eq!(empty, TrendResult::flat(0.0));

        let single = TrendFitter::fit(&series(&[7.5]));
        assert_eq!(single.slope, 0.0);
        assert_eq!(single.intercept, 7.5);
        assert_eq!(single.r_squared, 0.0);
        assert_eq!(single.trend_kind, TrendKind::Stable);
    }

    #[test]
    fn test_two_points() {
        let trend = TrendFitter::fit(&series(&[1.0, 4.0]));
        assert!((trend.slope - 3.0).abs() < 1e-9);
        assert!((trend.intercept - 1.0).abs() < 1e-9);
        assert!((trend.r_squared - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_classification_boundaries() {
        assert_eq!(classify(0.0), TrendKind::Stable);
        assert_eq!(classify(0.0099), TrendKind::Stable);
        assert_eq!(classify(-0.0099), TrendKind::Stable);
        assert_eq!(classify(0.0101), TrendKind::Increasing);
        assert_eq!(classify(-0.0101), TrendKind::Decreasing);
        assert_eq!(classify(0.01), TrendKind::Volatile);
        assert_eq!(classify(-0.01), TrendKind::Volatile);
    }

    #[test]
    fn test_noisy_fit_r_squared_in_bounds() {
        let values = [3.0, 9.0, 1.0, 7.0, 2.0, 8.0, 4.0, 6.0, 5.0, 0.0];
        let trend = TrendFitter::fit(&series(&values));
        assert!((0.0..=1.0).contains(&trend.r_squared));
        assert!(trend.r_squared < 0.5);
    }
}
