//! Weekly seasonality heuristic
//!
//! Not a textbook autocorrelation: for each lag between 7 and 14 days it takes
//! the mean signed difference `value[i] - value[i + lag]` and reports
//! seasonality when the largest absolute mean exceeds 0.3. Consumers only
//! need the boolean, and the formula is kept as is so the flag stays stable.

use super::types::TimeSeriesPoint;

/// Fewer points than this never report seasonality
pub const MIN_POINTS: usize = 14;
pub const MIN_LAG: usize = 7;
pub const MAX_LAG: usize = 14;
pub const THRESHOLD: f64 = 0.3;

pub struct SeasonalityDetector;

impl SeasonalityDetector {
    pub fn detect(series: &[TimeSeriesPoint]) -> bool {
        Self::max_lag_score(series).is_some_and(|score| score > THRESHOLD)
    }

    /// Largest |mean lagged difference| over the candidate lags
    ///
    /// `None` when the series is too short to test.
    pub fn max_lag_score(series: &[TimeSeriesPoint]) -> Option<f64> {
        let n = series.len();
        if n < MIN_POINTS {
            return None;
        }

        (MIN_LAG..=MAX_LAG)
            .filter(|&lag| lag < n)
            .map(|lag| {
                let pairs = n - lag;
                let total: f64 = (0..pairs)
                    .map(|i| series[i].value - series[i + lag].value)
                    .sum();
                (total / pairs as f64).abs()
            })
            .reduce(f64::max)
    }
}
