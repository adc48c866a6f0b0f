//! Linear forecast with a normal-approximation confidence band

use chrono::Duration;

use super::types::{round2, ForecastPoint, TimeSeriesPoint, TrendResult};

/// z for a two-sided 95% band
pub const BAND_Z: f64 = 1.96;
pub const MIN_CONFIDENCE: f64 = 0.1;
pub const MAX_CONFIDENCE: f64 = 0.95;

pub struct Forecaster;

impl Forecaster {
    /// Extend the trend line `horizon` days past the last observed date
    ///
    /// Predictions and both bounds are clamped to be non-negative. An empty
    /// series has no date to continue from and yields no forecast. The
    /// forecast stops early at the last representable date.
    pub fn forecast(
        series: &[TimeSeriesPoint],
        trend: &TrendResult,
        sigma: f64,
        horizon: usize,
    ) -> Vec<ForecastPoint> {
        let Some(last) = series.last() else {
            return Vec::new();
        };
        let n = series.len();
        let band = BAND_Z * if sigma.is_finite() { sigma.max(0.0) } else { 0.0 };
        let confidence = trend.r_squared.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE);

        (1..=horizon)
            .map_while(|k| {
                let date = last.date.checked_add_signed(Duration::days(k as i64))?;
                let predicted = trend.predict(n + k - 1).max(0.0);
                Some(ForecastPoint {
                    date,
                    predicted_value: round2(predicted),
                    upper_bound: round2((predicted + band).max(0.0)),
                    lower_bound: round2((predicted - band).max(0.0)),
                    confidence,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::anomaly::standard_deviation;
    use crate::analytics::trend::TrendFitter;
    use chrono::NaiveDate;

    fn series(values: &[f64]) -> Vec<TimeSeriesPoint> {
        let start = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, v)| TimeSeriesPoint::new(start + Duration::days(i as i64), *v))
            .collect()
    }

    #[test]
    fn test_horizon_length_and_dates() {
        let s = series(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let trend = TrendFitter::fit(&s);
        let forecast = Forecaster::forecast(&s, &trend, standard_deviation(&s), 7);

        assert_eq!(forecast.len(), 7);
        assert_eq!(forecast[0].date, NaiveDate::from_ymd_opt(2026, 8, 6).unwrap());
        assert_eq!(forecast[6].date, NaiveDate::from_ymd_opt(2026, 8, 12).unwrap());
        for pair in forecast.windows(2) {
            assert_eq!(pair[1].date - pair[0].date, Duration::days(1));
        }
    }

    #[test]
    fn test_future_index_continues_series() {
        // y = i + 1, so index 5 predicts 6
        let s = series(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let trend = TrendFitter::fit(&s);
        let forecast = Forecaster::forecast(&s, &trend, 0.0, 3);

        let values: Vec<f64> = forecast.iter().map(|f| f.predicted_value).collect();
        assert_eq!(values, vec![6.0, 7.0, 8.0]);
        assert!(forecast.iter().all(|f| f.upper_bound == f.lower_bound));
        assert_eq!(forecast[0].confidence, MAX_CONFIDENCE);
    }

    #[test]
    fn test_band_width() {
        let s = series(&[10.0, 10.0, 10.0]);
        let trend = TrendFitter::fit(&s);
        let forecast = Forecaster::forecast(&s, &trend, 2.0, 1);

        assert_eq!(forecast[0].predicted_value, 10.0);
        assert_eq!(forecast[0].upper_bound, 13.92);
        assert_eq!(forecast[0].lower_bound, 6.08);
        // R² of a flat series is 0, floored to the minimum confidence
        assert_eq!(forecast[0].confidence, MIN_CONFIDENCE);
    }

    #[test]
    fn test_never_negative() {
        let values: Vec<f64> = (0..30).map(|i| 300.0 - i as f64 * 10.0).collect();
        let s = series(&values);
        let trend = TrendFitter::fit(&s);
        let forecast = Forecaster::forecast(&s, &trend, standard_deviation(&s), 365);

        assert_eq!(forecast.len(), 365);
        for point in &forecast {
            assert!(point.predicted_value >= 0.0);
            assert!(point.lower_bound >= 0.0);
            assert!(point.upper_bound >= point.lower_bound);
        }
        assert_eq!(forecast.last().unwrap().predicted_value, 0.0);
    }

    #[test]
    fn test_stops_at_last_representable_date() {
        let start = NaiveDate::MAX - Duration::days(6);
        let s: Vec<TimeSeriesPoint> = (0..5)
            .map(|i| TimeSeriesPoint::new(start + Duration::days(i), 1.0 + i as f64))
            .collect();
        let trend = TrendFitter::fit(&s);
        let forecast = Forecaster::forecast(&s, &trend, 0.0, 7);

        assert_eq!(forecast.len(), 2);
        assert_eq!(forecast[1].date, NaiveDate::MAX);
        assert_eq!(forecast[1].predicted_value, 7.0);
    }

    #[test]
    fn test_empty_series_has_no_forecast() {
        let forecast = Forecaster::forecast(&[], &TrendResult::flat(0.0), 0.0, 30);
        assert!(forecast.is_empty());
    }
}
