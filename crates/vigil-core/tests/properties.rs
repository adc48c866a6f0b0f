//! Property-based tests for the analytics engine.
//!
//! Uses proptest to check the engine's output invariants across random series.

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use vigil_core::analytics::{
    standard_deviation, AnalysisOrchestrator, MetricAggregator, Metric, TimeSeriesPoint,
    TrendFitter, TrendKind,
};
use vigil_core::{EntityRecord, SourceEntity};

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()
}

fn series(values: &[f64]) -> Vec<TimeSeriesPoint> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| TimeSeriesPoint::new(start() + Duration::days(i as i64), *v))
        .collect()
}

/// Daily metric values as the aggregator produces them (non-negative, 2dp)
fn daily_values(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0u32..50_000, 0..max_len)
        .prop_map(|raw| raw.into_iter().map(|c| f64::from(c) / 100.0).collect())
}

// ============================================================================
// Trend properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// R² always lands in [0, 1] and the fit is finite.
    #[test]
    fn trend_r_squared_bounded(values in daily_values(120)) {
        let trend = TrendFitter::fit(&series(&values));
        prop_assert!((0.0..=1.0).contains(&trend.r_squared), "r² = {}", trend.r_squared);
        prop_assert!(trend.slope.is_finite());
        prop_assert!(trend.intercept.is_finite());
    }

    /// Trend kind agrees with the slope thresholds.
    #[test]
    fn trend_kind_matches_slope(values in daily_values(60)) {
        let trend = TrendFitter::fit(&series(&values));
        let expected = if trend.slope.abs() < 0.01 {
            TrendKind::Stable
        } else if trend.slope > 0.01 {
            TrendKind::Increasing
        } else if trend.slope < -0.01 {
            TrendKind::Decreasing
        } else {
            TrendKind::Volatile
        };
        prop_assert_eq!(trend.trend_kind, expected);
    }

    /// Exact lines are recovered with R² = 1.
    #[test]
    fn trend_recovers_lines(intercept in 0.0..100.0f64, slope in 0.05..10.0f64, n in 3usize..60) {
        let values: Vec<f64> = (0..n).map(|i| intercept + slope * i as f64).collect();
        let trend = TrendFitter::fit(&series(&values));
        prop_assert!((trend.slope - slope).abs() < 1e-6, "slope {} != {}", trend.slope, slope);
        prop_assert!((trend.r_squared - 1.0).abs() < 1e-6);
        prop_assert_eq!(trend.trend_kind, TrendKind::Increasing);
    }
}

// ============================================================================
// Orchestrator properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// Forecasts have the requested length and are never negative.
    #[test]
    fn forecast_shape_and_sign(values in daily_values(90), horizon in 7usize..=365) {
        let s = series(&values);
        let result = AnalysisOrchestrator::analyze(&s, horizon);

        let expected_len = if s.is_empty() { 0 } else { horizon };
        prop_assert_eq!(result.forecast.len(), expected_len);

        for (k, point) in result.forecast.iter().enumerate() {
            prop_assert!(point.predicted_value >= 0.0);
            prop_assert!(point.lower_bound >= 0.0);
            prop_assert!(point.lower_bound <= point.predicted_value);
            prop_assert!(point.predicted_value <= point.upper_bound);
            prop_assert!((0.1..=0.95).contains(&point.confidence), "confidence {}", point.confidence);
            let last = s.last().map(|p| p.date).unwrap_or_else(start);
            prop_assert_eq!(point.date, last + Duration::days(k as i64 + 1));
        }
    }

    /// Overall confidence is R² for real series and 0 for short ones.
    #[test]
    fn overall_confidence_tracks_fit(values in daily_values(90)) {
        let result = AnalysisOrchestrator::analyze(&series(&values), 30);
        if values.len() < 2 {
            prop_assert_eq!(result.overall_confidence, 0.0);
            prop_assert!(result.anomalies.is_empty());
            prop_assert!(!result.seasonality_detected);
        } else {
            prop_assert_eq!(result.overall_confidence, result.trend.r_squared);
        }
    }

    /// Anomalies are chronological, come from the series, and sit beyond 2σ.
    #[test]
    fn anomalies_are_real_outliers(values in daily_values(90)) {
        let s = series(&values);
        let result = AnalysisOrchestrator::analyze(&s, 7);
        let sigma = standard_deviation(&s);

        for pair in result.anomalies.windows(2) {
            prop_assert!(pair[0].date < pair[1].date);
        }
        for anomaly in &result.anomalies {
            let index = (anomaly.date - start()).num_days() as usize;
            prop_assert!(index < s.len());
            let residual = (s[index].value - result.trend.predict(index)).abs();
            prop_assert!(sigma > 0.0);
            prop_assert!(residual / sigma > 2.0);
        }
    }

    /// Analysis is a pure function of its input.
    #[test]
    fn analysis_is_deterministic(values in daily_values(60), horizon in 7usize..60) {
        let s = series(&values);
        prop_assert_eq!(
            AnalysisOrchestrator::analyze(&s, horizon),
            AnalysisOrchestrator::analyze(&s, horizon)
        );
    }
}

// ============================================================================
// Aggregation properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// One point per day in the range, contiguous, whatever the records.
    #[test]
    fn aggregation_covers_range(
        offsets in prop::collection::vec(-10i64..40, 0..200),
        days in 1i64..30,
    ) {
        let base = start().and_hms_opt(12, 0, 0).unwrap().and_utc();
        let records: Vec<EntityRecord> = offsets
            .iter()
            .map(|&d| EntityRecord::new(SourceEntity::Risk, base + Duration::days(d)))
            .collect();
        let end = start() + Duration::days(days - 1);

        let s = MetricAggregator::aggregate(&records, &Metric::RiskCount.config(), start(), end);
        prop_assert_eq!(s.len(), days as usize);
        for (i, point) in s.iter().enumerate() {
            prop_assert_eq!(point.date, start() + Duration::days(i as i64));
        }

        let in_range = offsets.iter().filter(|&&d| (0..days).contains(&d)).count();
        let total: f64 = s.iter().map(|p| p.value).sum();
        prop_assert_eq!(total as usize, in_range);
    }
}
