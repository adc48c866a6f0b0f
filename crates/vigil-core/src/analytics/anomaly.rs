//! Anomaly detection against the fitted trend line

use super::types::{round2, Anomaly, AnomalySeverity, TimeSeriesPoint, TrendResult};

/// Points further than this many σ from the line are anomalies
pub const Z_THRESHOLD: f64 = 2.0;

/// Population standard deviation of the raw series values
///
/// 0 for series with fewer than two points.
pub fn standard_deviation(series: &[TimeSeriesPoint]) -> f64 {
    let n = series.len();
    if n < 2 {
        return 0.0;
    }
    let mean = series.iter().map(|p| p.value).sum::<f64>() / n as f64;
    let variance = series
        .iter()
        .map(|p| (p.value - mean).powi(2))
        .sum::<f64>()
        / n as f64;
    variance.sqrt()
}

/// Severity for a z-score above the detection threshold
fn severity_for(z: f64) -> AnomalySeverity {
    if z > 3.0 {
        AnomalySeverity::Critical
    } else if z > 2.5 {
        AnomalySeverity::High
    } else {
        AnomalySeverity::Medium
    }
}

pub struct AnomalyDetector;

impl AnomalyDetector {
    /// Flag points whose distance from the trend line exceeds 2σ
    ///
    /// `sigma` is the spread of the raw values (see [`standard_deviation`]).
    /// A σ of 0 means there is nothing to measure against and no anomalies
    /// are reported.
    pub fn detect(series: &[TimeSeriesPoint], trend: &TrendResult, sigma: f64) -> Vec<Anomaly> {
        if !sigma.is_finite() || sigma <= 0.0 {
            return Vec::new();
        }

        series
            .iter()
            .enumerate()
            .filter_map(|(i, point)| {
                let expected = trend.predict(i);
                let deviation = (point.value - expected).abs();
                let z = deviation / sigma;
                if z <= Z_THRESHOLD {
                    return None;
                }
                Some(Anomaly {
                    date: point.date,
                    observed_value: round2(point.value),
                    expected_value: round2(expected),
                    absolute_deviation: round2(deviation),
                    severity: severity_for(z),
                })
            })
            .collect()
    }
}
