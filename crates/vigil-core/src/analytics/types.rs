//! Core types for the analytics engine
//!
//! Everything here serializes with camelCase field names, which is the shape
//! the trend analysis views consume.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// One day of an aggregated metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

impl TimeSeriesPoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Direction of the fitted trend line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendKind {
    Increasing,
    Decreasing,
    Stable,
    /// Slope sits exactly on the stable boundary; a tie-break, not a statistical state
    Volatile,
}

impl TrendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendKind::Increasing => "increasing",
            TrendKind::Decreasing => "decreasing",
            TrendKind::Stable => "stable",
            TrendKind::Volatile => "volatile",
        }
    }
}

impl fmt::Display for TrendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TrendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "increasing" => Ok(TrendKind::Increasing),
            "decreasing" => Ok(TrendKind::Decreasing),
            "stable" => Ok(TrendKind::Stable),
            "volatile" => Ok(TrendKind::Volatile),
            _ => Err(Error::InvalidData(format!("Unknown trend kind: {}", s))),
        }
    }
}

/// Ordinary least squares fit over the series (x = day index)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendResult {
    pub trend_kind: TrendKind,
    pub slope: f64,
    pub intercept: f64,
    /// Always within [0, 1]
    pub r_squared: f64,
}

impl TrendResult {
    /// Neutral fit used when there is not enough data
    pub fn flat(intercept: f64) -> Self {
        Self {
            trend_kind: TrendKind::Stable,
            slope: 0.0,
            intercept,
            r_squared: 0.0,
        }
    }

    /// Value of the fitted line at a day index
    pub fn predict(&self, index: usize) -> f64 {
        self.slope * index as f64 + self.intercept
    }
}

/// How far outside the expected band an anomaly lies
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalySeverity {
    /// Not produced by the 2σ detector; kept for consumers that band their own data
    Low,
    Medium,
    High,
    Critical,
}

impl AnomalySeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalySeverity::Low => "low",
            AnomalySeverity::Medium => "medium",
            AnomalySeverity::High => "high",
            AnomalySeverity::Critical => "critical",
        }
    }

    /// Numeric priority for sorting (higher = more urgent)
    pub fn priority(&self) -> u8 {
        match self {
            AnomalySeverity::Low => 1,
            AnomalySeverity::Medium => 2,
            AnomalySeverity::High => 3,
            AnomalySeverity::Critical => 4,
        }
    }
}

impl fmt::Display for AnomalySeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A day whose value strays more than 2σ from the trend line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anomaly {
    pub date: NaiveDate,
    pub observed_value: f64,
    pub expected_value: f64,
    pub absolute_deviation: f64,
    pub severity: AnomalySeverity,
}

/// A predicted future day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted_value: f64,
    pub upper_bound: f64,
    pub lower_bound: f64,
    pub confidence: f64,
}

/// Output of one analysis run
///
/// A pure function of the input series and horizon. It is rebuilt, never
/// patched, when the caller changes its filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub trend: TrendResult,
    /// Chronological
    pub anomalies: Vec<Anomaly>,
    /// Chronological, one point per requested day
    pub forecast: Vec<ForecastPoint>,
    pub seasonality_detected: bool,
    pub overall_confidence: f64,
}

impl AnalysisResult {
    /// Read-only view handed to the narrative insight generator
    pub fn insight_summary(&self) -> InsightSummary {
        InsightSummary {
            trend_kind: self.trend.trend_kind,
            slope: self.trend.slope,
            r_squared: self.trend.r_squared,
            anomaly_count: self.anomalies.len(),
        }
    }
}

/// The numbers the narrative generator is allowed to see
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightSummary {
    pub trend_kind: TrendKind,
    pub slope: f64,
    pub r_squared: f64,
    pub anomaly_count: usize,
}

/// Round to 2 decimal places for output
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
