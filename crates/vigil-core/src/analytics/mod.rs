//! Trend analytics engine
//!
//! Turns raw GRC entity records into a daily metric series, then fits a
//! trend, flags anomalies, tests for weekly seasonality and forecasts ahead.
//!
//! Pipeline:
//! 1. [`MetricAggregator`]: records to a gap-filled daily series
//! 2. [`TrendFitter`]: least-squares line over the day index
//! 3. [`AnomalyDetector`]: points more than 2σ off the line
//! 4. [`SeasonalityDetector`]: lagged-difference weekly heuristic
//! 5. [`Forecaster`]: the line extended with a 95% band
//!
//! [`AnalysisOrchestrator`] sequences the stages. Every stage is a pure
//! function of its input, so analyses can run on any thread without
//! coordination.

pub mod aggregate;
pub mod anomaly;
pub mod engine;
pub mod forecast;
pub mod metrics;
pub mod request;
pub mod seasonality;
pub mod trend;
pub mod types;

pub use aggregate::MetricAggregator;
pub use anomaly::{standard_deviation, AnomalyDetector};
pub use engine::{AnalysisOrchestrator, AnalysisReport, MetricAnalysis};
pub use forecast::Forecaster;
pub use metrics::{AggregationKind, Metric, MetricConfig};
pub use request::{
    AnalysisRequest, DateRange, ForecastHorizon, MAX_HORIZON_DAYS, MAX_RANGE_DAYS, MIN_HORIZON_DAYS,
    PERIODS,
};
pub use seasonality::SeasonalityDetector;
pub use trend::TrendFitter;
pub use types::{
    Anomaly, AnomalySeverity, AnalysisResult, ForecastPoint, InsightSummary, TimeSeriesPoint,
    TrendKind, TrendResult,
};
