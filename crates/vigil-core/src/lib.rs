//! Vigil Core Library
//!
//! Shared functionality for the Vigil GRC analytics tool:
//! - Entity record model and JSON/CSV import
//! - Metric catalog and daily aggregation
//! - Trend, anomaly, seasonality and forecast analytics
//! - Pluggable narrative insight backends (Ollama, OpenAI-compatible)
//! - Prompt library for customizable insight prompts
//! - Analytics configuration with override files

pub mod ai;
pub mod analytics;
pub mod config;
pub mod error;
pub mod import;
pub mod models;
pub mod prompts;

/// Test utilities including mock Ollama server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{
    AIClient, BackendInfo, InsightBackend, InsightRequest, MockBackend, OllamaBackend,
    OpenAICompatibleBackend,
};
pub use analytics::{
    AggregationKind, AnalysisOrchestrator, AnalysisReport, AnalysisRequest, AnalysisResult,
    Anomaly, AnomalySeverity, DateRange, ForecastHorizon, ForecastPoint, InsightSummary, Metric,
    MetricAnalysis, MetricConfig, TimeSeriesPoint, TrendKind, TrendResult, MAX_RANGE_DAYS,
};
pub use config::{AnalyticsConfig, InsightSettings};
pub use error::{Error, Result};
pub use models::{EntityRecord, SourceEntity, TimestampField};
pub use prompts::{Prompt, PromptId, PromptInfo, PromptLibrary, PromptSource};
