//! Analysis orchestrator - sequences the engine stages into one result

use serde::Serialize;
use tracing::{debug, warn};

use crate::ai::{AIClient, InsightBackend, InsightRequest};
use crate::models::EntityRecord;

use super::aggregate::MetricAggregator;
use super::anomaly::{standard_deviation, AnomalyDetector};
use super::forecast::Forecaster;
use super::metrics::MetricConfig;
use super::request::{AnalysisRequest, DateRange};
use super::seasonality::SeasonalityDetector;
use super::trend::TrendFitter;
use super::types::{AnalysisResult, TimeSeriesPoint};

/// One metric, aggregated and analysed
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricAnalysis {
    pub label: String,
    pub metric: MetricConfig,
    pub range: DateRange,
    pub series: Vec<TimeSeriesPoint>,
    pub result: AnalysisResult,
}

/// Analysis plus best-effort narrative insights
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub analysis: MetricAnalysis,
    /// Empty when the narrative backend is missing or failed
    pub insights: Vec<String>,
    pub insights_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insights_error: Option<String>,
}

pub struct AnalysisOrchestrator;

impl AnalysisOrchestrator {
    /// Run every stage over a series
    ///
    /// Pure and synchronous. Series shorter than two points get the neutral
    /// result: flat stable trend, no anomalies, no seasonality and an overall
    /// confidence of 0. A single point still produces a flat forecast.
    pub fn analyze(series: &[TimeSeriesPoint], horizon_days: usize) -> AnalysisResult {
        let trend = TrendFitter::fit(series);
        let sigma = standard_deviation(series);
        let forecast = Forecaster::forecast(series, &trend, sigma, horizon_days);

        if series.len() < 2 {
            debug!(points = series.len(), "Series too short, neutral analysis");
            return AnalysisResult {
                trend,
                anomalies: Vec::new(),
                forecast,
                seasonality_detected: false,
                overall_confidence: 0.0,
            };
        }

        let anomalies = AnomalyDetector::detect(series, &trend, sigma);
        let seasonality_detected = SeasonalityDetector::detect(series);

        debug!(
            points = series.len(),
            trend = %trend.trend_kind,
            slope = trend.slope,
            r_squared = trend.r_squared,
            sigma,
            anomalies = anomalies.len(),
            seasonality_detected,
            horizon = horizon_days,
            "Analysis complete"
        );

        AnalysisResult {
            overall_confidence: trend.r_squared,
            trend,
            anomalies,
            forecast,
            seasonality_detected,
        }
    }

    /// Aggregate records for a request, then analyse the series
    pub fn analyze_records(records: &[EntityRecord], request: &AnalysisRequest) -> MetricAnalysis {
        let series = MetricAggregator::aggregate_range(records, &request.metric, &request.range);
        let result = Self::analyze(&series, request.horizon.days());

        MetricAnalysis {
            label: request.label.clone(),
            metric: request.metric.clone(),
            range: request.range,
            series,
            result,
        }
    }

    /// Analyse, then ask the narrative backend for insights
    ///
    /// The numeric analysis is always returned. A missing or failing backend
    /// only leaves the insight list empty and says why.
    pub async fn analyze_with_insights(
        records: &[EntityRecord],
        request: &AnalysisRequest,
        ai: Option<&AIClient>,
        context: Option<&str>,
    ) -> AnalysisReport {
        let analysis = Self::analyze_records(records, request);
        Self::attach_insights(analysis, ai, context).await
    }

    /// Ask the narrative backend about a finished analysis
    pub async fn attach_insights(
        analysis: MetricAnalysis,
        ai: Option<&AIClient>,
        context: Option<&str>,
    ) -> AnalysisReport {
        let Some(client) = ai else {
            return AnalysisReport {
                analysis,
                insights: Vec::new(),
                insights_available: false,
                insights_error: Some("Insight backend not configured".to_string()),
            };
        };

        let summary = analysis.result.insight_summary();
        let insight_request = InsightRequest::new(&analysis.label, &summary).with_context(context);

        match client.generate_insights(&insight_request).await {
            Ok(insights) => AnalysisReport {
                analysis,
                insights,
                insights_available: true,
                insights_error: None,
            },
            Err(e) => {
                warn!(
                    metric = %analysis.label,
                    host = client.host(),
                    error = %e,
                    "Insight generation failed, returning numeric analysis only"
                );
                AnalysisReport {
                    analysis,
                    insights: Vec::new(),
                    insights_available: false,
                    insights_error: Some(e.to_string()),
                }
            }
        }
    }
}
