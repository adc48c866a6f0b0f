//! Trend analytics handlers

use std::sync::Arc;

use axum::{
    extract::{Query, Request, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use vigil_core::{
    AggregationKind, AnalysisOrchestrator, AnalysisReport, AnalysisRequest, DateRange,
    EntityRecord, ForecastHorizon, Metric, MetricAnalysis, SourceEntity,
};

use crate::{AppError, AppState, MAX_BODY_SIZE};

/// Catalog entry as listed by the API
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricInfo {
    pub name: &'static str,
    pub label: &'static str,
    pub source_entity: SourceEntity,
    pub value_field: Option<&'static str>,
    pub aggregation: AggregationKind,
}

/// GET /api/analytics/metrics - List the metric catalog
pub async fn list_metrics() -> Json<Vec<MetricInfo>> {
    Json(
        Metric::all()
            .iter()
            .map(|m| MetricInfo {
                name: m.as_str(),
                label: m.label(),
                source_entity: m.source_entity(),
                value_field: m.value_field(),
                aggregation: m.aggregation(),
            })
            .collect(),
    )
}

/// Range selection shared by the analytics endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RangeParams {
    /// Period preset (last-30-days, this-year, ...)
    pub period: Option<String>,
    /// Custom start date (YYYY-MM-DD)
    pub from: Option<String>,
    /// Custom end date (YYYY-MM-DD)
    pub to: Option<String>,
    /// Forecast horizon in days (7-365)
    pub horizon: Option<u32>,
}

impl RangeParams {
    /// `from`+`to`, else `period`, else the configured lookback ending today
    fn range(&self, lookback_days: u32, today: NaiveDate) -> Result<DateRange, AppError> {
        match (&self.from, &self.to) {
            (Some(from), Some(to)) => Ok(DateRange::new(
                parse_date(from, "from")?,
                parse_date(to, "to")?,
            )?),
            (Some(_), None) | (None, Some(_)) => {
                Err(AppError::bad_request("Both from and to are required"))
            }
            (None, None) => match self.period {
                Some(ref period) => Ok(DateRange::from_period(period, today)?),
                None => Ok(DateRange::last_days(today, lookback_days)?),
            },
        }
    }

    fn horizon(&self, default: ForecastHorizon) -> Result<ForecastHorizon, AppError> {
        match self.horizon {
            Some(days) => Ok(ForecastHorizon::new(days)?),
            None => Ok(default),
        }
    }
}

fn parse_date(value: &str, name: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        AppError::bad_request(&format!("Invalid {} date format (use YYYY-MM-DD)", name))
    })
}

/// Query parameters for the trend endpoint
///
/// The range fields are repeated here: the query decoder cannot feed typed
/// values through `#[serde(flatten)]`.
#[derive(Debug, Deserialize)]
pub struct TrendQuery {
    /// Catalog metric name or ad hoc `agg(entity.field)`
    pub metric: String,
    pub period: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub horizon: Option<u32>,
    /// Ask the narrative backend for insights
    #[serde(default)]
    pub insights: bool,
    pub context: Option<String>,
}

impl TrendQuery {
    fn range_params(&self) -> RangeParams {
        RangeParams {
            period: self.period.clone(),
            from: self.from.clone(),
            to: self.to.clone(),
            horizon: self.horizon,
        }
    }
}

/// Body for POST /api/analytics/trend
#[derive(Debug, Deserialize)]
pub struct TrendBody {
    /// Records to analyse instead of the loaded ones
    pub records: Vec<EntityRecord>,
    pub metric: String,
    #[serde(flatten)]
    pub range: RangeParams,
    #[serde(default)]
    pub insights: bool,
    pub context: Option<String>,
}

/// Numeric analysis, or analysis plus insights when they were asked for
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum TrendResponse {
    Analysis(MetricAnalysis),
    Report(AnalysisReport),
}

fn build_request(
    state: &AppState,
    metric: &str,
    params: &RangeParams,
) -> Result<AnalysisRequest, AppError> {
    let today = Utc::now().date_naive();
    let range = params.range(state.analytics.lookback_days, today)?;
    let horizon = params.horizon(state.analytics.forecast_horizon)?;
    Ok(AnalysisRequest::parse(metric, range, horizon)?)
}

async fn run_trend(
    state: &AppState,
    records: Arc<Vec<EntityRecord>>,
    request: AnalysisRequest,
    insights: bool,
    context: Option<&str>,
) -> Result<TrendResponse, AppError> {
    debug!(
        metric = %request.label,
        start = %request.range.start(),
        end = %request.range.end(),
        horizon = request.horizon.days(),
        insights,
        "Trend request"
    );

    let analysis = tokio::task::spawn_blocking(move || {
        AnalysisOrchestrator::analyze_records(&records, &request)
    })
    .await?;

    if insights {
        let report =
            AnalysisOrchestrator::attach_insights(analysis, state.ai.as_ref(), context).await;
        return Ok(TrendResponse::Report(report));
    }
    Ok(TrendResponse::Analysis(analysis))
}

/// GET /api/analytics/trend - Analyse one metric over the loaded records
pub async fn get_trend(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TrendQuery>,
) -> Result<Json<TrendResponse>, AppError> {
    let request = build_request(&state, &params.metric, &params.range_params())?;
    let response = run_trend(
        &state,
        state.records.clone(),
        request,
        params.insights,
        params.context.as_deref(),
    )
    .await?;
    Ok(Json(response))
}

/// POST /api/analytics/trend - Analyse one metric over records in the body
pub async fn post_trend(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<TrendResponse>, AppError> {
    let bytes = axum::body::to_bytes(request.into_body(), MAX_BODY_SIZE)
        .await
        .map_err(|_| AppError::bad_request("Request body too large"))?;
    let body: TrendBody = serde_json::from_slice(&bytes)
        .map_err(|e| AppError::bad_request(&format!("Invalid JSON: {}", e)))?;

    let request = build_request(&state, &body.metric, &body.range)?;
    let response = run_trend(
        &state,
        Arc::new(body.records),
        request,
        body.insights,
        body.context.as_deref(),
    )
    .await?;
    Ok(Json(response))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewResponse {
    pub range: DateRange,
    pub horizon: ForecastHorizon,
    /// One entry per catalog metric, in catalog order
    pub metrics: Vec<MetricAnalysis>,
}

/// GET /api/analytics/overview - Every catalog metric over the loaded records
///
/// Each metric runs on its own blocking task.
pub async fn get_overview(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RangeParams>,
) -> Result<Json<OverviewResponse>, AppError> {
    let today = Utc::now().date_naive();
    let range = params.range(state.analytics.lookback_days, today)?;
    let horizon = params.horizon(state.analytics.forecast_horizon)?;

    let handles: Vec<_> = Metric::all()
        .iter()
        .map(|&metric| {
            let records = state.records.clone();
            let request = AnalysisRequest::for_metric(metric, range, horizon);
            tokio::task::spawn_blocking(move || {
                AnalysisOrchestrator::analyze_records(&records, &request)
            })
        })
        .collect();

    let mut metrics = Vec::with_capacity(handles.len());
    for handle in handles {
        metrics.push(handle.await?);
    }

    Ok(Json(OverviewResponse {
        range,
        horizon,
        metrics,
    }))
}
