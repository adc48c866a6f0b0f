//! Health handler

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;
use vigil_core::{BackendInfo, InsightBackend};

use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightStatus {
    #[serde(flatten)]
    pub backend: BackendInfo,
    pub reachable: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Records loaded for the GET analytics endpoints
    pub records: usize,
    /// `None` when no narrative backend is configured
    pub insights: Option<InsightStatus>,
}

/// GET /api/health - Liveness plus loaded data and backend status
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let insights = match state.ai {
        Some(ref client) => Some(InsightStatus {
            backend: client.info(),
            reachable: client.health_check().await,
        }),
        None => None,
    };

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        records: state.records.len(),
        insights,
    })
}
