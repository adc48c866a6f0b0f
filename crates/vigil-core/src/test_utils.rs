//! Test utilities for vigil-core
//!
//! A mock LLM server speaking both the Ollama and the OpenAI chat completions
//! APIs, answering the trend insights prompt, plus helpers for building
//! record fixtures.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::models::{EntityRecord, SourceEntity};

/// How the mock server answers generation requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockMode {
    /// Valid insights JSON built from the prompt
    Insights,
    /// Prose with no JSON in it
    Garbage,
    /// HTTP 500 for the first `n` requests, then insights
    FailFirst(usize),
}

#[derive(Clone)]
struct MockState {
    mode: MockMode,
    requests: Arc<AtomicUsize>,
}

/// Mock LLM server for testing and development
pub struct MockLlmServer {
    addr: SocketAddr,
    requests: Arc<AtomicUsize>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockLlmServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        Self::start_with(MockMode::Insights).await
    }

    pub async fn start_with(mode: MockMode) -> Self {
        let requests = Arc::new(AtomicUsize::new(0));
        let state = MockState {
            mode,
            requests: requests.clone(),
        };

        let app = Router::new()
            .route("/api/tags", get(handle_tags))
            .route("/api/generate", post(handle_generate))
            .route("/v1/models", get(handle_models))
            .route("/v1/chat/completions", post(handle_chat))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            requests,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Number of generation calls received so far, across both APIs
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockLlmServer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Debug, Serialize)]
struct TagsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Debug, Serialize)]
struct ModelInfo {
    name: String,
}

#[derive(Debug, Deserialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
}

#[derive(Debug, Serialize)]
struct GenerateResponse {
    model: String,
    response: String,
    done: bool,
}

/// Ollama tags endpoint response (health check)
async fn handle_tags() -> Json<TagsResponse> {
    Json(TagsResponse {
        models: vec![ModelInfo {
            name: "llama3.2:latest".to_string(),
        }],
    })
}

/// Model output for one generation call, or `None` for a simulated 500
fn answer(state: &MockState, prompt: &str) -> Option<String> {
    let seen = state.requests.fetch_add(1, Ordering::SeqCst);
    match state.mode {
        MockMode::FailFirst(n) if seen < n => None,
        MockMode::Garbage => Some("I am not sure what you mean.".to_string()),
        MockMode::Insights | MockMode::FailFirst(_) => Some(insights_for_prompt(prompt)),
    }
}

fn model_loading() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "model loading").into_response()
}

/// Ollama generate endpoint
async fn handle_generate(
    State(state): State<MockState>,
    Json(request): Json<GenerateRequest>,
) -> Response {
    let Some(response) = answer(&state, &request.prompt) else {
        return model_loading();
    };

    Json(GenerateResponse {
        model: request.model,
        response,
        done: true,
    })
    .into_response()
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// OpenAI models endpoint (health check)
async fn handle_models() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "data": [{ "id": "mock-instruct" }] }))
}

/// OpenAI chat completions endpoint; answers from the last user message
async fn handle_chat(State(state): State<MockState>, Json(request): Json<ChatRequest>) -> Response {
    let prompt = request
        .messages
        .iter()
        .rev()
        .find(|m| m.role == "user")
        .map(|m| m.content.as_str())
        .unwrap_or_default();
    let Some(content) = answer(&state, prompt) else {
        return model_loading();
    };

    Json(serde_json::json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }]
    }))
    .into_response()
}

/// Build an insights payload echoing the values found in the prompt
fn insights_for_prompt(prompt: &str) -> String {
    let value_of = |key: &str| {
        prompt
            .lines()
            .find_map(|line| line.strip_prefix(key))
            .map(str::trim)
            .unwrap_or("unknown")
            .to_string()
    };

    let insights = vec![
        format!("{} trend is {}.", value_of("Metric:"), value_of("Trend:")),
        format!("{} anomalous day(s) detected.", value_of("Anomalous days:")),
    ];
    serde_json::json!({ "insights": insights }).to_string()
}

/// `per_day[i]` records of `entity` created on day `start + i`
pub fn daily_records(
    entity: SourceEntity,
    start: NaiveDate,
    per_day: &[usize],
) -> Vec<EntityRecord> {
    let base = Utc.from_utc_datetime(&start.and_hms_opt(9, 0, 0).unwrap_or_default());
    per_day
        .iter()
        .enumerate()
        .flat_map(|(day, &count)| {
            let at = base + Duration::days(day as i64);
            (0..count).map(move |_| EntityRecord::new(entity, at))
        })
        .collect()
}

/// One record per day carrying `field = value`
pub fn valued_records(
    entity: SourceEntity,
    start: NaiveDate,
    field: &str,
    values: &[f64],
) -> Vec<EntityRecord> {
    let base = Utc.from_utc_datetime(&start.and_hms_opt(9, 0, 0).unwrap_or_default());
    values
        .iter()
        .enumerate()
        .map(|(day, &value)| {
            let at = base + Duration::days(day as i64);
            EntityRecord::new(entity, at)
                .with_assessment_date(at.date_naive())
                .with_field(field, value)
        })
        .collect()
}
