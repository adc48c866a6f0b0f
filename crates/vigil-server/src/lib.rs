//! Vigil Web Server
//!
//! Axum-based REST API for the Vigil trend analytics engine.
//!
//! Security features:
//! - Restrictive CORS policy
//! - Request body size limit
//! - Security headers (CSP, nosniff, frame denial)
//! - Sanitized error responses

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::{
    cors::CorsLayer, services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use tracing::{error, info, warn};

use vigil_core::{AIClient, AnalyticsConfig, EntityRecord, InsightBackend};

mod handlers;

/// Maximum request body size (10 MB)
pub const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Server configuration
#[derive(Clone, Default)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
}

/// Shared application state
pub struct AppState {
    /// Records served by the GET analytics endpoints
    pub records: Arc<Vec<EntityRecord>>,
    pub ai: Option<AIClient>,
    pub analytics: AnalyticsConfig,
    pub config: ServerConfig,
}

impl AppState {
    /// State with the narrative backend taken from the environment
    pub fn new(records: Vec<EntityRecord>, analytics: AnalyticsConfig) -> Self {
        let ai = if analytics.insights.enabled {
            AIClient::from_env_with(analytics.insights.clone())
        } else {
            None
        };
        Self {
            records: Arc::new(records),
            ai,
            analytics,
            config: ServerConfig::default(),
        }
    }

    pub fn with_ai(mut self, ai: Option<AIClient>) -> Self {
        self.ai = ai;
        self
    }

    pub fn with_config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }
}

/// Create the application router
pub fn create_router(state: AppState, static_dir: Option<&str>) -> Router {
    match state.ai {
        Some(ref client) => info!(
            "Insight backend configured: {} (model: {})",
            client.host(),
            client.model()
        ),
        None => info!("ℹ️  Insight backend not configured (set OLLAMA_HOST to enable insights)"),
    }

    let cors = cors_layer(&state.config);
    let state = Arc::new(state);

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/analytics/metrics", get(handlers::list_metrics))
        .route(
            "/analytics/trend",
            get(handlers::get_trend).post(handlers::post_trend),
        )
        .route("/analytics/overview", get(handlers::get_overview));

    let csp_value = HeaderValue::from_static(
        "default-src 'self'; script-src 'self'; style-src 'self' 'unsafe-inline'; img-src 'self' data:; connect-src 'self'; frame-ancestors 'none'"
    );

    let mut app = Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            csp_value,
        ));

    // Serve static files if directory provided
    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    if config.allowed_origins.is_empty() {
        return layer;
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    layer.allow_origin(origins)
}

/// Start the server
pub async fn serve(
    state: AppState,
    host: &str,
    port: u16,
    static_dir: Option<&str>,
) -> anyhow::Result<()> {
    check_ai_connection(state.ai.as_ref()).await;
    info!(records = state.records.len(), "Serving analytics");

    let app = create_router(state, static_dir);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Check and log insight backend connection status
async fn check_ai_connection(ai: Option<&AIClient>) {
    match ai {
        Some(client) => {
            if client.health_check().await {
                info!(
                    "✅ Insight backend connected: {} ({}, model: {})",
                    client.host(),
                    client.backend_name(),
                    client.model()
                );
            } else {
                warn!(
                    "⚠️  Insight backend configured but not responding: {} (model: {})",
                    client.host(),
                    client.model()
                );
            }
        }
        None => {
            info!("ℹ️  Insight backend not configured (set OLLAMA_HOST to enable insights)");
        }
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();

        // Bad metric names, ranges and horizons are the caller's to fix
        if let Some(core) = err.downcast_ref::<vigil_core::Error>() {
            if core.is_configuration() {
                return Self {
                    status: StatusCode::BAD_REQUEST,
                    message: core.to_string(),
                    internal: None,
                };
            }
        }

        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err),
        }
    }
}
