//! Pluggable narrative insight backends
//!
//! Turns the numeric summary of an analysis into a few short sentences. All
//! backends are optional collaborators: the analytics engine never depends on
//! one being configured, reachable or correct.
//!
//! # Architecture
//!
//! - `InsightBackend` trait: defines the interface for all backends
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `OllamaBackend`, `OpenAICompatibleBackend`, `MockBackend`
//!
//! # Configuration
//!
//! Environment variables:
//! - `AI_BACKEND`: Backend to use (ollama, openai_compatible, mock). Default: ollama
//! - `OLLAMA_HOST`: Ollama server URL (required for ollama backend)
//! - `OLLAMA_MODEL`: Model name (default: llama3.2)
//! - `OPENAI_COMPATIBLE_HOST`: Server URL (required for openai_compatible backend)
//! - `OPENAI_COMPATIBLE_MODEL`: Model name (default: gpt-3.5-turbo)
//! - `OPENAI_COMPATIBLE_API_KEY`: API key if required (optional)
//!
//! Timeouts, retries and the insight cap come from [`InsightSettings`].

mod mock;
mod ollama;
mod openai_compatible;
pub mod parsing;
pub mod types;

pub use mock::MockBackend;
pub use ollama::OllamaBackend;
pub use openai_compatible::OpenAICompatibleBackend;
pub use types::*;

use std::future::Future;

use async_trait::async_trait;
use tracing::warn;

use crate::config::InsightSettings;
use crate::error::Result;

/// Trait defining the interface for all narrative backends
///
/// Backends should be Send + Sync to allow use across async tasks.
#[async_trait]
pub trait InsightBackend: Send + Sync {
    /// Produce short insight sentences for one analysed metric
    async fn generate_insights(&self, request: &InsightRequest<'_>) -> Result<Vec<String>>;

    /// Check if the backend is available
    async fn health_check(&self) -> bool;

    /// Get the model name
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete AI client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum AIClient {
    /// Ollama backend (HTTP API)
    Ollama(OllamaBackend),
    /// OpenAI-compatible backend (vLLM, LocalAI, llama-server, etc.)
    OpenAICompatible(OpenAICompatibleBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl AIClient {
    /// Create an AI client from environment variables with default settings
    pub fn from_env() -> Option<Self> {
        Self::from_env_with(InsightSettings::default())
    }

    /// Create an AI client from environment variables
    ///
    /// Checks `AI_BACKEND` to determine which backend to use:
    /// - `ollama` (default): Uses OLLAMA_HOST and OLLAMA_MODEL
    /// - `openai_compatible`: Uses OPENAI_COMPATIBLE_HOST and OPENAI_COMPATIBLE_MODEL
    /// - `mock`: Creates a mock backend for testing
    ///
    /// Returns None if the required environment variables are not set.
    pub fn from_env_with(settings: InsightSettings) -> Option<Self> {
        let backend = std::env::var("AI_BACKEND").unwrap_or_else(|_| "ollama".to_string());

        let client = match backend.to_lowercase().as_str() {
            "ollama" => OllamaBackend::from_env().map(AIClient::Ollama),
            "openai_compatible" | "openai" | "vllm" | "localai" | "llamacpp" => {
                OpenAICompatibleBackend::from_env().map(AIClient::OpenAICompatible)
            }
            "mock" => Some(AIClient::Mock(MockBackend::new())),
            _ => {
                warn!(backend = %backend, "Unknown AI_BACKEND, falling back to ollama");
                OllamaBackend::from_env().map(AIClient::Ollama)
            }
        };

        client.map(|c| c.with_settings(settings))
    }

    /// Create an Ollama backend directly
    pub fn ollama(host: &str, model: &str) -> Self {
        AIClient::Ollama(OllamaBackend::new(host, model))
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        AIClient::Mock(MockBackend::new())
    }

    /// Apply timeouts, retries and the insight cap
    pub fn with_settings(self, settings: InsightSettings) -> Self {
        match self {
            AIClient::Ollama(b) => AIClient::Ollama(b.with_settings(settings)),
            AIClient::OpenAICompatible(b) => AIClient::OpenAICompatible(b.with_settings(settings)),
            AIClient::Mock(b) => AIClient::Mock(b.with_max_insights(settings.max_insights)),
        }
    }

    /// Name of the backend kind
    pub fn backend_name(&self) -> &'static str {
        match self {
            AIClient::Ollama(_) => "ollama",
            AIClient::OpenAICompatible(_) => "openai_compatible",
            AIClient::Mock(_) => "mock",
        }
    }

    pub fn info(&self) -> BackendInfo {
        BackendInfo {
            backend: self.backend_name(),
            model: self.model().to_string(),
            host: self.host().to_string(),
        }
    }
}

#[async_trait]
impl InsightBackend for AIClient {
    async fn generate_insights(&self, request: &InsightRequest<'_>) -> Result<Vec<String>> {
        match self {
            AIClient::Ollama(b) => b.generate_insights(request).await,
            AIClient::OpenAICompatible(b) => b.generate_insights(request).await,
            AIClient::Mock(b) => b.generate_insights(request).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AIClient::Ollama(b) => b.health_check().await,
            AIClient::OpenAICompatible(b) => b.health_check().await,
            AIClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            AIClient::Ollama(b) => b.model(),
            AIClient::OpenAICompatible(b) => b.model(),
            AIClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            AIClient::Ollama(b) => b.host(),
            AIClient::OpenAICompatible(b) => b.host(),
            AIClient::Mock(b) => b.host(),
        }
    }
}

/// Run `op` once, then up to `max_retries` more times while it fails
pub(crate) async fn with_retries<T, F, Fut>(max_retries: u32, host: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_retries => {
                attempt += 1;
                warn!(host = %host, attempt, error = %e, "Insight request failed, retrying");
            }
            Err(e) => return Err(e),
        }
    }
}
