//! Mock backend for testing
//!
//! Produces deterministic insights straight from the summary numbers. Useful
//! for unit tests and development without a running LLM server.

use async_trait::async_trait;

use crate::analytics::TrendKind;
use crate::error::{Error, Result};

use super::types::InsightRequest;
use super::InsightBackend;

/// Mock narrative backend
#[derive(Debug, Clone)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    /// When set, every generation fails with this message
    pub failure: Option<String>,
    /// Canned insights returned instead of the generated ones
    pub canned: Option<Vec<String>>,
    pub max_insights: usize,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            failure: None,
            canned: None,
            max_insights: 5,
        }
    }

    /// Create an unhealthy mock backend
    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Self::new()
        }
    }

    /// A backend whose generations always fail
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new()
        }
    }

    /// Always answer with these insights
    pub fn with_insights(insights: Vec<String>) -> Self {
        Self {
            canned: Some(insights),
            ..Self::new()
        }
    }

    pub fn with_max_insights(mut self, max: usize) -> Self {
        self.max_insights = max;
        self
    }
}

#[async_trait]
impl InsightBackend for MockBackend {
    async fn generate_insights(&self, request: &InsightRequest<'_>) -> Result<Vec<String>> {
        if let Some(ref message) = self.failure {
            return Err(Error::Insight(message.clone()));
        }
        if let Some(ref canned) = self.canned {
            return Ok(canned.iter().take(self.max_insights).cloned().collect());
        }

        let summary = request.summary;
        let direction = match summary.trend_kind {
            TrendKind::Increasing => "is rising",
            TrendKind::Decreasing => "is falling",
            TrendKind::Stable => "is holding steady",
            TrendKind::Volatile => "is moving without a clear direction",
        };

        let mut insights = vec![format!(
            "{} {} ({:+.2} per day).",
            request.metric, direction, summary.slope
        )];

        insights.push(if summary.r_squared >= 0.7 {
            format!(
                "The trend explains the data well (R² {:.2}).",
                summary.r_squared
            )
        } else {
            format!(
                "The trend is weak (R² {:.2}); treat the forecast with caution.",
                summary.r_squared
            )
        });

        if summary.anomaly_count > 0 {
            insights.push(format!(
                "{} day(s) fell outside the expected range and deserve review.",
                summary.anomaly_count
            ));
        }

        if let Some(context) = request.context {
            insights.push(format!("Context considered: {}.", context));
        }

        insights.truncate(self.max_insights);
        Ok(insights)
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::InsightSummary;

    fn summary(trend_kind: TrendKind, anomaly_count: usize) -> InsightSummary {
        InsightSummary {
            trend_kind,
            slope: -1.5,
            r_squared: 0.3,
            anomaly_count,
        }
    }

    #[tokio::test]
    async fn test_generated_insights() {
        let backend = MockBackend::new();
        let s = summary(TrendKind::Decreasing, 2);
        let insights = backend
            .generate_insights(&InsightRequest::new("Compliance Score", &s))
            .await
            .unwrap();

        assert_eq!(insights.len(), 3);
        assert!(insights[0].starts_with("Compliance Score is falling"));
        assert!(insights[0].contains("-1.50"));
        assert!(insights[1].contains("weak"));
        assert!(insights[2].starts_with("2 day(s)"));
    }

    #[tokio::test]
    async fn test_context_is_echoed() {
        let backend = MockBackend::new();
        let s = summary(TrendKind::Stable, 0);
        let request = InsightRequest::new("New Risks", &s).with_context(Some("post-merger"));
        let insights = backend.generate_insights(&request).await.unwrap();
        assert!(insights.last().unwrap().contains("post-merger"));
    }

    #[tokio::test]
    async fn test_failing_backend() {
        let backend = MockBackend::failing("model offline");
        let s = summary(TrendKind::Stable, 0);
        let err = backend
            .generate_insights(&InsightRequest::new("x", &s))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("model offline"));
    }

    #[tokio::test]
    async fn test_canned_and_health() {
        let backend = MockBackend::with_insights(vec!["a".into(), "b".into()]).with_max_insights(1);
        let s = summary(TrendKind::Stable, 0);
        let insights = backend
            .generate_insights(&InsightRequest::new("x", &s))
            .await
            .unwrap();
        assert_eq!(insights, vec!["a"]);

        assert!(backend.health_check().await);
        assert!(!MockBackend::unhealthy().health_check().await);
    }
}
