//! Narrative backend request types
//!
//! These types are backend-agnostic and used across all implementations.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::analytics::InsightSummary;

/// What a backend is asked to narrate
#[derive(Debug, Clone, Copy)]
pub struct InsightRequest<'a> {
    /// Human-readable metric name, e.g. "Incidents Reported"
    pub metric: &'a str,
    pub summary: &'a InsightSummary,
    /// Free-text context supplied by the analyst
    pub context: Option<&'a str>,
}

impl<'a> InsightRequest<'a> {
    pub fn new(metric: &'a str, summary: &'a InsightSummary) -> Self {
        Self {
            metric,
            summary,
            context: None,
        }
    }

    pub fn with_context(mut self, context: Option<&'a str>) -> Self {
        self.context = context.map(str::trim).filter(|c| !c.is_empty());
        self
    }

    /// Template variables for the trend insights prompt
    pub(crate) fn prompt_vars(&self, max_insights: usize) -> HashMap<&'static str, String> {
        let mut vars = HashMap::new();
        vars.insert("metric", self.metric.to_string());
        vars.insert("trend_kind", self.summary.trend_kind.to_string());
        vars.insert("slope", format!("{:.4}", self.summary.slope));
        vars.insert("r_squared", format!("{:.2}", self.summary.r_squared));
        vars.insert("anomaly_count", self.summary.anomaly_count.to_string());
        vars.insert("max_insights", max_insights.to_string());
        vars.insert("context", self.context.unwrap_or_default().to_string());
        vars
    }
}

/// Shape backends are asked to answer with
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightResponse {
    pub insights: Vec<String>,
}

/// Backend identity for display
#[derive(Debug, Clone, Serialize)]
pub struct BackendInfo {
    pub backend: &'static str,
    pub model: String,
    pub host: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::TrendKind;

    #[test]
    fn test_prompt_vars() {
        let summary = InsightSummary {
            trend_kind: TrendKind::Decreasing,
            slope: -0.123456,
            r_squared: 0.456,
            anomaly_count: 3,
        };
        let request = InsightRequest::new("Compliance Score", &summary)
            .with_context(Some("  ISO 27001 recertification  "));
        let vars = request.prompt_vars(4);

        assert_eq!(vars["trend_kind"], "decreasing");
        assert_eq!(vars["slope"], "-0.1235");
        assert_eq!(vars["r_squared"], "0.46");
        assert_eq!(vars["anomaly_count"], "3");
        assert_eq!(vars["max_insights"], "4");
        assert_eq!(vars["context"], "ISO 27001 recertification");

        let blank = InsightRequest::new("x", &summary).with_context(Some("   "));
        assert!(blank.context.is_none());
    }
}
