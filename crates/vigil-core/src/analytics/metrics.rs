//! Metric catalog
//!
//! Each supported metric knows its source entity, the numeric field it reads,
//! the timestamp that buckets it into days, and how a day's values collapse
//! into one number. Ad hoc metrics go through [`MetricConfig::new`], which
//! rejects configurations the aggregator cannot evaluate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::models::{SourceEntity, TimestampField};

/// How one day's values collapse into a single number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationKind {
    Count,
    Sum,
    Avg,
    Max,
    Min,
}

impl AggregationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Sum => "sum",
            Self::Avg => "avg",
            Self::Max => "max",
            Self::Min => "min",
        }
    }

    /// Whether this aggregation reads a numeric field
    pub fn needs_field(&self) -> bool {
        !matches!(self, Self::Count)
    }
}

impl fmt::Display for AggregationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AggregationKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "count" => Ok(Self::Count),
            "sum" => Ok(Self::Sum),
            "avg" | "average" | "mean" => Ok(Self::Avg),
            "max" => Ok(Self::Max),
            "min" => Ok(Self::Min),
            _ => Err(Error::Configuration(format!(
                "Unknown aggregation kind: {}",
                s
            ))),
        }
    }
}

/// A validated metric configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricConfig {
    pub source_entity: SourceEntity,
    /// Numeric field; `None` only for counts
    pub value_field: Option<String>,
    pub aggregation: AggregationKind,
    pub timestamp: TimestampField,
}

impl MetricConfig {
    /// Build an ad hoc metric, bucketed by the entity's default timestamp
    pub fn new(
        source_entity: SourceEntity,
        value_field: Option<&str>,
        aggregation: AggregationKind,
    ) -> Result<Self> {
        let value_field = value_field
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_string);

        if aggregation.needs_field() && value_field.is_none() {
            return Err(Error::Configuration(format!(
                "Aggregation '{}' on {} requires a value field",
                aggregation, source_entity
            )));
        }

        Ok(Self {
            source_entity,
            value_field,
            aggregation,
            timestamp: source_entity.default_timestamp(),
        })
    }

    /// Override the timestamp used for day bucketing
    pub fn with_timestamp(mut self, timestamp: TimestampField) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Short human-readable label, e.g. "avg(risk.risk_score)"
    pub fn label(&self) -> String {
        match &self.value_field {
            Some(field) => format!("{}({}.{})", self.aggregation, self.source_entity, field),
            None => format!("{}({})", self.aggregation, self.source_entity),
        }
    }
}

impl FromStr for MetricConfig {
    type Err = Error;

    /// Parse the [`label`](MetricConfig::label) form: `count(incident)` or
    /// `avg(risk.risk_score)`
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || {
            Error::Configuration(format!(
                "Invalid metric '{}' (expected e.g. avg(risk.risk_score) or count(incident))",
                s
            ))
        };

        let (aggregation, rest) = s.trim().split_once('(').ok_or_else(invalid)?;
        let inner = rest.strip_suffix(')').ok_or_else(invalid)?;
        let (entity, field) = match inner.split_once('.') {
            Some((entity, field)) => (entity, Some(field)),
            None => (inner, None),
        };

        Self::new(entity.parse()?, field, aggregation.parse()?)
    }
}

/// Metrics offered by the trend analysis views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Risks registered per day
    RiskCount,
    /// Mean inherent risk score of risks registered that day
    RiskScoreAverage,
    /// Highest risk score registered that day
    RiskScorePeak,
    /// Incidents reported per day
    IncidentCount,
    /// Mean incident severity
    IncidentSeverity,
    /// Total financial impact of incidents reported that day
    IncidentImpactTotal,
    /// Mean framework compliance score by assessment date
    ComplianceScore,
    /// Lowest compliance score assessed that day
    ComplianceScoreLow,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RiskCount => "risk_count",
            Self::RiskScoreAverage => "risk_score_average",
            Self::RiskScorePeak => "risk_score_peak",
            Self::IncidentCount => "incident_count",
            Self::IncidentSeverity => "incident_severity",
            Self::IncidentImpactTotal => "incident_impact_total",
            Self::ComplianceScore => "compliance_score",
            Self::ComplianceScoreLow => "compliance_score_low",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::RiskCount => "New Risks",
            Self::RiskScoreAverage => "Average Risk Score",
            Self::RiskScorePeak => "Peak Risk Score",
            Self::IncidentCount => "Incidents Reported",
            Self::IncidentSeverity => "Incident Severity",
            Self::IncidentImpactTotal => "Incident Financial Impact",
            Self::ComplianceScore => "Compliance Score",
            Self::ComplianceScoreLow => "Lowest Compliance Score",
        }
    }

    pub fn source_entity(&self) -> SourceEntity {
        match self {
            Self::RiskCount | Self::RiskScoreAverage | Self::RiskScorePeak => SourceEntity::Risk,
            Self::IncidentCount | Self::IncidentSeverity | Self::IncidentImpactTotal => {
                SourceEntity::Incident
            }
            Self::ComplianceScore | Self::ComplianceScoreLow => SourceEntity::ComplianceAssessment,
        }
    }

    pub fn value_field(&self) -> Option<&'static str> {
        match self {
            Self::RiskCount | Self::IncidentCount => None,
            Self::RiskScoreAverage | Self::RiskScorePeak => Some("risk_score"),
            Self::IncidentSeverity => Some("severity_score"),
            Self::IncidentImpactTotal => Some("financial_impact"),
            Self::ComplianceScore | Self::ComplianceScoreLow => Some("score"),
        }
    }

    pub fn aggregation(&self) -> AggregationKind {
        match self {
            Self::RiskCount | Self::IncidentCount => AggregationKind::Count,
            Self::RiskScoreAverage | Self::IncidentSeverity | Self::ComplianceScore => {
                AggregationKind::Avg
            }
            Self::RiskScorePeak => AggregationKind::Max,
            Self::IncidentImpactTotal => AggregationKind::Sum,
            Self::ComplianceScoreLow => AggregationKind::Min,
        }
    }

    /// The aggregator configuration for this metric
    pub fn config(&self) -> MetricConfig {
        MetricConfig {
            source_entity: self.source_entity(),
            value_field: self.value_field().map(str::to_string),
            aggregation: self.aggregation(),
            timestamp: self.source_entity().default_timestamp(),
        }
    }

    pub fn all() -> &'static [Metric] {
        &[
            Self::RiskCount,
            Self::RiskScoreAverage,
            Self::RiskScorePeak,
            Self::IncidentCount,
            Self::IncidentSeverity,
            Self::IncidentImpactTotal,
            Self::ComplianceScore,
            Self::ComplianceScoreLow,
        ]
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Metric {
    type Err = Error;

    /// Accepts snake_case or kebab-case names
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Metric::all()
            .iter()
            .copied()
            .find(|m| m.as_str() == normalized)
            .ok_or_else(|| Error::Configuration(format!("Unknown metric: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregation_parsing() {
        assert_eq!(
            AggregationKind::from_str("AVG").unwrap(),
            AggregationKind::Avg
        );
        assert_eq!(
            AggregationKind::from_str("mean").unwrap(),
            AggregationKind::Avg
        );

        let err = AggregationKind::from_str("median").unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("median"));
    }

    #[test]
    fn test_metric_config_requires_field() {
        let err = MetricConfig::new(SourceEntity::Risk, None, AggregationKind::Sum).unwrap_err();
        assert!(err.is_configuration());

        let err =
            MetricConfig::new(SourceEntity::Risk, Some("  "), AggregationKind::Max).unwrap_err();
        assert!(err.is_configuration());

        let count = MetricConfig::new(SourceEntity::Incident, None, AggregationKind::Count).unwrap();
        assert_eq!(count.label(), "count(incident)");
        assert_eq!(count.timestamp, TimestampField::CreatedAt);
    }

    #[test]
    fn test_compliance_metrics_use_assessment_date() {
        for metric in [Metric::ComplianceScore, Metric::ComplianceScoreLow] {
            assert_eq!(metric.config().timestamp, TimestampField::AssessmentDate);
        }
        assert_eq!(
            Metric::RiskCount.config().timestamp,
            TimestampField::CreatedAt
        );
    }

    #[test]
    fn test_metric_catalog_round_trip_names() {
        for metric in Metric::all() {
            assert_eq!(Metric::from_str(metric.as_str()).unwrap(), *metric);
            let kebab = metric.as_str().replace('_', "-");
            assert_eq!(Metric::from_str(&kebab).unwrap(), *metric);

            let config = metric.config();
            assert_eq!(config.value_field.is_some(), metric.aggregation().needs_field());
        }

        assert!(Metric::from_str("audit_count").unwrap_err().is_configuration());
    }

    #[test]
    fn test_metric_config_parses_its_label() {
        let config = MetricConfig::from_str("avg(risk.risk_score)").unwrap();
        assert_eq!(config, Metric::RiskScoreAverage.config());
        assert_eq!(MetricConfig::from_str(&config.label()).unwrap(), config);

        let count = MetricConfig::from_str(" count(incidents) ").unwrap();
        assert_eq!(count, Metric::IncidentCount.config());

        for bad in ["avg", "avg(risk.risk_score", "sum(incident)", "median(risk.x)", "avg(audit.x)"] {
            assert!(
                MetricConfig::from_str(bad).unwrap_err().is_configuration(),
                "{}",
                bad
            );
        }
    }
}
