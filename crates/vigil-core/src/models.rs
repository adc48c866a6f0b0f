//! Domain models for Vigil
//!
//! Records arrive already fetched from the hosted data service. Only the
//! timestamps and the numeric fields a metric reads are interpreted here;
//! everything else rides along untouched in `fields`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Entity tables that feed the analytics views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceEntity {
    Risk,
    Incident,
    ComplianceAssessment,
}

impl SourceEntity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Risk => "risk",
            Self::Incident => "incident",
            Self::ComplianceAssessment => "compliance_assessment",
        }
    }

    /// Which timestamp groups this entity's records into days by default
    pub fn default_timestamp(&self) -> TimestampField {
        match self {
            Self::Risk | Self::Incident => TimestampField::CreatedAt,
            Self::ComplianceAssessment => TimestampField::AssessmentDate,
        }
    }
}

impl std::str::FromStr for SourceEntity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "risk" | "risks" => Ok(Self::Risk),
            "incident" | "incidents" => Ok(Self::Incident),
            "compliance_assessment" | "compliance_assessments" | "compliance" => {
                Ok(Self::ComplianceAssessment)
            }
            _ => Err(Error::Configuration(format!("Unknown source entity: {}", s))),
        }
    }
}

impl std::fmt::Display for SourceEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Timestamp a record is bucketed by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampField {
    /// When the record was created
    CreatedAt,
    /// Framework assessment date (compliance-scored entities)
    AssessmentDate,
}

/// A raw entity record as exported by the data store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub entity: SourceEntity,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub assessment_date: Option<NaiveDate>,
    /// Remaining columns (scores, impacts, statuses, ...)
    #[serde(default)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl EntityRecord {
    /// Create a record with no extra fields
    pub fn new(entity: SourceEntity, created_at: DateTime<Utc>) -> Self {
        Self {
            id: None,
            entity,
            created_at,
            assessment_date: None,
            fields: serde_json::Map::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_assessment_date(mut self, date: NaiveDate) -> Self {
        self.assessment_date = Some(date);
        self
    }

    /// Set a field value (numbers, strings, anything JSON)
    pub fn with_field(
        mut self,
        name: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Calendar day this record falls on for the given timestamp field
    ///
    /// Assessment-dated records without an assessment date fall back to
    /// their creation day.
    pub fn date_for(&self, field: TimestampField) -> NaiveDate {
        match field {
            TimestampField::CreatedAt => self.created_at.date_naive(),
            TimestampField::AssessmentDate => self
                .assessment_date
                .unwrap_or_else(|| self.created_at.date_naive()),
        }
    }

    /// Read a field as a number
    ///
    /// Numeric strings are accepted since some exports quote every column.
    pub fn numeric(&self, field: &str) -> Option<f64> {
        match self.fields.get(field)? {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|v| v.is_finite())
    }
}
