//! Record import from JSON and CSV exports
//!
//! The data service exports records either as a JSON array of
//! [`EntityRecord`]s or as CSV with one column per field.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use csv::{ReaderBuilder, StringRecord};
use serde_json::{Number, Value};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{EntityRecord, SourceEntity};

/// Columns with a fixed meaning; everything else becomes a field
const RESERVED_COLUMNS: &[&str] = &["id", "entity", "created_at", "assessment_date"];

/// Parse a JSON array of records
pub fn parse_json<R: Read>(reader: R) -> Result<Vec<EntityRecord>> {
    let records: Vec<EntityRecord> = serde_json::from_reader(reader)
        .map_err(|e| Error::Import(format!("Invalid records JSON: {}", e)))?;
    debug!(count = records.len(), "Parsed JSON records");
    Ok(records)
}

/// Parse CSV records
///
/// Requires a `created_at` column (RFC 3339, `YYYY-MM-DD HH:MM:SS` or
/// `YYYY-MM-DD`). `id` and `assessment_date` are optional. With `entity`
/// set every row belongs to that entity, otherwise an `entity` column is
/// required. Remaining non-empty cells become fields, numeric when they
/// parse as a number.
pub fn parse_csv<R: Read>(reader: R, entity: Option<SourceEntity>) -> Result<Vec<EntityRecord>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));

    let created_col = column("created_at")
        .ok_or_else(|| Error::Import("Missing required column: created_at".into()))?;
    let entity_col = column("entity");
    if entity.is_none() && entity_col.is_none() {
        return Err(Error::Import(
            "Missing required column: entity (or choose an entity explicitly)".into(),
        ));
    }
    let id_col = column("id");
    let assessment_col = column("assessment_date");

    let mut records = Vec::new();

    for result in rdr.records() {
        let row = result?;
        let line = row.position().map(|p| p.line()).unwrap_or(0);
        let cell = |col: Option<usize>| col.and_then(|c| row.get(c)).filter(|v| !v.is_empty());
        let row_error = |msg: String| Error::Import(format!("Line {}: {}", line, msg));

        let row_entity = match entity {
            Some(e) => e,
            None => cell(entity_col)
                .ok_or_else(|| row_error("missing entity".into()))?
                .parse::<SourceEntity>()
                .map_err(|e| row_error(e.to_string()))?,
        };

        let created_raw = cell(Some(created_col))
            .ok_or_else(|| row_error("missing created_at".into()))?;
        let created_at = parse_timestamp(created_raw)
            .ok_or_else(|| row_error(format!("invalid created_at: {}", created_raw)))?;

        let mut record = EntityRecord::new(row_entity, created_at);

        if let Some(id) = cell(id_col) {
            record = record.with_id(id);
        }
        if let Some(raw) = cell(assessment_col) {
            let date = parse_date(raw)
                .ok_or_else(|| row_error(format!("invalid assessment_date: {}", raw)))?;
            record = record.with_assessment_date(date);
        }

        record.fields = row_fields(&headers, &row);
        records.push(record);
    }

    debug!(count = records.len(), "Parsed CSV records");
    Ok(records)
}

/// Load records from a `.json` or `.csv` file
///
/// CSV files must carry an `entity` column.
pub fn load_records(path: &Path) -> Result<Vec<EntityRecord>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);

    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let records = match extension.as_deref() {
        Some("json") => parse_json(reader)?,
        Some("csv") => parse_csv(reader, None)?,
        _ => {
            return Err(Error::Import(format!(
                "Unsupported record file (expected .json or .csv): {}",
                path.display()
            )))
        }
    };

    debug!(path = %path.display(), count = records.len(), "Loaded records");
    Ok(records)
}

/// Non-reserved, non-empty cells as JSON values
fn row_fields(headers: &StringRecord, row: &StringRecord) -> serde_json::Map<String, Value> {
    headers
        .iter()
        .zip(row.iter())
        .filter(|(h, v)| {
            !v.is_empty() && !RESERVED_COLUMNS.iter().any(|r| h.eq_ignore_ascii_case(r))
        })
        .map(|(h, v)| (h.to_string(), cell_value(v)))
        .collect()
}

fn cell_value(raw: &str) -> Value {
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(raw.to_string()))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    parse_date(raw).and_then(|d| d.and_hms_opt(0, 0, 0)).map(|dt| dt.and_utc())
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}
