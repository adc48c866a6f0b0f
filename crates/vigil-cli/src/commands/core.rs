//! Shared utilities for the analysis commands
//!
//! This module contains:
//! - `load_config` - Resolve the analytics config
//! - `load_records` - Read a records export
//! - `resolve_range` / `build_request` - Turn CLI flags into a validated request

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::debug;
use vigil_core::{AnalysisRequest, AnalyticsConfig, DateRange, EntityRecord, ForecastHorizon};

use crate::cli::SeriesArgs;

/// Explicit `--config` file, else the data dir override, else built-in defaults
pub fn load_config(path: Option<&Path>) -> Result<AnalyticsConfig> {
    let config = match path {
        Some(path) => AnalyticsConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AnalyticsConfig::load().context("Failed to load analytics config")?,
    };
    debug!(
        source = %config
            .source
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "embedded".to_string()),
        "Analytics config loaded"
    );
    Ok(config)
}

pub fn load_records(path: &Path) -> Result<Vec<EntityRecord>> {
    vigil_core::import::load_records(path)
        .with_context(|| format!("Failed to load records from {}", path.display()))
}

fn parse_date(value: &str, flag: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("Invalid {} date '{}' (use YYYY-MM-DD)", flag, value))
}

/// `--from/--to`, else `--period`, else the configured lookback ending `today`
pub fn resolve_range(
    args: &SeriesArgs,
    config: &AnalyticsConfig,
    today: NaiveDate,
) -> Result<DateRange> {
    let range = match (&args.from, &args.to, &args.period) {
        (Some(from), Some(to), _) => {
            DateRange::new(parse_date(from, "--from")?, parse_date(to, "--to")?)?
        }
        (_, _, Some(period)) => DateRange::from_period(period, today)?,
        _ => DateRange::last_days(today, config.lookback_days)?,
    };
    Ok(range)
}

/// Validated analysis request for the given flags
pub fn build_request(
    args: &SeriesArgs,
    config: &AnalyticsConfig,
    horizon: Option<u32>,
    today: NaiveDate,
) -> Result<AnalysisRequest> {
    let range = resolve_range(args, config, today)?;
    let horizon = match horizon {
        Some(days) => ForecastHorizon::new(days)?,
        None => config.forecast_horizon,
    };
    Ok(AnalysisRequest::parse(&args.metric, range, horizon)?)
}
