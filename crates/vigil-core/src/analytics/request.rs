//! Validated analysis requests
//!
//! The engine itself tolerates odd input (an inverted range simply yields an
//! empty series). The request layer used by the CLI and the server is
//! stricter and rejects such input up front as a configuration error.

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::Serialize;

use crate::error::{Error, Result};

use super::metrics::{Metric, MetricConfig};

/// Shortest forecast a caller may ask for
pub const MIN_HORIZON_DAYS: u32 = 7;
/// Longest forecast a caller may ask for
pub const MAX_HORIZON_DAYS: u32 = 365;
/// Longest range a caller may analyse (ten years plus leap days)
pub const MAX_RANGE_DAYS: u32 = 3653;

/// Named periods accepted by [`DateRange::from_period`]
pub const PERIODS: &[&str] = &[
    "last-7-days",
    "last-30-days",
    "last-90-days",
    "last-12-months",
    "this-month",
    "this-year",
];

/// Inclusive calendar-day range with `start <= end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(Error::Configuration(format!(
                "Date range end {} is before start {}",
                end, start
            )));
        }
        let days = (end - start).num_days() + 1;
        if days > i64::from(MAX_RANGE_DAYS) {
            return Err(Error::Configuration(format!(
                "Date range spans {} days, the limit is {}",
                days, MAX_RANGE_DAYS
            )));
        }
        Ok(Self { start, end })
    }

    /// The `days` calendar days ending on `end` (inclusive)
    pub fn last_days(end: NaiveDate, days: u32) -> Result<Self> {
        if days == 0 {
            return Err(Error::Configuration(
                "Date range must span at least one day".into(),
            ));
        }
        if days > MAX_RANGE_DAYS {
            return Err(Error::Configuration(format!(
                "Date range spans {} days, the limit is {}",
                days, MAX_RANGE_DAYS
            )));
        }
        let start = end
            .checked_sub_signed(Duration::days(i64::from(days) - 1))
            .ok_or_else(|| {
                Error::Configuration(format!("{} days before {} is out of range", days, end))
            })?;
        Self::new(start, end)
    }

    /// Resolve a named period relative to `today`
    pub fn from_period(period: &str, today: NaiveDate) -> Result<Self> {
        match period.trim().to_lowercase().as_str() {
            "last-7-days" => Self::last_days(today, 7),
            "last-30-days" => Self::last_days(today, 30),
            "last-90-days" => Self::last_days(today, 90),
            "last-12-months" => {
                let start = today
                    .checked_sub_months(Months::new(12))
                    .and_then(|d| d.succ_opt())
                    .ok_or_else(|| Error::Configuration("Date out of range".into()))?;
                Self::new(start, today)
            }
            "this-month" => Self::new(today.with_day(1).unwrap_or(today), today),
            "this-year" => Self::new(today.with_ordinal(1).unwrap_or(today), today),
            _ => Err(Error::Configuration(format!(
                "Unknown period: {}. Available: {}",
                period,
                PERIODS.join(", ")
            ))),
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of days in the range, both ends included
    pub fn days(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }
}

/// Number of days to forecast, within 7..=365
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ForecastHorizon(u32);

impl ForecastHorizon {
    pub fn new(days: u32) -> Result<Self> {
        if !(MIN_HORIZON_DAYS..=MAX_HORIZON_DAYS).contains(&days) {
            return Err(Error::Configuration(format!(
                "Forecast horizon must be between {} and {} days, got {}",
                MIN_HORIZON_DAYS, MAX_HORIZON_DAYS, days
            )));
        }
        Ok(Self(days))
    }

    pub fn days(&self) -> usize {
        self.0 as usize
    }
}

impl Default for ForecastHorizon {
    fn default() -> Self {
        Self(30)
    }
}

/// One (metric, range, horizon) analysis request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRequest {
    /// Display name used in reports and narrative prompts
    pub label: String,
    pub metric: MetricConfig,
    pub range: DateRange,
    pub horizon: ForecastHorizon,
}

impl AnalysisRequest {
    /// Request for an ad hoc metric, labelled by its configuration
    pub fn new(metric: MetricConfig, range: DateRange, horizon: ForecastHorizon) -> Self {
        Self {
            label: metric.label(),
            metric,
            range,
            horizon,
        }
    }

    /// Request for a catalog metric
    pub fn for_metric(metric: Metric, range: DateRange, horizon: ForecastHorizon) -> Self {
        Self {
            label: metric.label().to_string(),
            metric: metric.config(),
            range,
            horizon,
        }
    }

    /// Request for a catalog metric name, or an ad hoc `agg(entity.field)`
    pub fn parse(
        metric: &str,
        range: DateRange,
        horizon: ForecastHorizon,
    ) -> Result<Self> {
        if metric.contains('(') {
            return Ok(Self::new(metric.parse()?, range, horizon));
        }
        Ok(Self::for_metric(metric.parse()?, range, horizon))
    }
}
