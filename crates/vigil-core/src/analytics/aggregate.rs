//! Metric aggregation - raw entity records into a gap-filled daily series

use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;
use tracing::debug;

use crate::models::EntityRecord;

use super::metrics::{AggregationKind, MetricConfig};
use super::request::DateRange;
use super::types::{round2, TimeSeriesPoint};

/// Running accumulator for one calendar day
#[derive(Debug, Default, Clone, Copy)]
struct DayBucket {
    count: usize,
    sum: f64,
    max: Option<f64>,
    min: Option<f64>,
}

impl DayBucket {
    fn push(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
    }

    fn value(&self, aggregation: AggregationKind) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        match aggregation {
            AggregationKind::Count => self.count as f64,
            AggregationKind::Sum => self.sum,
            AggregationKind::Avg => self.sum / self.count as f64,
            AggregationKind::Max => self.max.unwrap_or(0.0),
            AggregationKind::Min => self.min.unwrap_or(0.0),
        }
    }
}

/// Turns entity records into one value per calendar day
pub struct MetricAggregator;

impl MetricAggregator {
    /// Aggregate records into a daily series covering `start..=end`
    ///
    /// Every day in the range gets exactly one point, in ascending order. Days
    /// without contributing records are 0. Records of other entities, or
    /// outside the range, are ignored. For value aggregations a record whose
    /// field is missing or non-numeric contributes nothing; for counts every
    /// record counts. An inverted range yields an empty series.
    pub fn aggregate(
        records: &[EntityRecord],
        config: &MetricConfig,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<TimeSeriesPoint> {
        if end < start {
            debug!(%start, %end, "Inverted range, returning empty series");
            return Vec::new();
        }

        let mut buckets: BTreeMap<NaiveDate, DayBucket> = BTreeMap::new();
        let mut skipped = 0usize;

        for record in records.iter().filter(|r| r.entity == config.source_entity) {
            let day = record.date_for(config.timestamp);
            if day < start || day > end {
                continue;
            }

            let value = match (config.aggregation, config.value_field.as_deref()) {
                (AggregationKind::Count, _) => 1.0,
                (_, Some(field)) => match record.numeric(field) {
                    Some(v) => v,
                    None => {
                        skipped += 1;
                        continue;
                    }
                },
                // MetricConfig::new refuses this combination
                (_, None) => {
                    skipped += 1;
                    continue;
                }
            };

            buckets.entry(day).or_default().push(value);
        }

        let days = (end - start).num_days() + 1;
        let series: Vec<TimeSeriesPoint> = (0..days)
            .map(|offset| {
                let date = start + Duration::days(offset);
                let value = buckets
                    .get(&date)
                    .map(|b| b.value(config.aggregation))
                    .unwrap_or(0.0);
                TimeSeriesPoint::new(date, round2(value))
            })
            .collect();

        debug!(
            metric = %config.label(),
            days = series.len(),
            active_days = buckets.len(),
            skipped,
            "Aggregated metric series"
        );

        series
    }

    /// Aggregate over a validated range
    pub fn aggregate_range(
        records: &[EntityRecord],
        config: &MetricConfig,
        range: &DateRange,
    ) -> Vec<TimeSeriesPoint> {
        Self::aggregate(records, config, range.start(), range.end())
    }
}
