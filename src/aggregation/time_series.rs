use std::collections::BTreeMap;

use anyhow::Result;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::aggregation::operations::{AggregationType, ValueAccum, aggregate_feature};
use crate::error::WidgetError;
use crate::record::{FeatureRecord, timestamp_ms};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeStep {
    Year,
    Quarter,
    Month,
    Week,
    Day,
    Hour,
    Minute,
    Second,
}

impl TimeStep {
    pub fn from_str(name: &str) -> Option<Self> {
        match name {
            "year" => Some(TimeStep::Year),
            "quarter" => Some(TimeStep::Quarter),
            "month" => Some(TimeStep::Month),
            "week" => Some(TimeStep::Week),
            "day" => Some(TimeStep::Day),
            "hour" => Some(TimeStep::Hour),
            "minute" => Some(TimeStep::Minute),
            "second" => Some(TimeStep::Second),
            _ => None,
        }
    }

    /// Start of the UTC step containing `time`. Weeks start on Monday.
    pub fn truncate(&self, time: NaiveDateTime) -> Option<NaiveDateTime> {
        let date = time.date();
        let start = match self {
            TimeStep::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1)?.and_hms_opt(0, 0, 0)?,
            TimeStep::Quarter => {
                let month = (date.month0() / 3) * 3 + 1;
                NaiveDate::from_ymd_opt(date.year(), month, 1)?.and_hms_opt(0, 0, 0)?
            }
            TimeStep::Month => {
                NaiveDate::from_ymd_opt(date.year(), date.month(), 1)?.and_hms_opt(0, 0, 0)?
            }
            TimeStep::Week => {
                let monday =
                    date - Duration::days(i64::from(date.weekday().num_days_from_monday()));
                monday.and_hms_opt(0, 0, 0)?
            }
            TimeStep::Day => date.and_hms_opt(0, 0, 0)?,
            TimeStep::Hour => date.and_hms_opt(time.hour(), 0, 0)?,
            TimeStep::Minute => date.and_hms_opt(time.hour(), time.minute(), 0)?,
            TimeStep::Second => date.and_hms_opt(time.hour(), time.minute(), time.second())?,
        };
        Some(start)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesEntry {
    pub name: i64,
    pub value: Option<f64>,
}

pub fn time_series(
    records: &[&FeatureRecord],
    time_column: &str,
    step: TimeStep,
    values_columns: &[String],
    operation: AggregationType,
    join: Option<AggregationType>,
) -> Result<Vec<TimeSeriesEntry>> {
    let mut steps: BTreeMap<i64, (u64, ValueAccum)> = BTreeMap::new();
    for record in records {
        let Some(raw) = record.get(time_column) else {
            continue;
        };
        let invalid = || WidgetError::InvalidDate(raw.to_string());
        let ms = timestamp_ms(raw).ok_or_else(invalid)?;
        let time = DateTime::from_timestamp_millis(ms as i64)
            .ok_or_else(invalid)?
            .naive_utc();
        let start = step
            .truncate(time)
            .ok_or_else(invalid)?
            .and_utc()
            .timestamp_millis();

        let value = if values_columns.is_empty() {
            None
        } else {
            aggregate_feature(record, values_columns, join)?
        };
        let (features, values) = steps.entry(start).or_default();
        *features += 1;
        if let Some(value) = value {
            values.add(value);
        }
    }

    Ok(steps
        .into_iter()
        .map(|(name, (features, values))| TimeSeriesEntry {
            name,
            value: match operation {
                AggregationType::Count => Some(features as f64),
                other => values.finish(other),
            },
        })
        .collect())
}
