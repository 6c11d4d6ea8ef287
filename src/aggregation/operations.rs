use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::error::WidgetError;
use crate::record::FeatureRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationType {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregationType {
    pub fn from_str(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "count" => Some(AggregationType::Count),
            "sum" => Some(AggregationType::Sum),
            "avg" => Some(AggregationType::Avg),
            "min" => Some(AggregationType::Min),
            "max" => Some(AggregationType::Max),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AggregationType::Count => "count",
            AggregationType::Sum => "sum",
            AggregationType::Avg => "avg",
            AggregationType::Min => "min",
            AggregationType::Max => "max",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ValueAccum {
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
}

impl ValueAccum {
    pub fn add(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        self.sum += value;
    }

    pub fn merge(&mut self, other: &ValueAccum) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = *other;
            return;
        }
        self.count += other.count;
        self.sum += other.sum;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Result of `operation` over the values added so far. `count` and `sum`
    /// of nothing are zero, the other operations have no value.
    pub fn finish(&self, operation: AggregationType) -> Option<f64> {
        let has_values = self.count > 0;
        match operation {
            AggregationType::Count => Some(self.count as f64),
            AggregationType::Sum => Some(self.sum),
            AggregationType::Avg => has_values.then(|| self.sum / self.count as f64),
            AggregationType::Min => has_values.then_some(self.min),
            AggregationType::Max => has_values.then_some(self.max),
        }
    }
}

impl FromIterator<f64> for ValueAccum {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut accum = ValueAccum::default();
        for value in iter {
            accum.add(value);
        }
        accum
    }
}

pub fn aggregate_values(values: &[f64], operation: AggregationType) -> Option<f64> {
    values.iter().copied().collect::<ValueAccum>().finish(operation)
}

pub fn aggregate_feature(
    record: &FeatureRecord,
    columns: &[String],
    join: Option<AggregationType>,
) -> Result<Option<f64>> {
    match columns {
        [] => Ok(None),
        [column] => Ok(record.get_f64(column).filter(|value| !value.is_nan())),
        _ => {
            let join = join.ok_or(WidgetError::MissingJoinOperation(columns.len()))?;
            let accum: ValueAccum = columns
                .iter()
                .filter_map(|column| record.get_f64(column))
                .filter(|value| !value.is_nan())
                .collect();
            if accum.count() == 0 {
                return Ok(None);
            }
            Ok(accum.finish(join))
        }
    }
}

pub fn aggregate(
    records: &[&FeatureRecord],
    columns: &[String],
    operation: AggregationType,
    join: Option<AggregationType>,
) -> Result<Option<f64>> {
    if operation == AggregationType::Count && columns.is_empty() {
        return Ok(Some(records.len() as f64));
    }
    let mut accum = ValueAccum::default();
    for record in records {
        if let Some(value) = aggregate_feature(record, columns, join)? {
            accum.add(value);
        }
    }
    Ok(accum.finish(operation))
}
