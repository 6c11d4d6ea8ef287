use anyhow::Result;
use serde::Serialize;

use crate::aggregation::operations::{AggregationType, ValueAccum, aggregate_feature};
use crate::record::FeatureRecord;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

pub fn value_range(
    records: &[&FeatureRecord],
    columns: &[String],
    join: Option<AggregationType>,
) -> Result<Option<ValueRange>> {
    let mut accum = ValueAccum::default();
    for record in records {
        if let Some(value) = aggregate_feature(record, columns, join)? {
            accum.add(value);
        }
    }
    Ok(accum
        .finish(AggregationType::Min)
        .zip(accum.finish(AggregationType::Max))
        .map(|(min, max)| ValueRange { min, max }))
}
