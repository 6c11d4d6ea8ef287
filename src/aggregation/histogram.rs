use anyhow::Result;

use crate::aggregation::operations::{AggregationType, ValueAccum, aggregate_feature};
use crate::record::FeatureRecord;

/// With `n` ticks the result has `n + 1` buckets: below the first tick, one
/// half-open bucket `[ticks[i - 1], ticks[i])` per pair of ticks, and at or
/// above the last tick. Records without a value land in no bucket; empty
/// buckets read 0.
pub fn histogram(
    records: &[&FeatureRecord],
    ticks: &[f64],
    values_columns: &[String],
    operation: AggregationType,
    join: Option<AggregationType>,
) -> Result<Vec<f64>> {
    let mut ticks = ticks.to_vec();
    ticks.sort_by(f64::total_cmp);

    let mut buckets = vec![ValueAccum::default(); ticks.len() + 1];
    for record in records {
        let Some(value) = aggregate_feature(record, values_columns, join)? else {
            continue;
        };
        let bucket = ticks.partition_point(|tick| *tick <= value);
        buckets[bucket].add(value);
    }

    Ok(buckets
        .iter()
        .map(|bucket| {
            if bucket.count() == 0 {
                0.0
            } else {
                bucket.finish(operation).unwrap_or(0.0)
            }
        })
        .collect())
}
