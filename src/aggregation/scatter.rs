use anyhow::Result;

use crate::aggregation::operations::{AggregationType, aggregate_feature};
use crate::record::FeatureRecord;

pub fn scatter_plot(
    records: &[&FeatureRecord],
    x_columns: &[String],
    x_join: Option<AggregationType>,
    y_columns: &[String],
    y_join: Option<AggregationType>,
) -> Result<Vec<[f64; 2]>> {
    let mut points = Vec::with_capacity(records.len());
    for record in records {
        let x = aggregate_feature(record, x_columns, x_join)?;
        let y = aggregate_feature(record, y_columns, y_join)?;
        if let (Some(x), Some(y)) = (x, y) {
            points.push([x, y]);
        }
    }
    Ok(points)
}
