use std::cmp::Ordering;

use anyhow::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::aggregation::operations::{AggregationType, ValueAccum, aggregate_feature};
use crate::record::{FeatureRecord, Scalar};

pub const OTHERS_CATEGORY: &str = "_carto_others";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderBy {
    #[default]
    FrequencyDesc,
    FrequencyAsc,
    AlphabeticalAsc,
    AlphabeticalDesc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GroupByOptions {
    pub others_threshold: Option<usize>,
    pub order_by: OrderBy,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryEntry {
    pub name: Scalar,
    pub value: Option<f64>,
}

struct Group {
    name: Scalar,
    features: u64,
    values: ValueAccum,
}

impl Group {
    fn value(&self, operation: AggregationType) -> Option<f64> {
        match operation {
            AggregationType::Count => Some(self.features as f64),
            other => self.values.finish(other),
        }
    }
}

/// Scalars hash as their kind plus their text so numbers and strings that
/// print alike stay apart.
fn group_key(value: &Scalar) -> String {
    match value {
        Scalar::Null => "null".to_string(),
        Scalar::Bool(flag) => format!("b:{flag}"),
        Scalar::Number(number) => format!("n:{}", number.to_bits()),
        Scalar::String(text) => format!("s:{text}"),
    }
}

fn compare_values(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

pub fn group_by(
    records: &[&FeatureRecord],
    keys_column: &str,
    values_columns: &[String],
    operation: AggregationType,
    join: Option<AggregationType>,
    options: &GroupByOptions,
) -> Result<Vec<CategoryEntry>> {
    let mut groups: IndexMap<String, Group> = IndexMap::new();
    for record in records {
        let name = record.get(keys_column).cloned().unwrap_or_default();
        let value = if values_columns.is_empty() {
            None
        } else {
            aggregate_feature(record, values_columns, join)?
        };
        let group = groups.entry(group_key(&name)).or_insert_with(|| Group {
            name,
            features: 0,
            values: ValueAccum::default(),
        });
        group.features += 1;
        if let Some(value) = value {
            group.values.add(value);
        }
    }

    let mut groups: Vec<Group> = groups.into_values().collect();
    match options.order_by {
        OrderBy::FrequencyDesc => groups.sort_by(|a, b| {
            compare_values(b.value(operation), a.value(operation))
        }),
        OrderBy::FrequencyAsc => groups.sort_by(|a, b| {
            compare_values(a.value(operation), b.value(operation))
        }),
        OrderBy::AlphabeticalAsc => groups.sort_by(|a, b| a.name.sort_cmp(&b.name)),
        OrderBy::AlphabeticalDesc => groups.sort_by(|a, b| b.name.sort_cmp(&a.name)),
    }

    let mut others = None;
    if let Some(threshold) = options.others_threshold {
        if groups.len() > threshold {
            let rest = groups.split_off(threshold);
            let mut merged = Group {
                name: Scalar::String(OTHERS_CATEGORY.to_string()),
                features: 0,
                values: ValueAccum::default(),
            };
            for group in rest.iter() {
                merged.features += group.features;
                merged.values.merge(&group.values);
            }
            others = Some(merged);
        }
    }

    Ok(groups
        .iter()
        .chain(others.iter())
        .map(|group| CategoryEntry {
            name: group.name.clone(),
            value: group.value(operation),
        })
        .collect())
}
