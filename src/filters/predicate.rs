use anyhow::Result;

use crate::error::WidgetError;
use crate::filters::kinds::CompiledFilter;
use crate::filters::types::{FilterKind, Filters, LogicalOperator};
use crate::record::{FeatureRecord, Scalar};

#[derive(Debug, Clone)]
pub struct ColumnFilter {
    pub column: String,
    checks: Vec<CompiledFilter>,
    pub(crate) sample_value: Option<Scalar>,
}

impl ColumnFilter {
    pub fn matches(&self, value: Option<&Scalar>) -> Result<bool> {
        for check in &self.checks {
            if !check.matches(value)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[derive(Debug, Clone)]
pub struct CompiledFilters {
    columns: Vec<ColumnFilter>,
    operator: LogicalOperator,
}

impl CompiledFilters {
    pub fn compile(
        filters: &Filters,
        operator: LogicalOperator,
        owner: Option<&str>,
    ) -> Result<Self> {
        let mut columns = Vec::new();
        for (column, kinds) in filters.iter() {
            let mut checks = Vec::new();
            let mut sample_value = None;
            for (kind_name, spec) in kinds.iter() {
                let kind = FilterKind::from_str(kind_name)
                    .ok_or_else(|| WidgetError::UnsupportedFilter(kind_name.clone()))?;
                if owner.is_some() && spec.owner.as_deref() == owner {
                    continue;
                }
                if sample_value.is_none() {
                    sample_value = first_scalar(&spec.values);
                }
                checks.push(CompiledFilter::compile(kind, spec)?);
            }
            if !checks.is_empty() {
                columns.push(ColumnFilter {
                    column: column.clone(),
                    checks,
                    sample_value,
                });
            }
        }
        Ok(Self { columns, operator })
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[ColumnFilter] {
        &self.columns
    }

    pub fn combine<F>(&self, mut column_matches: F) -> Result<bool>
    where
        F: FnMut(&ColumnFilter) -> Result<bool>,
    {
        if self.columns.is_empty() {
            return Ok(true);
        }
        match self.operator {
            LogicalOperator::And => {
                for column in &self.columns {
                    if !column_matches(column)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            LogicalOperator::Or => {
                for column in &self.columns {
                    if column_matches(column)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    pub fn matches_record(&self, record: &FeatureRecord) -> Result<bool> {
        self.combine(|filter| filter.matches(record.get(&filter.column)))
    }
}

fn first_scalar(values: &[serde_json::Value]) -> Option<Scalar> {
    let first = values.first()?;
    match first {
        serde_json::Value::Array(items) => first_scalar(items),
        other => Some(crate::filters::kinds::json_to_scalar(other)),
    }
}

pub type FeaturePredicate = Box<dyn Fn(&FeatureRecord) -> Result<bool> + Send + Sync>;

pub fn build_feature_filter(
    filters: &Filters,
    operator: LogicalOperator,
) -> Result<FeaturePredicate> {
    let compiled = CompiledFilters::compile(filters, operator, None)?;
    Ok(Box::new(move |record| compiled.matches_record(record)))
}

pub fn apply_filters<'a>(
    records: impl IntoIterator<Item = &'a FeatureRecord>,
    filters: &CompiledFilters,
) -> Result<Vec<&'a FeatureRecord>> {
    let mut kept = Vec::new();
    for record in records {
        if filters.matches_record(record)? {
            kept.push(record);
        }
    }
    Ok(kept)
}
