use anyhow::Result;

use crate::filters::predicate::{ColumnFilter, CompiledFilters};
use crate::filters::types::{Filters, LogicalOperator};
use crate::record::Scalar;
use crate::tiles::types::BinaryAttributes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnLocation {
    Properties,
    NumericProps,
}

/// Where a column lives is guessed from its filter values: string values are
/// looked up in the properties table, anything else in `numeric_props`.
#[derive(Debug, Clone)]
pub struct BinaryFilter {
    compiled: CompiledFilters,
    locations: Vec<ColumnLocation>,
}

impl BinaryFilter {
    pub fn new(compiled: CompiledFilters) -> Self {
        let locations = compiled
            .columns()
            .iter()
            .map(|column| match column.sample_value {
                Some(Scalar::String(_)) => ColumnLocation::Properties,
                _ => ColumnLocation::NumericProps,
            })
            .collect();
        Self {
            compiled,
            locations,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.compiled.is_empty()
    }

    pub fn matches(&self, attributes: &BinaryAttributes, vertex: usize) -> Result<bool> {
        let mut index = 0;
        self.compiled.combine(|column| {
            let location = self.locations[index];
            index += 1;
            column_matches(column, location, attributes, vertex)
        })
    }
}

fn column_matches(
    column: &ColumnFilter,
    location: ColumnLocation,
    attributes: &BinaryAttributes,
    vertex: usize,
) -> Result<bool> {
    match location {
        ColumnLocation::Properties => column.matches(attributes.property(vertex, &column.column)),
        ColumnLocation::NumericProps => match attributes.numeric_prop(vertex, &column.column) {
            Some(number) => column.matches(Some(&Scalar::Number(number))),
            None => column.matches(attributes.property(vertex, &column.column)),
        },
    }
}

pub fn build_binary_filter(filters: &Filters, operator: LogicalOperator) -> Result<BinaryFilter> {
    Ok(BinaryFilter::new(CompiledFilters::compile(
        filters, operator, None,
    )?))
}
