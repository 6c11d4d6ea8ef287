use std::cmp::Ordering;

use anyhow::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregation::{
    AggregationType, CategoryEntry, GroupByOptions, OrderBy, TimeSeriesEntry, TimeStep,
    ValueRange, aggregate, group_by, histogram, scatter_plot, time_series, value_range,
};
use crate::error::WidgetError;
use crate::filters::{CompiledFilters, FilterOptions, Filters, apply_filters};
use crate::record::{FeatureRecord, Scalar};
use crate::store::FeatureSnapshot;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ColumnRef {
    One(String),
    Many(Vec<String>),
}

impl Default for ColumnRef {
    fn default() -> Self {
        ColumnRef::Many(Vec::new())
    }
}

impl ColumnRef {
    pub fn columns(&self) -> Vec<String> {
        match self {
            ColumnRef::One(column) => vec![column.clone()],
            ColumnRef::Many(columns) => columns.clone(),
        }
    }
}

fn default_count() -> AggregationType {
    AggregationType::Count
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormulaRequest {
    #[serde(default)]
    pub column: ColumnRef,
    pub operation: AggregationType,
    #[serde(default)]
    pub join_operation: Option<AggregationType>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoriesRequest {
    pub column: String,
    #[serde(default)]
    pub operation_column: ColumnRef,
    #[serde(default = "default_count")]
    pub operation: AggregationType,
    #[serde(default)]
    pub join_operation: Option<AggregationType>,
    #[serde(default)]
    pub others_threshold: Option<usize>,
    #[serde(default)]
    pub order_by: OrderBy,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramRequest {
    pub column: ColumnRef,
    pub ticks: Vec<f64>,
    #[serde(default = "default_count")]
    pub operation: AggregationType,
    #[serde(default)]
    pub join_operation: Option<AggregationType>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeRequest {
    pub column: ColumnRef,
    #[serde(default)]
    pub join_operation: Option<AggregationType>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScatterRequest {
    pub x_axis_column: ColumnRef,
    #[serde(default)]
    pub x_axis_join_operation: Option<AggregationType>,
    pub y_axis_column: ColumnRef,
    #[serde(default)]
    pub y_axis_join_operation: Option<AggregationType>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesRequest {
    pub column: String,
    pub step_size: TimeStep,
    #[serde(default)]
    pub operation_column: ColumnRef,
    #[serde(default = "default_count")]
    pub operation: AggregationType,
    #[serde(default)]
    pub join_operation: Option<AggregationType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableRequest {
    pub columns: Vec<String>,
    pub sort_by: Option<String>,
    pub sort_direction: SortDirection,
    pub offset: usize,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeaturesRequest {
    pub columns: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WidgetCall {
    Formula(FormulaRequest),
    Categories(CategoriesRequest),
    Histogram(HistogramRequest),
    Range(RangeRequest),
    Scatter(ScatterRequest),
    TimeSeries(TimeSeriesRequest),
    Table(TableRequest),
    Features(FeaturesRequest),
}

impl WidgetCall {
    pub fn kind(&self) -> &'static str {
        match self {
            WidgetCall::Formula(_) => "formula",
            WidgetCall::Categories(_) => "categories",
            WidgetCall::Histogram(_) => "histogram",
            WidgetCall::Range(_) => "range",
            WidgetCall::Scatter(_) => "scatter",
            WidgetCall::TimeSeries(_) => "time_series",
            WidgetCall::Table(_) => "table",
            WidgetCall::Features(_) => "features",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub filter_owner: Option<String>,
    pub widget: WidgetCall,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FormulaResult {
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableResult {
    pub rows: Vec<IndexMap<String, Scalar>>,
    pub total_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WidgetResult {
    Formula(FormulaResult),
    Categories(Vec<CategoryEntry>),
    Histogram(Vec<f64>),
    Range(Option<ValueRange>),
    Scatter(Vec<[f64; 2]>),
    TimeSeries(Vec<TimeSeriesEntry>),
    Table(TableResult),
    Features(Vec<FeatureRecord>),
}

#[derive(Debug, Clone)]
pub struct WidgetSource<'a> {
    snapshot: &'a FeatureSnapshot,
    filters: &'a Filters,
    options: FilterOptions,
}

impl<'a> WidgetSource<'a> {
    pub fn new(
        snapshot: &'a FeatureSnapshot,
        filters: &'a Filters,
        options: FilterOptions,
    ) -> Self {
        Self {
            snapshot,
            filters,
            options,
        }
    }

    pub fn filtered(&self, owner: Option<&str>) -> Result<Vec<&'a FeatureRecord>> {
        let compiled =
            CompiledFilters::compile(self.filters, self.options.filters_logical_operator, owner)?;
        apply_filters(self.snapshot.records(), &compiled)
    }

    /// Fails with [`WidgetError::InvalidColumn`] for a column no record has.
    /// Nothing can be proven missing from an empty snapshot.
    fn check_columns<'c>(&self, columns: impl IntoIterator<Item = &'c String>) -> Result<()> {
        if self.snapshot.is_empty() {
            return Ok(());
        }
        for column in columns {
            if !self.snapshot.has_column(column) {
                return Err(WidgetError::InvalidColumn(column.clone()).into());
            }
        }
        Ok(())
    }

    pub fn formula(&self, request: &FormulaRequest, owner: Option<&str>) -> Result<FormulaResult> {
        let columns = request.column.columns();
        self.check_columns(&columns)?;
        let records = self.filtered(owner)?;
        let value = aggregate(&records, &columns, request.operation, request.join_operation)?;
        Ok(FormulaResult { value })
    }

    pub fn categories(
        &self,
        request: &CategoriesRequest,
        owner: Option<&str>,
    ) -> Result<Vec<CategoryEntry>> {
        let values = request.operation_column.columns();
        self.check_columns(std::iter::once(&request.column).chain(values.iter()))?;
        let records = self.filtered(owner)?;
        group_by(
            &records,
            &request.column,
            &values,
            request.operation,
            request.join_operation,
            &GroupByOptions {
                others_threshold: request.others_threshold,
                order_by: request.order_by,
            },
        )
    }

    pub fn histogram(&self, request: &HistogramRequest, owner: Option<&str>) -> Result<Vec<f64>> {
        let columns = request.column.columns();
        self.check_columns(&columns)?;
        let records = self.filtered(owner)?;
        histogram(
            &records,
            &request.ticks,
            &columns,
            request.operation,
            request.join_operation,
        )
    }

    pub fn range(&self, request: &RangeRequest, owner: Option<&str>) -> Result<Option<ValueRange>> {
        let columns = request.column.columns();
        self.check_columns(&columns)?;
        let records = self.filtered(owner)?;
        value_range(&records, &columns, request.join_operation)
    }

    pub fn scatter(&self, request: &ScatterRequest, owner: Option<&str>) -> Result<Vec<[f64; 2]>> {
        let x_columns = request.x_axis_column.columns();
        let y_columns = request.y_axis_column.columns();
        self.check_columns(x_columns.iter().chain(y_columns.iter()))?;
        let records = self.filtered(owner)?;
        scatter_plot(
            &records,
            &x_columns,
            request.x_axis_join_operation,
            &y_columns,
            request.y_axis_join_operation,
        )
    }

    pub fn time_series(
        &self,
        request: &TimeSeriesRequest,
        owner: Option<&str>,
    ) -> Result<Vec<TimeSeriesEntry>> {
        let values = request.operation_column.columns();
        self.check_columns(std::iter::once(&request.column).chain(values.iter()))?;
        let records = self.filtered(owner)?;
        time_series(
            &records,
            &request.column,
            request.step_size,
            &values,
            request.operation,
            request.join_operation,
        )
    }

    pub fn table(&self, request: &TableRequest, owner: Option<&str>) -> Result<TableResult> {
        self.check_columns(request.columns.iter().chain(request.sort_by.iter()))?;
        let mut records = self.filtered(owner)?;
        if let Some(sort_by) = request.sort_by.as_deref() {
            records.sort_by(|a, b| {
                compare_rows(a.get(sort_by), b.get(sort_by), request.sort_direction)
            });
        }
        let total_count = records.len();
        let rows = records
            .into_iter()
            .skip(request.offset)
            .take(request.limit.unwrap_or(usize::MAX))
            .map(|record| project(record, &request.columns))
            .collect();
        Ok(TableResult { rows, total_count })
    }

    pub fn features(
        &self,
        request: &FeaturesRequest,
        owner: Option<&str>,
    ) -> Result<Vec<FeatureRecord>> {
        if let Some(columns) = request.columns.as_ref() {
            self.check_columns(columns)?;
        }
        let records = self.filtered(owner)?;
        Ok(records
            .into_iter()
            .map(|record| match request.columns.as_ref() {
                Some(columns) => FeatureRecord {
                    id: record.id.clone(),
                    properties: project(record, columns),
                    geometry: record.geometry.clone(),
                },
                None => record.clone(),
            })
            .collect())
    }

    pub fn run(&self, request: &WidgetRequest) -> Result<WidgetResult> {
        let owner = request.filter_owner.as_deref();
        let result = match &request.widget {
            WidgetCall::Formula(call) => WidgetResult::Formula(self.formula(call, owner)?),
            WidgetCall::Categories(call) => WidgetResult::Categories(self.categories(call, owner)?),
            WidgetCall::Histogram(call) => WidgetResult::Histogram(self.histogram(call, owner)?),
            WidgetCall::Range(call) => WidgetResult::Range(self.range(call, owner)?),
            WidgetCall::Scatter(call) => WidgetResult::Scatter(self.scatter(call, owner)?),
            WidgetCall::TimeSeries(call) => {
                WidgetResult::TimeSeries(self.time_series(call, owner)?)
            }
            WidgetCall::Table(call) => WidgetResult::Table(self.table(call, owner)?),
            WidgetCall::Features(call) => WidgetResult::Features(self.features(call, owner)?),
        };
        debug!(widget = request.widget.kind(), id = ?request.id, "widget computed");
        Ok(result)
    }
}

fn compare_rows(a: Option<&Scalar>, b: Option<&Scalar>, direction: SortDirection) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => match direction {
            SortDirection::Asc => a.sort_cmp(b),
            SortDirection::Desc => b.sort_cmp(a),
        },
    }
}

fn project(record: &FeatureRecord, columns: &[String]) -> IndexMap<String, Scalar> {
    if columns.is_empty() {
        return record.properties.clone();
    }
    columns
        .iter()
        .map(|column| {
            let value = record.properties.get(column).cloned().unwrap_or_default();
            (column.clone(), value)
        })
        .collect()
}
