use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::decide_domain;
use crate::filters::{FilterOptions, Filters, LogicalOperator, build_binary_filter};
use crate::spatial::SpatialFilter;
use crate::store::{FeatureSnapshot, load};
use crate::tiles::{ExtractOptions, Tile};
use crate::widgets::{WidgetRequest, WidgetResult, WidgetSource};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestFile {
    pub tiles: Vec<Tile>,
    #[serde(default)]
    pub spatial_filter: Option<SpatialFilter>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub options: ExtractOptions,
    #[serde(default)]
    pub filters: Filters,
    #[serde(default)]
    pub filters_logical_operator: LogicalOperator,
    #[serde(default)]
    pub prefilter: bool,
    #[serde(default)]
    pub widgets: Vec<WidgetRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WidgetOutcome {
    pub id: Option<String>,
    pub widget: &'static str,
    pub result: WidgetResult,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestReport {
    pub domain: String,
    pub feature_count: usize,
    pub tiles: usize,
    pub duplicates: usize,
    pub widgets: Vec<WidgetOutcome>,
}

pub fn read_request(path: &Path) -> Result<RequestFile> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read request file: {}", path.display()))?;
    serde_json::from_str(&contents).context("parse request json")
}

pub fn load_snapshot(request: &RequestFile) -> Result<FeatureSnapshot> {
    let domain = decide_domain(request.domain.as_deref(), &request.tiles)?;
    let spatial_filter = request
        .spatial_filter
        .as_ref()
        .filter(|filter| !filter.is_global());
    let prefilter = if request.prefilter {
        Some(build_binary_filter(
            &request.filters,
            request.filters_logical_operator,
        )?)
    } else {
        None
    };
    load(
        &request.tiles,
        spatial_filter,
        domain,
        &request.options,
        prefilter.as_ref(),
    )
}

pub fn run_request(request: &RequestFile) -> Result<RequestReport> {
    let domain = decide_domain(request.domain.as_deref(), &request.tiles)?;
    let snapshot = load_snapshot(request)?;
    let options = FilterOptions {
        filters_logical_operator: request.filters_logical_operator,
    };
    let source = WidgetSource::new(&snapshot, &request.filters, options);
    let mut widgets = Vec::with_capacity(request.widgets.len());
    for widget in request.widgets.iter() {
        let name = widget.id.as_deref().unwrap_or(widget.widget.kind());
        let result = source
            .run(widget)
            .with_context(|| format!("widget {name} failed"))?;
        widgets.push(WidgetOutcome {
            id: widget.id.clone(),
            widget: widget.widget.kind(),
            result,
        });
    }
    let stats = snapshot.stats();
    Ok(RequestReport {
        domain: domain.to_string(),
        feature_count: snapshot.len(),
        tiles: stats.tiles,
        duplicates: stats.duplicates,
        widgets,
    })
}
