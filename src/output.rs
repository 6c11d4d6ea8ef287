use anyhow::Result;
use serde_json::json;

use crate::record::Scalar;
use crate::request::RequestReport;
use crate::widgets::WidgetResult;

pub fn ndjson_lines(report: &RequestReport) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    lines.push(serde_json::to_string(&json!({
        "type": "summary",
        "domain": report.domain,
        "feature_count": report.feature_count,
        "tiles": report.tiles,
        "duplicates": report.duplicates,
    }))?);

    for outcome in report.widgets.iter() {
        lines.push(serde_json::to_string(&json!({
            "type": "widget",
            "id": outcome.id,
            "widget": outcome.widget,
            "result": outcome.result,
        }))?);
    }

    Ok(lines)
}

fn format_value(value: Option<f64>) -> String {
    match value {
        Some(value) => value.to_string(),
        None => "null".to_string(),
    }
}

fn format_name(name: &Scalar) -> String {
    match name {
        Scalar::String(text) => text.clone(),
        other => other.to_string(),
    }
}

pub fn text_lines(report: &RequestReport) -> Vec<String> {
    let mut lines = vec![format!(
        "domain: {} features: {} tiles: {} duplicates: {}",
        report.domain, report.feature_count, report.tiles, report.duplicates
    )];

    for outcome in report.widgets.iter() {
        let label = match outcome.id.as_deref() {
            Some(id) => format!("{} ({})", outcome.widget, id),
            None => outcome.widget.to_string(),
        };
        match &outcome.result {
            WidgetResult::Formula(result) => {
                lines.push(format!("{label}: value={}", format_value(result.value)));
            }
            WidgetResult::Categories(entries) => {
                lines.push(format!("{label}: categories={}", entries.len()));
                for entry in entries.iter() {
                    lines.push(format!(
                        "  {}: {}",
                        format_name(&entry.name),
                        format_value(entry.value)
                    ));
                }
            }
            WidgetResult::Histogram(buckets) => {
                lines.push(format!(
                    "{label}: {}",
                    buckets
                        .iter()
                        .map(|bucket| bucket.to_string())
                        .collect::<Vec<_>>()
                        .join(",")
                ));
            }
            WidgetResult::Range(range) => match range {
                Some(range) => lines.push(format!("{label}: min={} max={}", range.min, range.max)),
                None => lines.push(format!("{label}: min=null max=null")),
            },
            WidgetResult::Scatter(points) => {
                lines.push(format!("{label}: points={}", points.len()));
                for [x, y] in points.iter() {
                    lines.push(format!("  {x},{y}"));
                }
            }
            WidgetResult::TimeSeries(entries) => {
                lines.push(format!("{label}: steps={}", entries.len()));
                for entry in entries.iter() {
                    let start = chrono::DateTime::from_timestamp_millis(entry.name)
                        .map(|time| time.to_rfc3339())
                        .unwrap_or_else(|| entry.name.to_string());
                    lines.push(format!("  {start}: {}", format_value(entry.value)));
                }
            }
            WidgetResult::Table(table) => {
                lines.push(format!(
                    "{label}: rows={} total_count={}",
                    table.rows.len(),
                    table.total_count
                ));
                for row in table.rows.iter() {
                    lines.push(format!(
                        "  {}",
                        row.iter()
                            .map(|(column, value)| format!("{column}={value}"))
                            .collect::<Vec<_>>()
                            .join(" ")
                    ));
                }
            }
            WidgetResult::Features(features) => {
                lines.push(format!("{label}: features={}", features.len()));
            }
        }
    }

    lines
}
