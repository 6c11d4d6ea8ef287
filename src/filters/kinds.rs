use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};
use serde_json::Value;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::error::WidgetError;
use crate::filters::types::{FilterKind, FilterSpec, StringSearchParams};
use crate::record::{Scalar, parse_timestamp_ms, timestamp_ms};

/// Inclusive lower bound, upper bound per the filter kind; `None` is unbounded.
type Range = (Option<f64>, Option<f64>);

#[derive(Debug, Clone)]
pub enum CompiledFilter {
    In(Vec<Scalar>),
    Between(Vec<Range>),
    ClosedOpen(Vec<Range>),
    Time(Vec<Range>),
    StringSearch {
        pattern: Option<Regex>,
        case_sensitive: bool,
    },
}

impl CompiledFilter {
    pub fn compile(kind: FilterKind, spec: &FilterSpec) -> Result<Self> {
        Ok(match kind {
            FilterKind::In => CompiledFilter::In(spec.values.iter().map(json_to_scalar).collect()),
            FilterKind::Between => {
                CompiledFilter::Between(parse_ranges(&spec.values, number_bound)?)
            }
            FilterKind::ClosedOpen => {
                CompiledFilter::ClosedOpen(parse_ranges(&spec.values, number_bound)?)
            }
            FilterKind::Time => CompiledFilter::Time(parse_ranges(&spec.values, time_bound)?),
            FilterKind::StringSearch => CompiledFilter::StringSearch {
                pattern: search_pattern(&spec.values, &spec.params)?,
                case_sensitive: spec.params.case_sensitive,
            },
        })
    }

    pub fn matches(&self, value: Option<&Scalar>) -> Result<bool> {
        let value = value.filter(|value| !value.is_null());
        Ok(match self {
            CompiledFilter::In(values) => match value {
                Some(value) => values.iter().any(|candidate| candidate.equals(value)),
                None => values.iter().any(Scalar::is_null),
            },
            CompiledFilter::Between(ranges) => value
                .and_then(Scalar::as_f64)
                .is_some_and(|number| ranges.iter().any(|range| in_closed(range, number))),
            CompiledFilter::ClosedOpen(ranges) => value
                .and_then(Scalar::as_f64)
                .is_some_and(|number| ranges.iter().any(|range| in_closed_open(range, number))),
            CompiledFilter::Time(ranges) => match value {
                None => false,
                Some(value) => {
                    let ms = timestamp_ms(value)
                        .ok_or_else(|| WidgetError::InvalidDate(value.to_string()))?;
                    ranges.iter().any(|range| in_closed(range, ms))
                }
            },
            CompiledFilter::StringSearch {
                pattern,
                case_sensitive,
            } => match (pattern, value) {
                (Some(pattern), Some(value)) => {
                    pattern.is_match(&normalize_text(&value.to_string(), *case_sensitive))
                }
                _ => false,
            },
        })
    }
}

fn in_closed((low, high): &Range, value: f64) -> bool {
    low.is_none_or(|low| value >= low) && high.is_none_or(|high| value <= high)
}

fn in_closed_open((low, high): &Range, value: f64) -> bool {
    low.is_none_or(|low| value >= low) && high.is_none_or(|high| value < high)
}

pub fn json_to_scalar(value: &Value) -> Scalar {
    match value {
        Value::Null => Scalar::Null,
        Value::Bool(flag) => Scalar::Bool(*flag),
        Value::Number(number) => number.as_f64().map(Scalar::Number).unwrap_or(Scalar::Null),
        Value::String(text) => Scalar::String(text.clone()),
        other => Scalar::String(other.to_string()),
    }
}

fn number_bound(value: &Value) -> Result<Option<f64>> {
    match value {
        Value::Null => Ok(None),
        Value::Number(number) => Ok(number.as_f64()),
        other => anyhow::bail!("range bound must be a number or null, got {other}"),
    }
}

fn time_bound(value: &Value) -> Result<Option<f64>> {
    match value {
        Value::Null => Ok(None),
        Value::Number(number) => Ok(number.as_f64()),
        Value::String(text) => parse_timestamp_ms(text)
            .map(Some)
            .ok_or_else(|| WidgetError::InvalidDate(text.clone()).into()),
        other => Err(WidgetError::InvalidDate(other.to_string()).into()),
    }
}

fn parse_ranges(
    values: &[Value],
    bound: impl Fn(&Value) -> Result<Option<f64>>,
) -> Result<Vec<Range>> {
    let pair = |items: &[Value]| -> Result<Range> {
        let low = items.first().map(&bound).transpose()?.flatten();
        let high = items.get(1).map(&bound).transpose()?.flatten();
        Ok((low, high))
    };
    if values.first().is_some_and(Value::is_array) {
        values
            .iter()
            .map(|item| {
                let items = item.as_array().context("range must be a [from, to] array")?;
                pair(items)
            })
            .collect()
    } else if values.is_empty() {
        Ok(Vec::new())
    } else {
        Ok(vec![pair(values)?])
    }
}

pub fn normalize_text(text: &str, case_sensitive: bool) -> String {
    let text = if case_sensitive {
        text.to_string()
    } else {
        text.to_lowercase()
    };
    text.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

fn search_pattern(values: &[Value], params: &StringSearchParams) -> Result<Option<Regex>> {
    let alternatives: Vec<String> = values
        .iter()
        .map(|value| {
            let text = match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            if params.use_reg_exp {
                return format!("(?:{text})");
            }
            let normalized = normalize_text(&text, params.case_sensitive);
            let mut pattern = if params.keep_special_characters {
                normalized
            } else {
                regex::escape(&normalized)
            };
            if params.must_start {
                pattern = format!("^{pattern}");
            }
            if params.must_end {
                pattern = format!("{pattern}$");
            }
            format!("(?:{pattern})")
        })
        .collect();
    if alternatives.is_empty() {
        return Ok(None);
    }
    let joined = alternatives.join("|");
    let pattern = RegexBuilder::new(&joined)
        .case_insensitive(!params.case_sensitive)
        .build()
        .with_context(|| format!("invalid string search pattern: {joined}"))?;
    Ok(Some(pattern))
}
