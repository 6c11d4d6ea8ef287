use std::cmp::Ordering;
use std::fmt;

use geo_types::Geometry;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const GEOMETRY_KEY: &str = "__geometry";

pub const CONVENTIONAL_ID_COLUMNS: &[&str] = &["cartodb_id", "geoid"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Scalar {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

impl Scalar {
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(text) => Some(text),
            _ => None,
        }
    }

    pub fn equals(&self, other: &Scalar) -> bool {
        match (self, other) {
            (Scalar::Number(a), Scalar::Number(b)) => a == b,
            (Scalar::String(a), Scalar::String(b)) => a == b,
            (Scalar::Bool(a), Scalar::Bool(b)) => a == b,
            (Scalar::Null, Scalar::Null) => true,
            _ => false,
        }
    }

    /// Total order used for alphabetical sorting: numbers, then strings,
    /// then booleans, with nulls last.
    pub fn sort_cmp(&self, other: &Scalar) -> Ordering {
        fn rank(value: &Scalar) -> u8 {
            match value {
                Scalar::Number(_) => 0,
                Scalar::String(_) => 1,
                Scalar::Bool(_) => 2,
                Scalar::Null => 3,
            }
        }
        match (self, other) {
            (Scalar::Number(a), Scalar::Number(b)) => a.total_cmp(b),
            (Scalar::String(a), Scalar::String(b)) => a.cmp(b),
            (Scalar::Bool(a), Scalar::Bool(b)) => a.cmp(b),
            _ => rank(self).cmp(&rank(other)),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => write!(f, "null"),
            Scalar::Bool(value) => write!(f, "{value}"),
            Scalar::Number(value) => write!(f, "{value}"),
            Scalar::String(text) => write!(f, "{text}"),
        }
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Number(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::String(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UniqueId {
    Int(i64),
    Text(String),
    Cell(u64),
    Synthesized(u64),
}

impl UniqueId {
    pub fn from_scalar(value: &Scalar) -> Option<Self> {
        match value {
            Scalar::Number(number) if number.is_finite() && number.fract() == 0.0 => {
                Some(UniqueId::Int(*number as i64))
            }
            Scalar::Number(number) if number.is_finite() => {
                Some(UniqueId::Text(number.to_string()))
            }
            Scalar::String(text) => Some(UniqueId::Text(text.clone())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRecord {
    #[serde(skip)]
    pub id: UniqueId,
    #[serde(flatten)]
    pub properties: IndexMap<String, Scalar>,
    #[serde(rename = "__geometry", skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry<f64>>,
}

impl FeatureRecord {
    pub fn new(id: UniqueId, properties: IndexMap<String, Scalar>) -> Self {
        Self {
            id,
            properties,
            geometry: None,
        }
    }

    pub fn get(&self, column: &str) -> Option<&Scalar> {
        self.properties.get(column).filter(|value| !value.is_null())
    }

    pub fn get_f64(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(Scalar::as_f64)
    }

    pub fn has_column(&self, column: &str) -> bool {
        (column == GEOMETRY_KEY && self.geometry.is_some()) || self.properties.contains_key(column)
    }
}

const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Milliseconds since the Unix epoch for a number (taken as-is) or a date
/// string. Naive dates and date-times are read as UTC.
pub fn timestamp_ms(value: &Scalar) -> Option<f64> {
    match value {
        Scalar::Number(ms) if ms.is_finite() => Some(*ms),
        Scalar::String(text) => parse_timestamp_ms(text),
        _ => None,
    }
}

pub fn parse_timestamp_ms(text: &str) -> Option<f64> {
    use chrono::{DateTime, NaiveDate, NaiveDateTime};

    let text = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.timestamp_millis() as f64);
    }
    for format in DATE_TIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, format) {
            return Some(parsed.and_utc().timestamp_millis() as f64);
        }
    }
    let date = NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis() as f64)
}
