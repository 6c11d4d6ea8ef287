use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalOperator {
    #[default]
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterOptions {
    pub filters_logical_operator: LogicalOperator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    In,
    Between,
    ClosedOpen,
    Time,
    StringSearch,
}

impl FilterKind {
    pub fn from_str(name: &str) -> Option<Self> {
        match name {
            "in" => Some(FilterKind::In),
            "between" => Some(FilterKind::Between),
            "closed_open" => Some(FilterKind::ClosedOpen),
            "time" => Some(FilterKind::Time),
            "stringSearch" => Some(FilterKind::StringSearch),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterKind::In => "in",
            FilterKind::Between => "between",
            FilterKind::ClosedOpen => "closed_open",
            FilterKind::Time => "time",
            FilterKind::StringSearch => "stringSearch",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StringSearchParams {
    pub case_sensitive: bool,
    pub must_start: bool,
    pub must_end: bool,
    pub use_reg_exp: bool,
    pub keep_special_characters: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    #[serde(default)]
    pub owner: Option<String>,
    pub values: Vec<Value>,
    #[serde(default)]
    pub params: StringSearchParams,
}

impl FilterSpec {
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            owner: None,
            values,
            params: StringSearchParams::default(),
        }
    }

    pub fn with_owner(mut self, owner: &str) -> Self {
        self.owner = Some(owner.to_string());
        self
    }

    pub fn with_params(mut self, params: StringSearchParams) -> Self {
        self.params = params;
        self
    }
}

pub type ColumnFilters = IndexMap<String, FilterSpec>;

pub type Filters = IndexMap<String, ColumnFilters>;

pub fn add_filter(filters: &mut Filters, column: &str, kind: FilterKind, spec: FilterSpec) {
    filters
        .entry(column.to_string())
        .or_default()
        .insert(kind.as_str().to_string(), spec);
}
