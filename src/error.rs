use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WidgetError {
    #[error("invalid column: {0}")]
    InvalidColumn(String),

    #[error("unsupported filter type: {0}")]
    UnsupportedFilter(String),

    #[error("column used to filter by time isn't well formatted: {0}")]
    InvalidDate(String),

    #[error("a join operation is required to aggregate {0} columns")]
    MissingJoinOperation(usize),

    #[error("invalid cell index: {0:#x}")]
    InvalidCell(u64),

    #[error("invalid tile: {0}")]
    InvalidTile(String),
}

pub fn is_invalid_column(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<WidgetError>(),
        Some(WidgetError::InvalidColumn(_))
    )
}
