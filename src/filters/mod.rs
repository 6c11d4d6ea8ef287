pub mod binary;
pub mod kinds;
pub mod predicate;
pub mod types;

pub use self::binary::{BinaryFilter, build_binary_filter};
pub use self::kinds::{CompiledFilter, normalize_text};
pub use self::predicate::{
    ColumnFilter, CompiledFilters, FeaturePredicate, apply_filters, build_feature_filter,
};
pub use self::types::{
    ColumnFilters, FilterKind, FilterOptions, FilterSpec, Filters, LogicalOperator,
    StringSearchParams, add_filter,
};
