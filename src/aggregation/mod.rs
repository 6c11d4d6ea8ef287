pub mod group;
pub mod histogram;
pub mod operations;
pub mod range;
pub mod scatter;
pub mod time_series;

pub use self::group::{CategoryEntry, GroupByOptions, OTHERS_CATEGORY, OrderBy, group_by};
pub use self::histogram::histogram;
pub use self::operations::{
    AggregationType, ValueAccum, aggregate, aggregate_feature, aggregate_values,
};
pub use self::range::{ValueRange, value_range};
pub use self::scatter::scatter_plot;
pub use self::time_series::{TimeSeriesEntry, TimeStep, time_series};
