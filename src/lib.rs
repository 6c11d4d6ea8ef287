pub mod aggregation;
pub mod cellset;
pub mod cli;
pub mod domain;
pub mod error;
pub mod filters;
pub mod output;
pub mod record;
pub mod request;
pub mod spatial;
pub mod store;
pub mod tiles;
pub mod vecexpr;
pub mod widgets;
pub mod worker;

pub use crate::cellset::CellSet;
pub use crate::domain::{SpatialIndexScheme, TileDomain};
pub use crate::error::WidgetError;
pub use crate::record::{FeatureRecord, Scalar, UniqueId};
pub use crate::store::FeatureSnapshot;
