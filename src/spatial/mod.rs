pub mod h3;
pub mod intersection;
pub mod projection;
pub mod quadbin;
pub mod types;

pub use self::intersection::{ClippedRegion, FeatureTest, Intersection, resolve};
pub use self::projection::TileProjection;
pub use self::types::{Bbox, InSpace, LocalPolygon, SpatialFilter, TileLocal, Wgs84, Wgs84Polygon};
