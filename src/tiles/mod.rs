pub mod binary;
pub mod extract;
pub mod types;

pub use self::binary::{BinaryFeatureRef, GeometryKind, all_features};
pub use self::extract::{
    ExtractOptions, ExtractStats, Extraction, extract, extract_with_prefilter,
};
pub use self::types::{
    BinaryAttributes, BinaryLineFeatures, BinaryPolygonFeatures, BinaryPositions, CellFeature,
    FeatureFields, PlanarTileData, RasterBand, RasterTileData, SpatialIndexTileData, Tile,
    TileData, TileIndex,
};
