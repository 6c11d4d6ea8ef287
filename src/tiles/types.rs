use indexmap::IndexMap;
use serde::Deserialize;

use crate::record::Scalar;
use crate::spatial::quadbin::{self, QuadTile};
use crate::spatial::types::Bbox;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TileIndex {
    Xyz { x: u32, y: u32, z: u8 },
    Cell(u64),
}

impl TileIndex {
    pub fn cell(&self) -> u64 {
        match *self {
            // Zero is never a valid cell, so callers validating the id reject it.
            TileIndex::Xyz { z, .. } if z > quadbin::MAX_RESOLUTION => 0,
            TileIndex::Xyz { x, y, z } => quadbin::tile_to_cell(QuadTile { x, y, z }),
            TileIndex::Cell(cell) => cell,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tile {
    pub id: TileIndex,
    pub bbox: Bbox,
    #[serde(default = "default_visible")]
    pub is_visible: bool,
    #[serde(default)]
    pub data: Option<TileData>,
}

fn default_visible() -> bool {
    true
}

impl Tile {
    pub fn is_empty(&self) -> bool {
        match self.data.as_ref() {
            None => true,
            Some(TileData::Planar(data)) => data.is_empty(),
            Some(TileData::SpatialIndex(data)) => data.cells.is_empty(),
            Some(TileData::Raster(data)) => data.bands.values().all(|band| band.values.is_empty()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TileData {
    Planar(PlanarTileData),
    SpatialIndex(SpatialIndexTileData),
    Raster(RasterTileData),
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlanarTileData {
    pub local_coordinates: bool,
    pub points: BinaryAttributes,
    pub lines: BinaryLineFeatures,
    pub polygons: BinaryPolygonFeatures,
}

impl PlanarTileData {
    pub fn is_empty(&self) -> bool {
        self.points.positions.values.is_empty()
            && self.lines.attributes.positions.values.is_empty()
            && self.polygons.attributes.positions.values.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinaryPositions {
    pub values: Vec<f64>,
    pub size: usize,
}

impl Default for BinaryPositions {
    fn default() -> Self {
        Self {
            values: Vec::new(),
            size: 2,
        }
    }
}

impl BinaryPositions {
    pub fn vertex_count(&self) -> usize {
        if self.size == 0 {
            0
        } else {
            self.values.len() / self.size
        }
    }

    pub fn coord(&self, vertex: usize) -> Option<(f64, f64)> {
        let start = vertex * self.size;
        Some((*self.values.get(start)?, *self.values.get(start + 1)?))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureFields {
    #[serde(default)]
    pub id: Option<u64>,
}

/// Buffers shared by every geometry kind. Per-vertex arrays are indexed by
/// vertex position, per-feature arrays by the value of `feature_ids`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BinaryAttributes {
    pub positions: BinaryPositions,
    pub feature_ids: Vec<u32>,
    pub global_feature_ids: Vec<u32>,
    pub numeric_props: IndexMap<String, Vec<f64>>,
    pub properties: Vec<IndexMap<String, Scalar>>,
    pub fields: Vec<FeatureFields>,
}

impl BinaryAttributes {
    pub fn feature_index(&self, vertex: usize) -> Option<usize> {
        self.feature_ids.get(vertex).map(|id| *id as usize)
    }

    pub fn property(&self, vertex: usize, column: &str) -> Option<&Scalar> {
        let feature = self.feature_index(vertex)?;
        self.properties.get(feature)?.get(column)
    }

    pub fn numeric_prop(&self, vertex: usize, column: &str) -> Option<f64> {
        self.numeric_props.get(column)?.get(vertex).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BinaryLineFeatures {
    #[serde(flatten)]
    pub attributes: BinaryAttributes,
    pub path_indices: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BinaryPolygonFeatures {
    #[serde(flatten)]
    pub attributes: BinaryAttributes,
    pub polygon_indices: Vec<u32>,
    pub primitive_polygon_indices: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellFeature {
    pub id: u64,
    #[serde(default)]
    pub properties: IndexMap<String, Scalar>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpatialIndexTileData {
    pub resolution: u8,
    pub cells: Vec<CellFeature>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RasterBand {
    pub values: Vec<f64>,
    #[serde(default)]
    pub nodata: Option<f64>,
}

impl RasterBand {
    pub fn valid_value(&self, pixel: usize) -> Option<f64> {
        let value = *self.values.get(pixel)?;
        if value.is_nan() || self.nodata.is_some_and(|nodata| nodata == value) {
            None
        } else {
            Some(value)
        }
    }
}

/// A `block_size` x `block_size` grid of pixels stored row by row from the
/// north-west corner.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RasterTileData {
    pub block_size: u32,
    pub bands: IndexMap<String, RasterBand>,
}
