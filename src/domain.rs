use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Deserializer};

use crate::tiles::{Tile, TileData};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpatialIndexScheme {
    H3,
    Quadbin,
}

impl SpatialIndexScheme {
    pub fn column_name(&self) -> &'static str {
        match self {
            SpatialIndexScheme::H3 => "h3",
            SpatialIndexScheme::Quadbin => "quadbin",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileDomain {
    Planar,
    SpatialIndex(SpatialIndexScheme),
    Raster,
}

impl TileDomain {
    pub fn from_str(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "planar" | "vector" | "geometry" => Some(TileDomain::Planar),
            "h3" => Some(TileDomain::SpatialIndex(SpatialIndexScheme::H3)),
            "quadbin" => Some(TileDomain::SpatialIndex(SpatialIndexScheme::Quadbin)),
            "raster" => Some(TileDomain::Raster),
            _ => None,
        }
    }

    /// Spatial-index tiles do not say which grid they use, so they are only
    /// recognised through an explicit name.
    pub fn from_tiles(tiles: &[Tile]) -> Option<Self> {
        tiles
            .iter()
            .find_map(|tile| tile.data.as_ref())
            .and_then(|data| match data {
                TileData::Planar(_) => Some(TileDomain::Planar),
                TileData::Raster(_) => Some(TileDomain::Raster),
                TileData::SpatialIndex(_) => None,
            })
    }
}

impl fmt::Display for TileDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileDomain::Planar => write!(f, "planar"),
            TileDomain::SpatialIndex(scheme) => write!(f, "{}", scheme.column_name()),
            TileDomain::Raster => write!(f, "raster"),
        }
    }
}

impl<'de> Deserialize<'de> for TileDomain {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        TileDomain::from_str(&name)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown tile domain: {name}")))
    }
}

pub fn decide_domain(explicit: Option<&str>, tiles: &[Tile]) -> Result<TileDomain> {
    if let Some(name) = explicit {
        return TileDomain::from_str(name)
            .ok_or_else(|| anyhow::anyhow!("unknown tile domain: {name}"));
    }
    TileDomain::from_tiles(tiles).ok_or_else(|| {
        anyhow::anyhow!("cannot infer tile domain; pass one of planar, h3, quadbin, raster")
    })
}
