use anyhow::Result;
use geo::{Area, BooleanOps, Within};
use geo_types::{MultiPolygon, Polygon};
use tracing::trace;

use crate::cellset::CellSet;
use crate::domain::{SpatialIndexScheme, TileDomain};
use crate::error::WidgetError;
use crate::spatial::projection::TileProjection;
use crate::spatial::types::{InSpace, LocalPolygon, SpatialFilter, Wgs84, Wgs84Polygon};
use crate::spatial::{h3, quadbin};
use crate::tiles::{Tile, TileData};

#[derive(Debug, Clone, PartialEq)]
pub enum ClippedRegion {
    Local(LocalPolygon),
    Wgs84(Wgs84Polygon),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeatureTest {
    Region(ClippedRegion),
    Cells(CellSet),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Intersection {
    Full,
    None,
    Partial(FeatureTest),
}

enum Overlap {
    Inside,
    Outside,
    Clipped(Wgs84Polygon),
}

fn overlap(boundary: &InSpace<Wgs84, Polygon<f64>>, filter: &SpatialFilter) -> Overlap {
    let region = filter.region().geometry();
    if boundary.geometry().is_within(region) {
        return Overlap::Inside;
    }
    let clipped = MultiPolygon(vec![boundary.geometry().clone()]).intersection(region);
    if clipped.0.is_empty() || clipped.unsigned_area() == 0.0 {
        Overlap::Outside
    } else {
        Overlap::Clipped(InSpace::new(clipped))
    }
}

pub fn resolve(tile: &Tile, filter: &SpatialFilter, domain: TileDomain) -> Result<Intersection> {
    let intersection = match domain {
        TileDomain::Planar => resolve_planar(tile, filter),
        TileDomain::SpatialIndex(scheme) => resolve_spatial_index(tile, filter, scheme)?,
        TileDomain::Raster => resolve_raster(tile, filter)?,
    };
    let outcome = match &intersection {
        Intersection::Full => "full",
        Intersection::None => "none",
        Intersection::Partial(_) => "partial",
    };
    trace!(tile = ?tile.id, outcome, "tile classified");
    Ok(intersection)
}

fn resolve_planar(tile: &Tile, filter: &SpatialFilter) -> Intersection {
    let local = matches!(
        tile.data.as_ref(),
        Some(TileData::Planar(data)) if data.local_coordinates
    );
    match overlap(&tile.bbox.to_polygon(), filter) {
        Overlap::Inside => Intersection::Full,
        Overlap::Outside => Intersection::None,
        Overlap::Clipped(clipped) => {
            let region = if local {
                ClippedRegion::Local(TileProjection::new(&tile.bbox).to_local(&clipped))
            } else {
                ClippedRegion::Wgs84(clipped)
            };
            Intersection::Partial(FeatureTest::Region(region))
        }
    }
}

fn resolve_spatial_index(
    tile: &Tile,
    filter: &SpatialFilter,
    scheme: SpatialIndexScheme,
) -> Result<Intersection> {
    let Some(TileData::SpatialIndex(data)) = tile.data.as_ref() else {
        return Ok(Intersection::None);
    };
    let parent = tile.id.cell();
    let boundary = match scheme {
        SpatialIndexScheme::H3 => h3::cell_boundary(parent)?,
        SpatialIndexScheme::Quadbin => {
            quadbin::validate_cell(parent)?;
            let parent_resolution = quadbin::resolution(parent);
            if data.resolution > quadbin::MAX_RESOLUTION || data.resolution < parent_resolution {
                return Err(WidgetError::InvalidTile(format!(
                    "quadbin cell resolution {} outside {parent_resolution}..={}",
                    data.resolution,
                    quadbin::MAX_RESOLUTION
                ))
                .into());
            }
            quadbin::cell_boundary(parent).to_polygon()
        }
    };
    Ok(match overlap(&boundary, filter) {
        Overlap::Inside => Intersection::Full,
        Overlap::Outside => Intersection::None,
        Overlap::Clipped(clipped) => {
            let cells = match scheme {
                SpatialIndexScheme::H3 => {
                    h3::children_in_polygon(parent, data.resolution, &clipped)?
                }
                SpatialIndexScheme::Quadbin => quadbin::polygon_to_cells(&clipped, data.resolution),
            };
            Intersection::Partial(FeatureTest::Cells(CellSet::new(cells)))
        }
    })
}

pub fn raster_cell_resolution(parent: u64, block_size: u32) -> Result<u8> {
    if block_size == 0 || !block_size.is_power_of_two() {
        return Err(WidgetError::InvalidTile(format!(
            "raster block size {block_size} is not a power of two"
        ))
        .into());
    }
    let resolution = quadbin::resolution(parent) + block_size.trailing_zeros() as u8;
    if resolution > quadbin::MAX_RESOLUTION {
        return Err(WidgetError::InvalidTile(format!(
            "raster pixel resolution {resolution} exceeds {}",
            quadbin::MAX_RESOLUTION
        ))
        .into());
    }
    Ok(resolution)
}

fn resolve_raster(tile: &Tile, filter: &SpatialFilter) -> Result<Intersection> {
    let Some(TileData::Raster(data)) = tile.data.as_ref() else {
        return Ok(Intersection::None);
    };
    let parent = tile.id.cell();
    quadbin::validate_cell(parent)?;
    let resolution = raster_cell_resolution(parent, data.block_size)?;
    Ok(
        match overlap(&quadbin::cell_boundary(parent).to_polygon(), filter) {
            Overlap::Inside => Intersection::Full,
            Overlap::Outside => Intersection::None,
            Overlap::Clipped(clipped) => Intersection::Partial(FeatureTest::Cells(CellSet::new(
                quadbin::polygon_to_cells(&clipped, resolution),
            ))),
        },
    )
}
