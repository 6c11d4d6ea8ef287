use anyhow::Result;
use geo::Contains;
use geo_types::{Coord, LineString, MultiPolygon, Point, Polygon};
use h3o::{CellIndex, LatLng, Resolution};

use crate::error::WidgetError;
use crate::spatial::types::{InSpace, Wgs84};

pub fn parse_cell(cell: u64) -> Result<CellIndex> {
    CellIndex::try_from(cell).map_err(|_| WidgetError::InvalidCell(cell).into())
}

pub fn resolution(cell: u64) -> Result<u8> {
    Ok(u8::from(parse_cell(cell)?.resolution()))
}

pub fn cell_to_string(cell: u64) -> String {
    format!("{cell:x}")
}

pub fn cell_boundary(cell: u64) -> Result<InSpace<Wgs84, Polygon<f64>>> {
    let index = parse_cell(cell)?;
    let mut coords: Vec<Coord<f64>> = index
        .boundary()
        .iter()
        .map(|vertex| Coord {
            x: vertex.lng(),
            y: vertex.lat(),
        })
        .collect();
    if let Some(first) = coords.first().copied() {
        coords.push(first);
    }
    Ok(InSpace::new(Polygon::new(LineString::new(coords), Vec::new())))
}

pub fn children_in_polygon(
    parent: u64,
    child_resolution: u8,
    polygon: &InSpace<Wgs84, MultiPolygon<f64>>,
) -> Result<Vec<u64>> {
    let index = parse_cell(parent)?;
    let resolution = Resolution::try_from(child_resolution).map_err(|_| {
        WidgetError::InvalidTile(format!("invalid H3 resolution {child_resolution}"))
    })?;
    let mut cells = Vec::new();
    for child in index.children(resolution) {
        let center = LatLng::from(child);
        let point = Point::new(center.lng(), center.lat());
        if polygon.geometry().contains(&point) {
            cells.push(u64::from(child));
        }
    }
    Ok(cells)
}
