//! Quadbin cells: Web Mercator XYZ tiles packed into a 64-bit identifier.
//!
//! Layout (most significant first): the five bits `0b01001` (header plus cell
//! mode), 2 unused bits, 5 resolution bits, then the Morton-interleaved tile
//! coordinates padded with ones.

use anyhow::Result;
use geo::Contains;
use geo_types::{Coord, MultiPolygon, Point};

use crate::error::WidgetError;
use crate::spatial::projection::MAX_LATITUDE;
use crate::spatial::types::{Bbox, InSpace, Wgs84};

pub const MAX_RESOLUTION: u8 = 26;

const HEADER: u64 = 0x4000_0000_0000_0000;
const MODE_CELL: u64 = 1 << 59;
const FOOTER: u64 = 0x000f_ffff_ffff_ffff;
const B: [u64; 6] = [
    0x5555_5555_5555_5555,
    0x3333_3333_3333_3333,
    0x0f0f_0f0f_0f0f_0f0f,
    0x00ff_00ff_00ff_00ff,
    0x0000_ffff_0000_ffff,
    0x0000_0000_ffff_ffff,
];
const S: [u64; 6] = [0, 1, 2, 4, 8, 16];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuadTile {
    pub x: u32,
    pub y: u32,
    pub z: u8,
}

pub fn tile_to_cell(tile: QuadTile) -> u64 {
    let z = u64::from(tile.z);
    let mut x = u64::from(tile.x) << (32 - z);
    let mut y = u64::from(tile.y) << (32 - z);
    for i in (1..=5).rev() {
        x = (x | (x << S[i])) & B[i - 1];
        y = (y | (y << S[i])) & B[i - 1];
    }
    HEADER | MODE_CELL | (z << 52) | ((x | (y << 1)) >> 12) | (FOOTER >> (z * 2))
}

pub fn cell_to_tile(cell: u64) -> QuadTile {
    let z = resolution(cell);
    let q = (cell & FOOTER) << 12;
    let mut x = q & B[0];
    let mut y = (q >> 1) & B[0];
    for i in 0..5 {
        x = (x | (x >> S[i + 1])) & B[i + 1];
        y = (y | (y >> S[i + 1])) & B[i + 1];
    }
    let shift = 32 - u64::from(z);
    QuadTile {
        x: (x >> shift) as u32,
        y: (y >> shift) as u32,
        z,
    }
}

pub fn resolution(cell: u64) -> u8 {
    ((cell >> 52) & 0x1f) as u8
}

pub fn is_valid_cell(cell: u64) -> bool {
    let header_ok = cell & 0xf800_0000_0000_0000 == HEADER | MODE_CELL;
    let z = resolution(cell);
    if !header_ok || z > MAX_RESOLUTION {
        return false;
    }
    let padding = FOOTER >> (u64::from(z) * 2);
    cell & padding == padding
}

pub fn validate_cell(cell: u64) -> Result<()> {
    if is_valid_cell(cell) {
        Ok(())
    } else {
        Err(WidgetError::InvalidCell(cell).into())
    }
}

pub fn cell_to_parent(cell: u64, parent_resolution: u8) -> u64 {
    let tile = cell_to_tile(cell);
    let shift = tile.z.saturating_sub(parent_resolution);
    tile_to_cell(QuadTile {
        x: tile.x >> shift,
        y: tile.y >> shift,
        z: tile.z - shift,
    })
}

/// Children at `child_resolution`, row by row from the north-west corner.
pub fn cell_to_children(cell: u64, child_resolution: u8) -> Vec<u64> {
    let tile = cell_to_tile(cell);
    if child_resolution < tile.z {
        return Vec::new();
    }
    let block = 1u32 << (child_resolution - tile.z);
    let mut children = Vec::with_capacity((block as usize) * (block as usize));
    for row in 0..block {
        for col in 0..block {
            children.push(tile_to_cell(QuadTile {
                x: tile.x * block + col,
                y: tile.y * block + row,
                z: child_resolution,
            }));
        }
    }
    children
}

pub fn tile_to_bbox(tile: QuadTile) -> Bbox {
    let n = f64::from(1u32 << tile.z);
    let lng = |x: f64| x / n * 360.0 - 180.0;
    let lat = |y: f64| {
        let merc = std::f64::consts::PI * (1.0 - 2.0 * y / n);
        merc.sinh().atan().to_degrees()
    };
    Bbox::new(
        lng(f64::from(tile.x)),
        lat(f64::from(tile.y + 1)),
        lng(f64::from(tile.x + 1)),
        lat(f64::from(tile.y)),
    )
}

pub fn cell_boundary(cell: u64) -> Bbox {
    tile_to_bbox(cell_to_tile(cell))
}

pub fn cell_center(cell: u64) -> Coord<f64> {
    let tile = cell_to_tile(cell);
    let n = f64::from(1u32 << tile.z);
    let x = (f64::from(tile.x) + 0.5) / n;
    let y = (f64::from(tile.y) + 0.5) / n;
    Coord {
        x: x * 360.0 - 180.0,
        y: (std::f64::consts::PI * (1.0 - 2.0 * y)).sinh().atan().to_degrees(),
    }
}

fn lng_lat_to_tile_xy(coord: Coord<f64>, z: u8) -> (u32, u32) {
    let n = f64::from(1u32 << z);
    let lat = coord.y.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = ((coord.x + 180.0) / 360.0 * n).floor();
    let y = ((1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / std::f64::consts::PI) / 2.0 * n).floor();
    let max = n - 1.0;
    (x.clamp(0.0, max) as u32, y.clamp(0.0, max) as u32)
}

pub fn polygon_to_cells(polygon: &InSpace<Wgs84, MultiPolygon<f64>>, resolution: u8) -> Vec<u64> {
    use geo::BoundingRect;

    if resolution > MAX_RESOLUTION {
        return Vec::new();
    }
    let Some(rect) = polygon.geometry().bounding_rect() else {
        return Vec::new();
    };
    let (min_x, min_y) = lng_lat_to_tile_xy(
        Coord {
            x: rect.min().x,
            y: rect.max().y,
        },
        resolution,
    );
    let (max_x, max_y) = lng_lat_to_tile_xy(
        Coord {
            x: rect.max().x,
            y: rect.min().y,
        },
        resolution,
    );
    let mut cells = Vec::new();
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let cell = tile_to_cell(QuadTile { x, y, z: resolution });
            if polygon.geometry().contains(&Point::from(cell_center(cell))) {
                cells.push(cell);
            }
        }
    }
    cells
}
