use std::f64::consts::PI;

use geo::MapCoords;
use geo_types::Coord;

use crate::spatial::types::{Bbox, InSpace, TileLocal, Wgs84};

pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;
const WORLD_SIZE: f64 = 512.0;

pub fn lng_lat_to_world(coord: Coord<f64>) -> Coord<f64> {
    let lambda = coord.x.to_radians();
    let phi = coord.y.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    Coord {
        x: WORLD_SIZE * (lambda + PI) / (2.0 * PI),
        y: WORLD_SIZE * (PI + (PI / 4.0 + phi / 2.0).tan().ln()) / (2.0 * PI),
    }
}

pub fn world_to_lng_lat(coord: Coord<f64>) -> Coord<f64> {
    let lambda = coord.x / WORLD_SIZE * 2.0 * PI - PI;
    let phi = 2.0 * ((coord.y / WORLD_SIZE * 2.0 * PI - PI).exp().atan() - PI / 4.0);
    Coord {
        x: lambda.to_degrees(),
        y: phi.to_degrees(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileProjection {
    north_west: Coord<f64>,
    south_east: Coord<f64>,
}

impl TileProjection {
    pub fn new(bbox: &Bbox) -> Self {
        Self {
            north_west: lng_lat_to_world(Coord {
                x: bbox.west,
                y: bbox.north,
            }),
            south_east: lng_lat_to_world(Coord {
                x: bbox.east,
                y: bbox.south,
            }),
        }
    }

    pub fn coord_to_local(&self, coord: Coord<f64>) -> Coord<f64> {
        let world = lng_lat_to_world(coord);
        Coord {
            x: (world.x - self.north_west.x) / (self.south_east.x - self.north_west.x),
            y: (world.y - self.north_west.y) / (self.south_east.y - self.north_west.y),
        }
    }

    pub fn coord_to_wgs84(&self, coord: Coord<f64>) -> Coord<f64> {
        world_to_lng_lat(Coord {
            x: self.north_west.x + coord.x * (self.south_east.x - self.north_west.x),
            y: self.north_west.y + coord.y * (self.south_east.y - self.north_west.y),
        })
    }

    pub fn to_local<G>(&self, value: &InSpace<Wgs84, G>) -> InSpace<TileLocal, G>
    where
        G: MapCoords<f64, f64, Output = G>,
    {
        InSpace::new(value.geometry().map_coords(|c| self.coord_to_local(c)))
    }

    pub fn to_wgs84<G>(&self, value: &InSpace<TileLocal, G>) -> InSpace<Wgs84, G>
    where
        G: MapCoords<f64, f64, Output = G>,
    {
        InSpace::new(value.geometry().map_coords(|c| self.coord_to_wgs84(c)))
    }
}
