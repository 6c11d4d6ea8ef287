use std::marker::PhantomData;

use anyhow::{Context, Result};
use geo::{BoundingRect, Intersects};
use geo_types::{Coord, LineString, MultiPolygon, Polygon, Rect};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wgs84;

/// Web Mercator coordinates normalised to a tile: `(0, 0)` is the north-west
/// corner and `(1, 1)` the south-east corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileLocal;

#[derive(Debug, Clone, PartialEq)]
pub struct InSpace<S, G> {
    geometry: G,
    _space: PhantomData<S>,
}

impl<S, G> InSpace<S, G> {
    pub fn new(geometry: G) -> Self {
        Self {
            geometry,
            _space: PhantomData,
        }
    }

    pub fn geometry(&self) -> &G {
        &self.geometry
    }

    pub fn into_inner(self) -> G {
        self.geometry
    }

    pub fn intersects<H>(&self, other: &InSpace<S, H>) -> bool
    where
        G: Intersects<H>,
    {
        self.geometry.intersects(&other.geometry)
    }
}

pub type Wgs84Polygon = InSpace<Wgs84, MultiPolygon<f64>>;
pub type LocalPolygon = InSpace<TileLocal, MultiPolygon<f64>>;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Bbox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl Bbox {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    pub fn to_polygon(&self) -> InSpace<Wgs84, Polygon<f64>> {
        let rect = Rect::new(
            Coord {
                x: self.west,
                y: self.south,
            },
            Coord {
                x: self.east,
                y: self.north,
            },
        );
        InSpace::new(rect.to_polygon())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpatialFilter {
    region: Wgs84Polygon,
}

impl SpatialFilter {
    pub fn new(region: MultiPolygon<f64>) -> Self {
        Self {
            region: InSpace::new(region),
        }
    }

    pub fn from_polygon(polygon: Polygon<f64>) -> Self {
        Self::new(MultiPolygon(vec![polygon]))
    }

    pub fn from_bbox(bbox: Bbox) -> Self {
        Self::from_polygon(bbox.to_polygon().into_inner())
    }

    pub fn from_geojson(value: &Value) -> Result<Self> {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .context("geojson geometry missing type")?;
        let coordinates = value
            .get("coordinates")
            .context("geojson geometry missing coordinates")?;
        let region = match kind {
            "Polygon" => MultiPolygon(vec![parse_polygon(coordinates)?]),
            "MultiPolygon" => {
                let polygons = coordinates
                    .as_array()
                    .context("MultiPolygon coordinates must be an array")?;
                MultiPolygon(
                    polygons
                        .iter()
                        .map(parse_polygon)
                        .collect::<Result<Vec<_>>>()?,
                )
            }
            other => anyhow::bail!("spatial filter must be a Polygon or MultiPolygon, got {other}"),
        };
        Ok(Self::new(region))
    }

    pub fn region(&self) -> &Wgs84Polygon {
        &self.region
    }

    pub fn is_global(&self) -> bool {
        match self.region.geometry().bounding_rect() {
            Some(rect) => {
                rect.min().x <= -180.0
                    && rect.max().x >= 180.0
                    && rect.min().y <= -85.051_128
                    && rect.max().y >= 85.051_128
            }
            None => false,
        }
    }
}

impl<'de> Deserialize<'de> for SpatialFilter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        SpatialFilter::from_geojson(&value).map_err(serde::de::Error::custom)
    }
}

fn parse_polygon(value: &Value) -> Result<Polygon<f64>> {
    let rings = value
        .as_array()
        .context("polygon coordinates must be an array of rings")?;
    let mut parsed = rings.iter().map(parse_ring);
    let exterior = parsed.next().context("polygon has no exterior ring")??;
    let interiors = parsed.collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn parse_ring(value: &Value) -> Result<LineString<f64>> {
    let positions = value.as_array().context("ring must be an array of positions")?;
    let mut coords = Vec::with_capacity(positions.len());
    for position in positions {
        let pair = position.as_array().context("position must be an array")?;
        let x = pair
            .first()
            .and_then(Value::as_f64)
            .context("position missing longitude")?;
        let y = pair
            .get(1)
            .and_then(Value::as_f64)
            .context("position missing latitude")?;
        coords.push(Coord { x, y });
    }
    Ok(LineString::new(coords))
}
