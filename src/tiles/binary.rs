use geo_types::{Coord, Geometry, LineString, Point, Polygon};
use indexmap::IndexMap;

use crate::record::Scalar;
use crate::tiles::types::{BinaryAttributes, PlanarTileData};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    Point,
    LineString,
    Polygon,
}

#[derive(Debug, Clone, Copy)]
pub struct BinaryFeatureRef<'a> {
    pub attributes: &'a BinaryAttributes,
    pub kind: GeometryKind,
    pub start: usize,
    pub end: usize,
    ring_starts: &'a [u32],
}

impl<'a> BinaryFeatureRef<'a> {
    pub fn feature_index(&self) -> Option<usize> {
        self.attributes.feature_index(self.start)
    }

    pub fn native_id(&self) -> Option<u64> {
        let feature = self.feature_index()?;
        self.attributes.fields.get(feature)?.id
    }

    pub fn property(&self, column: &str) -> Option<&'a Scalar> {
        self.attributes.property(self.start, column)
    }

    pub fn properties(&self) -> IndexMap<String, Scalar> {
        let mut properties = self
            .feature_index()
            .and_then(|feature| self.attributes.properties.get(feature))
            .cloned()
            .unwrap_or_default();
        for (column, values) in self.attributes.numeric_props.iter() {
            if let Some(value) = values.get(self.start) {
                properties.insert(column.clone(), Scalar::Number(*value));
            }
        }
        properties
    }

    fn coords(&self, start: usize, end: usize) -> Vec<Coord<f64>> {
        let positions = &self.attributes.positions;
        (start..end)
            .filter_map(|vertex| positions.coord(vertex))
            .map(|(x, y)| Coord { x, y })
            .collect()
    }

    pub fn geometry(&self) -> Option<Geometry<f64>> {
        match self.kind {
            GeometryKind::Point => {
                let (x, y) = self.attributes.positions.coord(self.start)?;
                Some(Geometry::Point(Point::new(x, y)))
            }
            GeometryKind::LineString => {
                let coords = self.coords(self.start, self.end);
                if coords.is_empty() {
                    return None;
                }
                Some(Geometry::LineString(LineString::new(coords)))
            }
            GeometryKind::Polygon => {
                let mut bounds: Vec<usize> = Vec::with_capacity(self.ring_starts.len() + 2);
                if self.ring_starts.first().map(|i| *i as usize) != Some(self.start) {
                    bounds.push(self.start);
                }
                bounds.extend(self.ring_starts.iter().map(|i| *i as usize));
                bounds.push(self.end);
                let mut rings = bounds
                    .windows(2)
                    .map(|pair| LineString::new(self.coords(pair[0], pair[1])))
                    .filter(|ring| !ring.0.is_empty());
                let exterior = rings.next()?;
                Some(Geometry::Polygon(Polygon::new(exterior, rings.collect())))
            }
        }
    }
}

pub fn point_features(attributes: &BinaryAttributes) -> impl Iterator<Item = BinaryFeatureRef<'_>> {
    (0..attributes.positions.vertex_count()).map(move |vertex| BinaryFeatureRef {
        attributes,
        kind: GeometryKind::Point,
        start: vertex,
        end: vertex + 1,
        ring_starts: &[],
    })
}

pub fn line_features(data: &PlanarTileData) -> impl Iterator<Item = BinaryFeatureRef<'_>> {
    let lines = &data.lines;
    lines.path_indices.windows(2).map(move |pair| BinaryFeatureRef {
        attributes: &lines.attributes,
        kind: GeometryKind::LineString,
        start: pair[0] as usize,
        end: pair[1] as usize,
        ring_starts: &[],
    })
}

pub fn polygon_features(data: &PlanarTileData) -> impl Iterator<Item = BinaryFeatureRef<'_>> {
    let polygons = &data.polygons;
    let primitives = polygons.primitive_polygon_indices.as_slice();
    polygons.polygon_indices.windows(2).map(move |pair| {
        let (start, end) = (pair[0], pair[1]);
        let first = primitives.partition_point(|index| *index < start);
        let last = primitives.partition_point(|index| *index < end);
        BinaryFeatureRef {
            attributes: &polygons.attributes,
            kind: GeometryKind::Polygon,
            start: start as usize,
            end: end as usize,
            ring_starts: &primitives[first..last],
        }
    })
}

pub fn all_features(data: &PlanarTileData) -> impl Iterator<Item = BinaryFeatureRef<'_>> {
    point_features(&data.points)
        .chain(line_features(data))
        .chain(polygon_features(data))
}
