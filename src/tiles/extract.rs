use anyhow::Result;
use geo::Intersects;
use geo_types::{Geometry, MultiPolygon};
use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::cellset::CellSet;
use crate::domain::{SpatialIndexScheme, TileDomain};
use crate::filters::BinaryFilter;
use crate::record::{CONVENTIONAL_ID_COLUMNS, FeatureRecord, Scalar, UniqueId};
use crate::spatial::intersection::raster_cell_resolution;
use crate::spatial::{
    ClippedRegion, FeatureTest, InSpace, Intersection, SpatialFilter, TileLocal, TileProjection,
    Wgs84, h3, quadbin,
};
use crate::tiles::binary::{self, BinaryFeatureRef, GeometryKind};
use crate::tiles::types::{Tile, TileData};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractOptions {
    pub unique_id_property: Option<String>,
    pub store_geometry: bool,
    pub spatial_index_column: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractStats {
    pub tiles: usize,
    pub skipped: usize,
    pub full: usize,
    pub partial: usize,
    pub excluded: usize,
    pub features: usize,
    pub duplicates: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub features: IndexMap<UniqueId, FeatureRecord>,
    pub stats: ExtractStats,
}

impl Extraction {
    pub fn into_records(self) -> Vec<FeatureRecord> {
        self.features.into_values().collect()
    }
}

pub fn extract(
    tiles: &[Tile],
    filter: Option<&SpatialFilter>,
    domain: TileDomain,
    options: &ExtractOptions,
) -> Result<Vec<FeatureRecord>> {
    Ok(extract_with_prefilter(tiles, filter, domain, options, None)?.into_records())
}

pub fn extract_with_prefilter(
    tiles: &[Tile],
    filter: Option<&SpatialFilter>,
    domain: TileDomain,
    options: &ExtractOptions,
    prefilter: Option<&BinaryFilter>,
) -> Result<Extraction> {
    let walker = walker_for(domain, options);
    let mut collector = Collector::new(options, prefilter.filter(|filter| !filter.is_empty()));

    for tile in tiles {
        collector.stats.tiles += 1;
        if !tile.is_visible || tile.is_empty() {
            collector.stats.skipped += 1;
            continue;
        }
        let intersection = walker.resolve_intersection(tile, filter)?;
        match &intersection {
            Intersection::None => {
                collector.stats.excluded += 1;
                continue;
            }
            Intersection::Full => collector.stats.full += 1,
            Intersection::Partial(_) => collector.stats.partial += 1,
        }
        walker.for_each_candidate(tile, &intersection, &mut collector)?;
    }

    let stats = collector.stats;
    debug!(
        %domain,
        tiles = stats.tiles,
        skipped = stats.skipped,
        full = stats.full,
        partial = stats.partial,
        excluded = stats.excluded,
        features = stats.features,
        duplicates = stats.duplicates,
        "extraction finished"
    );
    Ok(Extraction {
        features: collector.features,
        stats,
    })
}

fn walker_for(domain: TileDomain, options: &ExtractOptions) -> Box<dyn TileWalker> {
    match domain {
        TileDomain::Planar => Box::new(PlanarWalker),
        TileDomain::SpatialIndex(scheme) => Box::new(SpatialIndexWalker {
            scheme,
            column: options
                .spatial_index_column
                .clone()
                .unwrap_or_else(|| scheme.column_name().to_string()),
        }),
        TileDomain::Raster => Box::new(RasterWalker {
            column: options
                .spatial_index_column
                .clone()
                .unwrap_or_else(|| SpatialIndexScheme::Quadbin.column_name().to_string()),
        }),
    }
}

trait TileWalker {
    fn domain(&self) -> TileDomain;

    fn resolve_intersection(
        &self,
        tile: &Tile,
        filter: Option<&SpatialFilter>,
    ) -> Result<Intersection> {
        match filter {
            None => Ok(Intersection::Full),
            Some(filter) => crate::spatial::resolve(tile, filter, self.domain()),
        }
    }

    fn for_each_candidate(
        &self,
        tile: &Tile,
        intersection: &Intersection,
        collector: &mut Collector<'_>,
    ) -> Result<()>;
}

struct Collector<'a> {
    options: &'a ExtractOptions,
    prefilter: Option<&'a BinaryFilter>,
    features: IndexMap<UniqueId, FeatureRecord>,
    stats: ExtractStats,
    origins: Vec<FeatureKey>,
    last_duplicate: Option<FeatureKey>,
    next_synthetic: u64,
    last_synthetic: Option<(FeatureKey, UniqueId)>,
}

/// Tile ordinal, geometry kind (none for cells) and index of a feature in its tile.
type FeatureKey = (usize, Option<GeometryKind>, usize);

impl<'a> Collector<'a> {
    fn new(options: &'a ExtractOptions, prefilter: Option<&'a BinaryFilter>) -> Self {
        Self {
            options,
            prefilter,
            features: IndexMap::new(),
            stats: ExtractStats::default(),
            origins: Vec::new(),
            last_duplicate: None,
            next_synthetic: 0,
            last_synthetic: None,
        }
    }

    fn cell_key(&self, index: usize) -> FeatureKey {
        (self.stats.tiles, None, index)
    }

    fn part_key(&self, part: &BinaryFeatureRef<'_>) -> FeatureKey {
        let feature = part.feature_index().unwrap_or(part.start);
        (self.stats.tiles, Some(part.kind), feature)
    }

    /// True when `id` is already kept. A feature is counted once as a
    /// duplicate however many parts it has.
    fn is_duplicate(&mut self, id: &UniqueId, key: FeatureKey) -> bool {
        let Some(index) = self.features.get_index_of(id) else {
            return false;
        };
        if self.origins.get(index) != Some(&key) && self.last_duplicate != Some(key) {
            self.stats.duplicates += 1;
            self.last_duplicate = Some(key);
        }
        true
    }

    fn push(&mut self, record: FeatureRecord, key: FeatureKey) {
        self.stats.features += 1;
        self.features.insert(record.id.clone(), record);
        self.origins.push(key);
    }

    fn explicit_id(&self, lookup: impl Fn(&str) -> Option<Scalar>) -> Option<UniqueId> {
        let column = self.options.unique_id_property.as_deref()?;
        lookup(column).as_ref().and_then(UniqueId::from_scalar)
    }

    /// Parts of one feature sit next to each other in the buffers, so they
    /// share the id synthesized for the first part.
    fn synthesize(&mut self, key: FeatureKey) -> UniqueId {
        if let Some((last, id)) = self.last_synthetic.as_ref() {
            if *last == key {
                return id.clone();
            }
        }
        let id = UniqueId::Synthesized(self.next_synthetic);
        self.next_synthetic += 1;
        self.last_synthetic = Some((key, id.clone()));
        id
    }

    fn planar_id(&mut self, part: &BinaryFeatureRef<'_>) -> UniqueId {
        let lookup = |column: &str| {
            part.property(column).cloned().or_else(|| {
                part.attributes
                    .numeric_prop(part.start, column)
                    .map(Scalar::Number)
            })
        };
        if let Some(id) = self.explicit_id(&lookup) {
            return id;
        }
        if let Some(id) = part.native_id() {
            return UniqueId::Int(id as i64);
        }
        for column in CONVENTIONAL_ID_COLUMNS {
            if let Some(id) = lookup(*column).as_ref().and_then(UniqueId::from_scalar) {
                return id;
            }
        }
        let key = self.part_key(part);
        self.synthesize(key)
    }
}

fn domain_mismatch(tile: &Tile, domain: TileDomain) -> Result<()> {
    warn!(tile = ?tile.id, %domain, "tile payload does not match the tile domain; skipped");
    Ok(())
}

fn cell_filter(intersection: &Intersection) -> Option<Option<&CellSet>> {
    match intersection {
        Intersection::Full => Some(None),
        Intersection::Partial(FeatureTest::Cells(cells)) => Some(Some(cells)),
        _ => None,
    }
}

struct PlanarWalker;

enum PartGeometry {
    Local(InSpace<TileLocal, Geometry<f64>>),
    Wgs84(InSpace<Wgs84, Geometry<f64>>),
}

fn intersects_region<S>(
    region: &InSpace<S, MultiPolygon<f64>>,
    part: &InSpace<S, Geometry<f64>>,
) -> bool {
    let region = region.geometry();
    match part.geometry() {
        Geometry::Point(point) => region.intersects(point),
        Geometry::LineString(line) => region.intersects(line),
        Geometry::Polygon(polygon) => region.intersects(polygon),
        _ => false,
    }
}

impl TileWalker for PlanarWalker {
    fn domain(&self) -> TileDomain {
        TileDomain::Planar
    }

    fn for_each_candidate(
        &self,
        tile: &Tile,
        intersection: &Intersection,
        collector: &mut Collector<'_>,
    ) -> Result<()> {
        let Some(TileData::Planar(data)) = tile.data.as_ref() else {
            return domain_mismatch(tile, self.domain());
        };
        let region = match intersection {
            Intersection::Full => None,
            Intersection::Partial(FeatureTest::Region(region)) => Some(region),
            _ => return Ok(()),
        };
        let projection = TileProjection::new(&tile.bbox);
        let store_geometry = collector.options.store_geometry;

        for part in binary::all_features(data) {
            let id = collector.planar_id(&part);
            let key = collector.part_key(&part);
            if collector.is_duplicate(&id, key) {
                continue;
            }
            if let Some(prefilter) = collector.prefilter {
                if !prefilter.matches(part.attributes, part.start)? {
                    continue;
                }
            }
            let geometry = if region.is_some() || store_geometry {
                let Some(geometry) = part.geometry() else {
                    continue;
                };
                Some(if data.local_coordinates {
                    PartGeometry::Local(InSpace::new(geometry))
                } else {
                    PartGeometry::Wgs84(InSpace::new(geometry))
                })
            } else {
                None
            };

            if let (Some(region), Some(geometry)) = (region, geometry.as_ref()) {
                let inside = match (region, geometry) {
                    (ClippedRegion::Local(region), PartGeometry::Local(part)) => {
                        intersects_region(region, part)
                    }
                    (ClippedRegion::Wgs84(region), PartGeometry::Wgs84(part)) => {
                        intersects_region(region, part)
                    }
                    (ClippedRegion::Local(region), PartGeometry::Wgs84(part)) => {
                        intersects_region(&projection.to_wgs84(region), part)
                    }
                    (ClippedRegion::Wgs84(region), PartGeometry::Local(part)) => {
                        intersects_region(region, &projection.to_wgs84(part))
                    }
                };
                if !inside {
                    continue;
                }
            }

            let mut record = FeatureRecord::new(id, part.properties());
            if store_geometry {
                record.geometry = geometry.map(|geometry| match geometry {
                    PartGeometry::Local(part) => projection.to_wgs84(&part).into_inner(),
                    PartGeometry::Wgs84(part) => part.into_inner(),
                });
            }
            collector.push(record, key);
        }
        Ok(())
    }
}

struct SpatialIndexWalker {
    scheme: SpatialIndexScheme,
    column: String,
}

impl SpatialIndexWalker {
    fn cell_label(&self, cell: u64) -> String {
        match self.scheme {
            SpatialIndexScheme::H3 => h3::cell_to_string(cell),
            SpatialIndexScheme::Quadbin => cell.to_string(),
        }
    }

    fn cell_geometry(&self, cell: u64) -> Result<Geometry<f64>> {
        let boundary = match self.scheme {
            SpatialIndexScheme::H3 => h3::cell_boundary(cell)?,
            SpatialIndexScheme::Quadbin => quadbin::cell_boundary(cell).to_polygon(),
        };
        Ok(Geometry::Polygon(boundary.into_inner()))
    }
}

impl TileWalker for SpatialIndexWalker {
    fn domain(&self) -> TileDomain {
        TileDomain::SpatialIndex(self.scheme)
    }

    fn for_each_candidate(
        &self,
        tile: &Tile,
        intersection: &Intersection,
        collector: &mut Collector<'_>,
    ) -> Result<()> {
        let Some(TileData::SpatialIndex(data)) = tile.data.as_ref() else {
            return domain_mismatch(tile, self.domain());
        };
        let Some(cells) = cell_filter(intersection) else {
            return Ok(());
        };

        for (index, feature) in data.cells.iter().enumerate() {
            if cells.is_some_and(|cells| !cells.has(feature.id)) {
                continue;
            }
            let id = collector
                .explicit_id(|column| feature.properties.get(column).cloned())
                .unwrap_or(UniqueId::Cell(feature.id));
            let key = collector.cell_key(index);
            if collector.is_duplicate(&id, key) {
                continue;
            }
            let mut properties = IndexMap::with_capacity(feature.properties.len() + 1);
            properties.insert(
                self.column.clone(),
                Scalar::String(self.cell_label(feature.id)),
            );
            for (column, value) in feature.properties.iter() {
                properties.insert(column.clone(), value.clone());
            }
            let mut record = FeatureRecord::new(id, properties);
            if collector.options.store_geometry {
                record.geometry = Some(self.cell_geometry(feature.id)?);
            }
            collector.push(record, key);
        }
        Ok(())
    }
}

struct RasterWalker {
    column: String,
}

impl TileWalker for RasterWalker {
    fn domain(&self) -> TileDomain {
        TileDomain::Raster
    }

    fn for_each_candidate(
        &self,
        tile: &Tile,
        intersection: &Intersection,
        collector: &mut Collector<'_>,
    ) -> Result<()> {
        let Some(TileData::Raster(data)) = tile.data.as_ref() else {
            return domain_mismatch(tile, self.domain());
        };
        let Some(cells) = cell_filter(intersection) else {
            return Ok(());
        };
        let parent = tile.id.cell();
        quadbin::validate_cell(parent)?;
        let resolution = raster_cell_resolution(parent, data.block_size)?;

        // Pixel `i` of every band is the `i`-th child in row-major order.
        for (pixel, cell) in quadbin::cell_to_children(parent, resolution)
            .into_iter()
            .enumerate()
        {
            if cells.is_some_and(|cells| !cells.has(cell)) {
                continue;
            }
            let id = UniqueId::Cell(cell);
            let key = collector.cell_key(pixel);
            if collector.is_duplicate(&id, key) {
                continue;
            }
            let mut properties = IndexMap::with_capacity(data.bands.len() + 1);
            properties.insert(self.column.clone(), Scalar::String(cell.to_string()));
            let mut valid_bands = 0;
            for (band_name, band) in data.bands.iter() {
                if let Some(value) = band.valid_value(pixel) {
                    properties.insert(band_name.clone(), Scalar::Number(value));
                    valid_bands += 1;
                }
            }
            if valid_bands == 0 {
                continue;
            }
            let mut record = FeatureRecord::new(id, properties);
            if collector.options.store_geometry {
                record.geometry = Some(Geometry::Polygon(
                    quadbin::cell_boundary(cell).to_polygon().into_inner(),
                ));
            }
            collector.push(record, key);
        }
        Ok(())
    }
}
