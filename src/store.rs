use std::sync::Arc;

use anyhow::Result;
use indexmap::IndexMap;
use tracing::info;

use crate::domain::TileDomain;
use crate::filters::BinaryFilter;
use crate::record::{FeatureRecord, UniqueId};
use crate::spatial::SpatialFilter;
use crate::tiles::{ExtractOptions, ExtractStats, Tile, extract_with_prefilter};

#[derive(Debug, Clone, Default)]
pub struct FeatureSnapshot {
    records: Arc<Vec<FeatureRecord>>,
    index: Arc<IndexMap<UniqueId, usize>>,
    stats: ExtractStats,
}

impl FeatureSnapshot {
    pub fn from_records(records: Vec<FeatureRecord>) -> Self {
        let index = records
            .iter()
            .enumerate()
            .map(|(position, record)| (record.id.clone(), position))
            .collect();
        Self {
            records: Arc::new(records),
            index: Arc::new(index),
            stats: ExtractStats::default(),
        }
    }

    pub fn get(&self, id: &UniqueId) -> Option<&FeatureRecord> {
        self.index
            .get(id)
            .and_then(|position| self.records.get(*position))
    }

    pub fn records(&self) -> &[FeatureRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn stats(&self) -> ExtractStats {
        self.stats
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.records.iter().any(|record| record.has_column(column))
    }
}

pub fn load(
    tiles: &[Tile],
    filter: Option<&SpatialFilter>,
    domain: TileDomain,
    options: &ExtractOptions,
    prefilter: Option<&BinaryFilter>,
) -> Result<FeatureSnapshot> {
    let extraction = extract_with_prefilter(tiles, filter, domain, options, prefilter)?;
    let stats = extraction.stats;
    let mut snapshot = FeatureSnapshot::from_records(extraction.into_records());
    snapshot.stats = stats;
    info!(%domain, features = snapshot.len(), tiles = stats.tiles, "feature snapshot loaded");
    Ok(snapshot)
}
