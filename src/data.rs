//! Input records consumed by the layout engine.
//!
//! Everything here is plain declarative data: a metric table keyed by region
//! id, an opaque polygon feed, and the ordered stage/flow lists that feed the
//! Sankey normalizer. Nothing is fetched or persisted.

use std::collections::BTreeMap;
use std::path::Path;

use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};

use crate::error::DataError;

/// One row of the per-region metric table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionMetric {
    /// Region identifier shared with the polygon feed (two-digit FIPS for US states).
    pub region_id: String,
    /// Abbreviation shown in tooltips (e.g. "CA").
    pub short_name: String,
    pub patient_count: u32,
    pub active_provider_count: u32,
    pub adoption_rate_percent: f64,
}

/// Metric records keyed by region id. Ids are unique by construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricTable {
    records: BTreeMap<String, RegionMetric>,
}

impl MetricTable {
    pub fn from_records(
        records: impl IntoIterator<Item = RegionMetric>,
    ) -> Result<Self, DataError> {
        let mut table = BTreeMap::new();
        for record in records {
            if table.contains_key(&record.region_id) {
                return Err(DataError::DuplicateRegion(record.region_id));
            }
            table.insert(record.region_id.clone(), record);
        }
        Ok(Self { records: table })
    }

    pub fn get(&self, region_id: &str) -> Option<&RegionMetric> {
        self.records.get(region_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegionMetric> {
        self.records.values()
    }
}

/// A region boundary as delivered by the external polygon source.
///
/// The geometry type is left generic; the binder only passes it through.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionFeature<G> {
    pub id: String,
    pub geometry: G,
}

pub type RegionShape = MultiPolygon<f64>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageSpec {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowSpec {
    pub source_id: String,
    pub target_id: String,
    pub weight: f64,
}

/// Dashboard input file: the referral stage graph plus the regional metric rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub stages: Vec<StageSpec>,
    #[serde(default)]
    pub flows: Vec<FlowSpec>,
    #[serde(default)]
    pub regions: Vec<RegionMetric>,
}

impl Dataset {
    pub fn from_json(input: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn metric_table(&self) -> Result<MetricTable, DataError> {
        MetricTable::from_records(self.regions.iter().cloned())
    }
}

#[derive(Debug, Deserialize)]
struct FeedFile {
    regions: Vec<FeedRegion>,
}

/// `polygons` follows GeoJSON MultiPolygon nesting: polygon -> rings -> [x, y].
/// The first ring of each polygon is its exterior, the rest are holes.
#[derive(Debug, Deserialize)]
struct FeedRegion {
    id: String,
    polygons: Vec<Vec<Vec<[f64; 2]>>>,
}

pub fn parse_polygon_feed(input: &str) -> anyhow::Result<Vec<RegionFeature<RegionShape>>> {
    let parsed: FeedFile = serde_json::from_str(input)?;
    let features = parsed
        .regions
        .into_iter()
        .map(|region| RegionFeature {
            id: region.id,
            geometry: MultiPolygon::new(region.polygons.into_iter().map(to_polygon).collect()),
        })
        .collect();
    Ok(features)
}

pub fn load_polygon_feed(path: &Path) -> anyhow::Result<Vec<RegionFeature<RegionShape>>> {
    let contents = std::fs::read_to_string(path)?;
    parse_polygon_feed(&contents)
}

fn to_polygon(rings: Vec<Vec<[f64; 2]>>) -> Polygon<f64> {
    let mut rings = rings.into_iter().map(|ring| {
        LineString::new(ring.into_iter().map(|[x, y]| Coord { x, y }).collect())
    });
    let exterior = rings.next().unwrap_or_else(|| LineString::new(Vec::new()));
    Polygon::new(exterior, rings.collect())
}
