//! Built-in dashboard data: the SMA referral funnel and per-state adoption figures.

use geo::{Coord, LineString, MultiPolygon, Polygon};
use once_cell::sync::Lazy;

use crate::data::{Dataset, FlowSpec, RegionFeature, RegionMetric, RegionShape, StageSpec};

// (fips, abbr, patients, active HCPs, adoption rate)
const STATE_METRICS: [(&str, &str, u32, u32, f64); 51] = [
    ("01", "AL", 127, 45, 68.0),
    ("02", "AK", 25, 12, 55.0),
    ("04", "AZ", 192, 83, 72.0),
    ("05", "AR", 95, 37, 65.0),
    ("06", "CA", 873, 264, 82.0),
    ("08", "CO", 177, 67, 75.0),
    ("09", "CT", 128, 51, 73.0),
    ("10", "DE", 31, 16, 69.0),
    ("11", "DC", 24, 15, 71.0),
    ("12", "FL", 640, 221, 78.0),
    ("13", "GA", 274, 95, 74.0),
    ("15", "HI", 54, 21, 62.0),
    ("16", "ID", 58, 28, 67.0),
    ("17", "IL", 391, 136, 76.0),
    ("18", "IN", 247, 83, 71.0),
    ("19", "IA", 143, 56, 69.0),
    ("20", "KS", 129, 47, 66.0),
    ("21", "KY", 167, 62, 68.0),
    ("22", "LA", 186, 73, 64.0),
    ("23", "ME", 62, 24, 70.0),
    ("24", "MD", 245, 92, 74.0),
    ("25", "MA", 293, 104, 80.0),
    ("26", "MI", 373, 135, 75.0),
    ("27", "MN", 206, 78, 76.0),
    ("28", "MS", 104, 38, 63.0),
    ("29", "MO", 234, 88, 70.0),
    ("30", "MT", 48, 19, 61.0),
    ("31", "NE", 83, 34, 67.0),
    ("32", "NV", 153, 58, 71.0),
    ("33", "NH", 57, 23, 74.0),
    ("34", "NJ", 382, 138, 77.0),
    ("35", "NM", 88, 32, 68.0),
    ("36", "NY", 672, 241, 81.0),
    ("37", "NC", 358, 129, 76.0),
    ("38", "ND", 37, 15, 65.0),
    ("39", "OH", 421, 148, 73.0),
    ("40", "OK", 163, 63, 69.0),
    ("41", "OR", 147, 59, 72.0),
    ("42", "PA", 523, 187, 78.0),
    ("44", "RI", 43, 18, 74.0),
    ("45", "SC", 174, 64, 70.0),
    ("46", "SD", 43, 17, 66.0),
    ("47", "TN", 238, 89, 72.0),
    ("48", "TX", 812, 283, 79.0),
    ("49", "UT", 101, 40, 71.0),
    ("50", "VT", 26, 12, 68.0),
    ("51", "VA", 316, 115, 74.0),
    ("53", "WA", 231, 89, 75.0),
    ("54", "WV", 58, 22, 64.0),
    ("55", "WI", 198, 76, 72.0),
    ("56", "WY", 29, 13, 63.0),
];

// Tile-grid cartogram cells as (fips, column, row). Puerto Rico has no metric row.
const TILE_GRID: [(&str, u8, u8); 52] = [
    ("02", 0, 0),
    ("23", 11, 0),
    ("55", 6, 1),
    ("50", 10, 1),
    ("33", 11, 1),
    ("53", 1, 2),
    ("16", 2, 2),
    ("30", 3, 2),
    ("38", 4, 2),
    ("27", 5, 2),
    ("17", 6, 2),
    ("26", 7, 2),
    ("36", 9, 2),
    ("25", 10, 2),
    ("41", 1, 3),
    ("32", 2, 3),
    ("56", 3, 3),
    ("46", 4, 3),
    ("19", 5, 3),
    ("18", 6, 3),
    ("39", 7, 3),
    ("42", 8, 3),
    ("34", 9, 3),
    ("09", 10, 3),
    ("44", 11, 3),
    ("06", 1, 4),
    ("49", 2, 4),
    ("08", 3, 4),
    ("31", 4, 4),
    ("29", 5, 4),
    ("21", 6, 4),
    ("54", 7, 4),
    ("51", 8, 4),
    ("24", 9, 4),
    ("10", 10, 4),
    ("04", 2, 5),
    ("35", 3, 5),
    ("20", 4, 5),
    ("05", 5, 5),
    ("47", 6, 5),
    ("37", 7, 5),
    ("45", 8, 5),
    ("11", 9, 5),
    ("40", 4, 6),
    ("22", 5, 6),
    ("28", 6, 6),
    ("01", 7, 6),
    ("13", 8, 6),
    ("15", 0, 7),
    ("48", 4, 7),
    ("12", 9, 7),
    ("72", 11, 7),
];

const TILE_GAP: f64 = 0.06;

static TILE_FEED: Lazy<Vec<RegionFeature<RegionShape>>> = Lazy::new(|| {
    TILE_GRID
        .iter()
        .map(|&(id, col, row)| RegionFeature {
            id: id.to_string(),
            geometry: tile(col, row),
        })
        .collect()
});

/// Unit square for a grid cell, in map units with y pointing north.
fn tile(col: u8, row: u8) -> MultiPolygon<f64> {
    let x0 = f64::from(col) + TILE_GAP;
    let x1 = f64::from(col) + 1.0 - TILE_GAP;
    let y1 = -f64::from(row) - TILE_GAP;
    let y0 = -f64::from(row) - 1.0 + TILE_GAP;
    let ring = LineString::new(vec![
        Coord { x: x0, y: y0 },
        Coord { x: x1, y: y0 },
        Coord { x: x1, y: y1 },
        Coord { x: x0, y: y1 },
        Coord { x: x0, y: y0 },
    ]);
    MultiPolygon::new(vec![Polygon::new(ring, Vec::new())])
}

pub fn region_metrics() -> Vec<RegionMetric> {
    STATE_METRICS
        .iter()
        .map(|&(id, abbr, patients, hcps, rate)| RegionMetric {
            region_id: id.to_string(),
            short_name: abbr.to_string(),
            patient_count: patients,
            active_provider_count: hcps,
            adoption_rate_percent: rate,
        })
        .collect()
}

pub fn referral_stages() -> Vec<StageSpec> {
    [
        ("initial_diagnosis", "Initial Diagnosis"),
        ("referral_to_specialist", "Referral to Specialist"),
        ("genetic_testing", "Genetic Testing"),
        ("diagnosis_confirmation", "Diagnosis Confirmation"),
    ]
    .into_iter()
    .map(|(id, name)| StageSpec {
        id: id.to_string(),
        name: name.to_string(),
    })
    .collect()
}

pub fn referral_flows() -> Vec<FlowSpec> {
    [
        ("initial_diagnosis", "referral_to_specialist", 70.0),
        ("referral_to_specialist", "genetic_testing", 50.0),
        ("genetic_testing", "diagnosis_confirmation", 40.0),
    ]
    .into_iter()
    .map(|(source, target, weight)| FlowSpec {
        source_id: source.to_string(),
        target_id: target.to_string(),
        weight,
    })
    .collect()
}

pub fn dataset() -> Dataset {
    Dataset {
        stages: referral_stages(),
        flows: referral_flows(),
        regions: region_metrics(),
    }
}

/// Square-tile stand-in for the US state boundary feed.
pub fn tile_feed() -> &'static [RegionFeature<RegionShape>] {
    &TILE_FEED
}
