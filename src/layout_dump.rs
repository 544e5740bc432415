use crate::choropleth::RegionBinder;
use crate::layout::{FlowMeasure, SankeyLayout};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LayoutDump {
    Sankey(SankeyDump),
    Map(MapDump),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SankeyDump {
    pub width: f64,
    pub height: f64,
    pub measure: FlowMeasure,
    pub flow_unit: f64,
    pub scale: f64,
    pub node_padding: f64,
    pub column_count: usize,
    pub nodes: Vec<NodeDump>,
    pub links: Vec<LinkDump>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDump {
    pub id: String,
    pub display_name: String,
    pub column_index: usize,
    pub value: f64,
    pub x0: f64,
    pub x1: f64,
    pub vertical_start: f64,
    pub vertical_end: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkDump {
    pub source_id: String,
    pub target_id: String,
    pub weight: f64,
    pub stroke_width: f64,
    pub source_offset: f64,
    pub target_offset: f64,
    pub points: Vec<[f64; 2]>,
    pub path: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapDump {
    pub regions: Vec<RegionDump>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionDump {
    pub region_id: String,
    pub token: String,
    pub fill_color: String,
    pub tooltip_text: Option<String>,
}

impl LayoutDump {
    pub fn from_sankey(layout: &SankeyLayout) -> Self {
        let nodes = layout
            .nodes
            .iter()
            .map(|node| NodeDump {
                id: node.id.clone(),
                display_name: node.display_name.clone(),
                column_index: node.column_index,
                value: node.value,
                x0: node.x0,
                x1: node.x1,
                vertical_start: node.vertical_start,
                vertical_end: node.vertical_end,
            })
            .collect();

        let links = layout
            .links
            .iter()
            .map(|link| {
                let p = &link.path;
                LinkDump {
                    source_id: link.source_id.clone(),
                    target_id: link.target_id.clone(),
                    weight: link.weight,
                    stroke_width: link.stroke_width,
                    source_offset: link.source_offset,
                    target_offset: link.target_offset,
                    points: [p.start, p.control_start, p.control_end, p.end]
                        .iter()
                        .map(|(x, y)| [*x, *y])
                        .collect(),
                    path: p.to_svg_path(),
                }
            })
            .collect();

        LayoutDump::Sankey(SankeyDump {
            width: layout.viewport.width,
            height: layout.viewport.height,
            measure: layout.measure,
            flow_unit: layout.flow_unit,
            scale: layout.scale,
            node_padding: layout.node_padding,
            column_count: layout.column_count,
            nodes,
            links,
        })
    }

    pub fn from_regions<G>(binder: RegionBinder<'_, G>) -> Self {
        let regions = binder
            .iter()
            .map(|region| RegionDump {
                region_id: region.region_id.to_string(),
                token: region.token.as_str().to_string(),
                fill_color: region.fill_color.to_string(),
                tooltip_text: region.tooltip_text,
            })
            .collect();
        LayoutDump::Map(MapDump { regions })
    }
}

pub fn write_layout_dump(path: &Path, dump: &LayoutDump) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, dump)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::choropleth::{Palette, ThresholdClassifier};
    use crate::layout::{Viewport, compute_sankey};
    use crate::sample;

    #[test]
    fn sankey_dump_serializes_geometry() {
        let layout =
            compute_sankey(&sample::dataset(), &Viewport::default(), FlowMeasure::Incident)
                .unwrap();
        let json = serde_json::to_value(LayoutDump::from_sankey(&layout)).unwrap();
        assert_eq!(json["kind"], "sankey");
        assert_eq!(json["columnCount"], 4);
        assert_eq!(json["nodes"].as_array().unwrap().len(), 4);
        assert_eq!(json["nodes"][0]["id"], "initial_diagnosis");
        assert_eq!(json["links"][0]["points"].as_array().unwrap().len(), 4);
        assert!(json["links"][0]["path"].as_str().unwrap().starts_with("M "));
    }

    #[test]
    fn map_dump_keeps_feed_order_and_no_data() {
        let metrics = sample::dataset().metric_table().unwrap();
        let classifier = ThresholdClassifier::default();
        let palette = Palette::default();
        let binder = RegionBinder::new(sample::tile_feed(), &metrics, &classifier, &palette);
        let json = serde_json::to_value(LayoutDump::from_regions(binder)).unwrap();
        let regions = json["regions"].as_array().unwrap();
        assert_eq!(regions.len(), sample::tile_feed().len());
        assert_eq!(regions[0]["regionId"], sample::tile_feed()[0].id.as_str());
        let pr = regions.iter().find(|r| r["regionId"] == "72").unwrap();
        assert_eq!(pr["token"], "no-data");
        assert_eq!(pr["fillColor"], "#F0F2F5");
        assert!(pr["tooltipText"].is_null());
    }
}
