use serde::{Deserialize, Serialize};

use crate::error::LayoutError;

use super::graph::StageGraph;

/// Output area for the flow diagram, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub margin_top: f64,
    pub margin_right: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
    pub node_thickness: f64,
    pub node_padding: f64,
}

impl Viewport {
    pub fn inner_width(&self) -> f64 {
        self.width - self.margin_left - self.margin_right
    }

    pub fn inner_height(&self) -> f64 {
        self.height - self.margin_top - self.margin_bottom
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 400.0,
            margin_top: 40.0,
            margin_right: 50.0,
            margin_bottom: 40.0,
            margin_left: 50.0,
            node_thickness: 30.0,
            node_padding: 20.0,
        }
    }
}

/// How a node's size is derived from the flows touching it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlowMeasure {
    /// Sum of every incoming and outgoing weight.
    #[default]
    Incident,
    /// The larger of the inbound and outbound sums, so link bands tile the node edges.
    Throughput,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    pub id: String,
    pub display_name: String,
    pub column_index: usize,
    pub value: f64,
    pub x0: f64,
    pub x1: f64,
    pub vertical_start: f64,
    pub vertical_end: f64,
}

impl LayoutNode {
    pub fn height(&self) -> f64 {
        self.vertical_end - self.vertical_start
    }
}

/// Horizontal cubic Bezier along the centre line of a link band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkPath {
    pub start: (f64, f64),
    pub control_start: (f64, f64),
    pub control_end: (f64, f64),
    pub end: (f64, f64),
}

impl LinkPath {
    fn horizontal(start: (f64, f64), end: (f64, f64)) -> Self {
        let mid_x = (start.0 + end.0) / 2.0;
        Self {
            start,
            control_start: (mid_x, start.1),
            control_end: (mid_x, end.1),
            end,
        }
    }

    pub fn to_svg_path(&self) -> String {
        format!(
            "M {:.2} {:.2} C {:.2} {:.2} {:.2} {:.2} {:.2} {:.2}",
            self.start.0,
            self.start.1,
            self.control_start.0,
            self.control_start.1,
            self.control_end.0,
            self.control_end.1,
            self.end.0,
            self.end.1
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutLink {
    pub source_id: String,
    pub target_id: String,
    pub weight: f64,
    pub stroke_width: f64,
    /// Top of the band measured from the source node's top edge.
    pub source_offset: f64,
    /// Top of the band measured from the target node's top edge.
    pub target_offset: f64,
    pub path: LinkPath,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SankeyLayout {
    pub viewport: Viewport,
    pub measure: FlowMeasure,
    /// Largest flow weight. Sizes are solved on weights divided by it so the
    /// scale stays finite for very large or very small magnitudes.
    pub flow_unit: f64,
    /// Pixels per `flow_unit`, shared by node heights and link widths.
    pub scale: f64,
    /// Gap actually used between stacked nodes; may be below the requested padding.
    pub node_padding: f64,
    pub column_count: usize,
    /// Declaration order.
    pub nodes: Vec<LayoutNode>,
    /// Flow input order.
    pub links: Vec<LayoutLink>,
}

impl SankeyLayout {
    pub fn node(&self, id: &str) -> Option<&LayoutNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Drawn size of `flow` in pixels.
    pub fn pixels(&self, flow: f64) -> f64 {
        flow / self.flow_unit * self.scale
    }
}

pub fn layout(graph: &StageGraph, viewport: &Viewport) -> Result<SankeyLayout, LayoutError> {
    layout_with_measure(graph, viewport, FlowMeasure::default())
}

/// Positions every stage and link. Pure: the same inputs give the same geometry.
pub fn layout_with_measure(
    graph: &StageGraph,
    viewport: &Viewport,
    measure: FlowMeasure,
) -> Result<SankeyLayout, LayoutError> {
    let inner_width = viewport.inner_width();
    let inner_height = viewport.inner_height();
    let thickness = viewport.node_thickness;
    if !(inner_height > 0.0)
        || !inner_width.is_finite()
        || !inner_height.is_finite()
        || !(thickness >= 0.0)
        || inner_width < thickness
    {
        return Err(LayoutError::InvalidViewport {
            inner_width,
            inner_height,
            node_thickness: thickness,
        });
    }

    let nodes = graph.nodes();
    let edges = graph.edges();
    let node_count = nodes.len();
    let num_columns = graph.column_count();

    let flow_unit = edges
        .iter()
        .map(|edge| edge.weight)
        .fold(0.0f64, f64::max);
    let flow_unit = if flow_unit > 0.0 { flow_unit } else { 1.0 };

    // Raw totals are reported on the nodes; unit totals drive the geometry.
    let mut in_total = vec![0.0f64; node_count];
    let mut out_total = vec![0.0f64; node_count];
    let mut in_units = vec![0.0f64; node_count];
    let mut out_units = vec![0.0f64; node_count];
    for edge in edges {
        let units = edge.weight / flow_unit;
        out_total[edge.source] += edge.weight;
        in_total[edge.target] += edge.weight;
        out_units[edge.source] += units;
        in_units[edge.target] += units;
    }
    let measured = |inbound: &[f64], outbound: &[f64]| -> Vec<f64> {
        (0..node_count)
            .map(|idx| match measure {
                FlowMeasure::Incident => inbound[idx] + outbound[idx],
                FlowMeasure::Throughput => inbound[idx].max(outbound[idx]),
            })
            .collect()
    };
    let values = measured(&in_total, &out_total);
    let unit_values = measured(&in_units, &out_units);

    let mut column_nodes: Vec<Vec<usize>> = vec![Vec::new(); num_columns];
    for (idx, node) in nodes.iter().enumerate() {
        column_nodes[node.column_index].push(idx);
    }

    let column_step = if num_columns > 1 {
        (inner_width - thickness) / (num_columns - 1) as f64
    } else {
        0.0
    };

    // Shrink the gap when the busiest column cannot hold it, keeping some
    // height for the nodes themselves.
    let max_per_column = column_nodes.iter().map(Vec::len).max().unwrap_or(0);
    let requested_padding = viewport.node_padding.max(0.0);
    let padding = if max_per_column > 1 {
        requested_padding.min(inner_height / max_per_column as f64)
    } else {
        requested_padding
    };

    let scale = column_nodes
        .iter()
        .filter_map(|members| {
            let total: f64 = members.iter().map(|&idx| unit_values[idx]).sum();
            if total <= 0.0 {
                return None;
            }
            let gaps = members.len().saturating_sub(1) as f64 * padding;
            Some((inner_height - gaps) / total)
        })
        .fold(f64::INFINITY, f64::min);
    let scale = if scale.is_finite() { scale } else { 0.0 };

    let mut node_x = vec![0.0f64; node_count];
    let mut node_y = vec![0.0f64; node_count];
    let mut node_h = vec![0.0f64; node_count];
    for (column, members) in column_nodes.iter().enumerate() {
        let x = viewport.margin_left + column as f64 * column_step;
        let mut y = viewport.margin_top;
        for &idx in members {
            node_x[idx] = x;
            node_y[idx] = y;
            node_h[idx] = unit_values[idx] * scale;
            y += node_h[idx] + padding;
        }
    }

    let edge_thickness: Vec<f64> = edges
        .iter()
        .map(|edge| edge.weight / flow_unit * scale)
        .collect();

    // Sibling bands stack in column order of the node at the other end, then
    // declaration order, then flow order.
    let mut source_offset = vec![0.0f64; edges.len()];
    let mut target_offset = vec![0.0f64; edges.len()];
    for idx in 0..node_count {
        let mut outbound = graph.outgoing(idx).to_vec();
        outbound.sort_by_key(|&edge_idx| {
            let target = edges[edge_idx].target;
            (nodes[target].column_index, target, edge_idx)
        });
        let mut acc = 0.0;
        for edge_idx in outbound {
            source_offset[edge_idx] = acc;
            acc += edge_thickness[edge_idx];
        }

        let mut inbound = graph.incoming(idx).to_vec();
        inbound.sort_by_key(|&edge_idx| {
            let source = edges[edge_idx].source;
            (nodes[source].column_index, source, edge_idx)
        });
        let mut acc = 0.0;
        for edge_idx in inbound {
            target_offset[edge_idx] = acc;
            acc += edge_thickness[edge_idx];
        }
    }

    let layout_nodes = nodes
        .iter()
        .enumerate()
        .map(|(idx, node)| LayoutNode {
            id: node.id.clone(),
            display_name: node.display_name.clone(),
            column_index: node.column_index,
            value: values[idx],
            x0: node_x[idx],
            x1: node_x[idx] + thickness,
            vertical_start: node_y[idx],
            vertical_end: node_y[idx] + node_h[idx],
        })
        .collect();

    let links = edges
        .iter()
        .enumerate()
        .map(|(edge_idx, edge)| {
            let width = edge_thickness[edge_idx];
            let start = (
                node_x[edge.source] + thickness,
                node_y[edge.source] + source_offset[edge_idx] + width / 2.0,
            );
            let end = (
                node_x[edge.target],
                node_y[edge.target] + target_offset[edge_idx] + width / 2.0,
            );
            LayoutLink {
                source_id: edge.source_id.clone(),
                target_id: edge.target_id.clone(),
                weight: edge.weight,
                stroke_width: width,
                source_offset: source_offset[edge_idx],
                target_offset: target_offset[edge_idx],
                path: LinkPath::horizontal(start, end),
            }
        })
        .collect();

    tracing::debug!(
        columns = num_columns,
        nodes = node_count,
        links = edges.len(),
        flow_unit,
        scale,
        padding,
        "computed sankey layout"
    );

    Ok(SankeyLayout {
        viewport: *viewport,
        measure,
        flow_unit,
        scale,
        node_padding: padding,
        column_count: num_columns,
        nodes: layout_nodes,
        links,
    })
}
