//! Flow-diagram layout: stage graph normalization and the Sankey solver.

mod graph;
mod sankey;

pub use graph::{FlowEdge, StageGraph, StageNode, normalize};
pub use sankey::{
    FlowMeasure, LayoutLink, LayoutNode, LinkPath, SankeyLayout, Viewport, layout,
    layout_with_measure,
};

use crate::data::Dataset;

/// Normalizes the dataset's stage graph and lays it out in one step.
pub fn compute_sankey(
    dataset: &Dataset,
    viewport: &Viewport,
    measure: FlowMeasure,
) -> anyhow::Result<SankeyLayout> {
    let graph = normalize(&dataset.stages, &dataset.flows)?;
    Ok(layout_with_measure(&graph, viewport, measure)?)
}
