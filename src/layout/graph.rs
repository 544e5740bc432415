use std::collections::{HashMap, VecDeque};

use crate::data::{FlowSpec, StageSpec};
use crate::error::GraphError;

#[derive(Debug, Clone, PartialEq)]
pub struct StageNode {
    pub id: String,
    pub display_name: String,
    /// Longest-path depth from a source stage.
    pub column_index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlowEdge {
    pub source_id: String,
    pub target_id: String,
    pub weight: f64,
    pub(crate) source: usize,
    pub(crate) target: usize,
}

/// Validated stage graph. Nodes keep declaration order, edges keep input order.
#[derive(Debug, Clone)]
pub struct StageGraph {
    nodes: Vec<StageNode>,
    edges: Vec<FlowEdge>,
    index: HashMap<String, usize>,
    incoming: Vec<Vec<usize>>,
    outgoing: Vec<Vec<usize>>,
}

impl StageGraph {
    pub fn nodes(&self) -> &[StageNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[FlowEdge] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&StageNode> {
        self.index.get(id).map(|&idx| &self.nodes[idx])
    }

    pub fn column_count(&self) -> usize {
        self.nodes
            .iter()
            .map(|node| node.column_index + 1)
            .max()
            .unwrap_or(0)
    }

    /// Edge indices arriving at node `idx`, in input order.
    pub(crate) fn incoming(&self, idx: usize) -> &[usize] {
        &self.incoming[idx]
    }

    pub(crate) fn outgoing(&self, idx: usize) -> &[usize] {
        &self.outgoing[idx]
    }
}

/// Validates stages and flows and assigns each stage its column.
pub fn normalize(stages: &[StageSpec], flows: &[FlowSpec]) -> Result<StageGraph, GraphError> {
    let node_count = stages.len();
    let mut index: HashMap<String, usize> = HashMap::with_capacity(node_count);
    for (idx, stage) in stages.iter().enumerate() {
        if index.insert(stage.id.clone(), idx).is_some() {
            return Err(GraphError::DuplicateStage(stage.id.clone()));
        }
    }

    let mut edges = Vec::with_capacity(flows.len());
    let mut incoming: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    let mut indegree = vec![0usize; node_count];

    for (edge_idx, flow) in flows.iter().enumerate() {
        let resolve = |id: &str| {
            index.get(id).copied().ok_or_else(|| GraphError::UnknownStage {
                edge: edge_idx,
                stage: id.to_string(),
            })
        };
        let source = resolve(&flow.source_id)?;
        let target = resolve(&flow.target_id)?;
        if !flow.weight.is_finite() || flow.weight <= 0.0 {
            return Err(GraphError::InvalidWeight {
                edge: edge_idx,
                from: flow.source_id.clone(),
                to: flow.target_id.clone(),
                weight: flow.weight,
            });
        }
        if source == target {
            return Err(GraphError::Cycle {
                stages: vec![flow.source_id.clone()],
            });
        }
        outgoing[source].push(edge_idx);
        incoming[target].push(edge_idx);
        indegree[target] += 1;
        edges.push(FlowEdge {
            source_id: flow.source_id.clone(),
            target_id: flow.target_id.clone(),
            weight: flow.weight,
            source,
            target,
        });
    }

    let mut indegree_work = indegree;
    let mut queue: VecDeque<usize> = indegree_work
        .iter()
        .enumerate()
        .filter_map(|(idx, deg)| (*deg == 0).then_some(idx))
        .collect();
    let mut topo = Vec::with_capacity(node_count);
    while let Some(node_idx) = queue.pop_front() {
        topo.push(node_idx);
        for &edge_idx in &outgoing[node_idx] {
            let to_idx = edges[edge_idx].target;
            indegree_work[to_idx] -= 1;
            if indegree_work[to_idx] == 0 {
                queue.push_back(to_idx);
            }
        }
    }
    if topo.len() < node_count {
        let cycle = find_cycle(&indegree_work, &incoming, &edges);
        return Err(GraphError::Cycle {
            stages: cycle.into_iter().map(|idx| stages[idx].id.clone()).collect(),
        });
    }

    let mut throughput = vec![0.0f64; node_count];
    for edge in &edges {
        throughput[edge.source] += edge.weight;
        throughput[edge.target] += edge.weight;
    }
    if let Some(idx) = throughput.iter().position(|total| !total.is_finite()) {
        return Err(GraphError::FlowOverflow {
            stage: stages[idx].id.clone(),
        });
    }

    let mut columns = vec![0usize; node_count];
    for &node_idx in &topo {
        for &edge_idx in &outgoing[node_idx] {
            let to_idx = edges[edge_idx].target;
            columns[to_idx] = columns[to_idx].max(columns[node_idx] + 1);
        }
    }

    let nodes = stages
        .iter()
        .zip(columns)
        .map(|(stage, column_index)| StageNode {
            id: stage.id.clone(),
            display_name: stage.name.clone(),
            column_index,
        })
        .collect::<Vec<_>>();

    tracing::debug!(
        stages = nodes.len(),
        flows = edges.len(),
        columns = nodes.iter().map(|n| n.column_index + 1).max().unwrap_or(0),
        "normalized stage graph"
    );

    Ok(StageGraph {
        nodes,
        edges,
        index,
        incoming,
        outgoing,
    })
}

/// Walks predecessors among the nodes Kahn's pass could not release until one
/// repeats. The loop is reported in flow direction, starting from its
/// earliest-declared stage.
fn find_cycle(indegree_left: &[usize], incoming: &[Vec<usize>], edges: &[FlowEdge]) -> Vec<usize> {
    let Some(start) = indegree_left.iter().position(|&deg| deg > 0) else {
        return Vec::new();
    };
    let mut visited_at: HashMap<usize, usize> = HashMap::new();
    let mut walk = Vec::new();
    let mut current = start;
    loop {
        if let Some(&pos) = visited_at.get(&current) {
            let mut cycle = walk.split_off(pos);
            cycle.reverse();
            if let Some(first) = cycle.iter().enumerate().min_by_key(|(_, idx)| **idx) {
                let shift = first.0;
                cycle.rotate_left(shift);
            }
            return cycle;
        }
        visited_at.insert(current, walk.len());
        walk.push(current);
        let next = incoming[current]
            .iter()
            .map(|&edge_idx| edges[edge_idx].source)
            .find(|&source| indegree_left[source] > 0);
        match next {
            Some(source) => current = source,
            None => return walk,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stages(ids: &[&str]) -> Vec<StageSpec> {
        ids.iter()
            .map(|id| StageSpec {
                id: id.to_string(),
                name: id.to_uppercase(),
            })
            .collect()
    }

    fn flow(source: &str, target: &str, weight: f64) -> FlowSpec {
        FlowSpec {
            source_id: source.to_string(),
            target_id: target.to_string(),
            weight,
        }
    }

    #[test]
    fn two_node_cycle_is_rejected() {
        let err = normalize(&stages(&["A", "B"]), &[flow("A", "B", 1.0), flow("B", "A", 1.0)])
            .unwrap_err();
        match err {
            GraphError::Cycle { stages } => assert_eq!(stages, ["A", "B"]),
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn cycle_report_is_in_flow_order() {
        let err = normalize(
            &stages(&["s", "a", "b", "c"]),
            &[
                flow("s", "a", 1.0),
                flow("a", "b", 1.0),
                flow("b", "c", 1.0),
                flow("c", "a", 1.0),
            ],
        )
        .unwrap_err();
        assert_eq!(
            err,
            GraphError::Cycle {
                stages: vec!["a".to_string(), "b".to_string(), "c".to_string()]
            }
        );
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let err = normalize(&stages(&["A"]), &[flow("A", "A", 2.0)]).unwrap_err();
        assert_eq!(
            err,
            GraphError::Cycle {
                stages: vec!["A".to_string()]
            }
        );
    }

    #[test]
    fn unknown_stage_is_rejected() {
        let err = normalize(&stages(&["A", "B"]), &[flow("A", "B", 1.0), flow("B", "C", 1.0)])
            .unwrap_err();
        assert_eq!(
            err,
            GraphError::UnknownStage {
                edge: 1,
                stage: "C".to_string()
            }
        );
    }

    #[test]
    fn duplicate_stage_is_rejected() {
        let err = normalize(&stages(&["A", "A"]), &[]).unwrap_err();
        assert_eq!(err, GraphError::DuplicateStage("A".to_string()));
    }

    #[test]
    fn non_positive_weight_is_rejected() {
        for weight in [0.0, -3.0, f64::NAN, f64::INFINITY] {
            let err = normalize(&stages(&["A", "B"]), &[flow("A", "B", weight)]).unwrap_err();
            assert!(matches!(err, GraphError::InvalidWeight { edge: 0, .. }));
        }
    }

    #[test]
    fn overflowing_stage_total_is_rejected() {
        let err = normalize(
            &stages(&["a", "b", "c"]),
            &[flow("a", "b", 1e308), flow("b", "c", 1e308)],
        )
        .unwrap_err();
        assert_eq!(
            err,
            GraphError::FlowOverflow {
                stage: "b".to_string()
            }
        );
    }

    #[test]
    fn columns_use_longest_path() {
        // a -> b -> d and a shortcut a -> d: d sits after b, not next to it.
        let graph = normalize(
            &stages(&["a", "b", "d", "lonely"]),
            &[flow("a", "b", 5.0), flow("b", "d", 3.0), flow("a", "d", 2.0)],
        )
        .unwrap();
        let columns: Vec<usize> = graph.nodes().iter().map(|n| n.column_index).collect();
        assert_eq!(columns, [0, 1, 2, 0]);
        assert_eq!(graph.column_count(), 3);
        for edge in graph.edges() {
            let from = graph.node(&edge.source_id).unwrap().column_index;
            let to = graph.node(&edge.target_id).unwrap().column_index;
            assert!(to > from);
        }
    }

    #[test]
    fn declaration_order_does_not_constrain_columns() {
        let graph = normalize(&stages(&["late", "early"]), &[flow("early", "late", 1.0)]).unwrap();
        assert_eq!(graph.node("early").unwrap().column_index, 0);
        assert_eq!(graph.node("late").unwrap().column_index, 1);
        assert_eq!(graph.nodes()[0].id, "late");
    }

    #[test]
    fn empty_graph_normalizes() {
        let graph = normalize(&[], &[]).unwrap();
        assert!(graph.nodes().is_empty());
        assert_eq!(graph.column_count(), 0);
    }
}
