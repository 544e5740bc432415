use thiserror::Error;

/// Rejections raised while normalizing a stage graph.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("flow {edge} references undeclared stage `{stage}`")]
    UnknownStage { edge: usize, stage: String },

    #[error("stages {} form a cycle", .stages.join(" -> "))]
    Cycle { stages: Vec<String> },

    #[error("stage `{0}` is declared more than once")]
    DuplicateStage(String),

    #[error("flow {edge} from `{from}` to `{to}` has weight {weight}, expected a finite value > 0")]
    InvalidWeight {
        edge: usize,
        from: String,
        to: String,
        weight: f64,
    },

    #[error("total flow through stage `{stage}` is not a finite number")]
    FlowOverflow { stage: String },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error(
        "viewport leaves a {inner_width}x{inner_height} drawing area, which cannot hold nodes {node_thickness} wide"
    )]
    InvalidViewport {
        inner_width: f64,
        inner_height: f64,
        node_thickness: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    #[error("region `{0}` has more than one metric record")]
    DuplicateRegion(String),
}
