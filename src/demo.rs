//! Registry del binario `wurzel`.

use wurzel_cli::StepRegistry;
use wurzel_core::{ContractError, GraphError, NodeId, Pipe, StepGraph};
use wurzel_steps::{DropDuplicationStep, ManualMarkdownStep};

/// Nombre del pipeline de ejemplo.
pub const MARKDOWN_PIPELINE: &str = "markdown";

/// `ManualMarkdownStep -> DropDuplicationStep`.
pub fn markdown_pipeline() -> Result<(StepGraph, NodeId), GraphError> {
    let mut graph = StepGraph::new();
    let root = Pipe::<ManualMarkdownStep>::start(&mut graph)?.then::<DropDuplicationStep>()?.node();
    Ok((graph, root))
}

pub fn registry() -> Result<StepRegistry, ContractError> {
    let mut registry = StepRegistry::new().with_step::<ManualMarkdownStep>()?
                                          .with_step::<DropDuplicationStep>()?;
    registry.register_pipeline(MARKDOWN_PIPELINE, markdown_pipeline);
    Ok(registry)
}
