//! Steps y pipelines que el binario sabe resolver por nombre.
//!
//! Los manifiestos generados invocan `wurzel run <type_path>`; el registry
//! traduce ese texto al `StepHandle` compilado en el binario.

use std::sync::Arc;

use indexmap::IndexMap;
use wurzel_core::step::handle;
use wurzel_core::{ContractError, GraphError, NodeId, StepGraph, StepHandle, TypedStep};

use crate::errors::CliError;

/// Construye un grafo y devuelve su nodo terminal.
pub type PipelineFactory = fn() -> Result<(StepGraph, NodeId), GraphError>;

#[derive(Default)]
pub struct StepRegistry {
    steps: IndexMap<&'static str, Arc<dyn StepHandle>>,
    pipelines: IndexMap<String, PipelineFactory>,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_step<S: TypedStep>(mut self) -> Result<Self, ContractError> {
        self.register_step::<S>()?;
        Ok(self)
    }

    pub fn register_step<S: TypedStep>(&mut self) -> Result<(), ContractError> {
        let step = handle::<S>()?;
        self.steps.insert(step.type_path(), step);
        Ok(())
    }

    pub fn register_pipeline(&mut self, name: &str, factory: PipelineFactory) {
        self.pipelines.insert(name.to_string(), factory);
    }

    pub fn steps(&self) -> impl Iterator<Item = &dyn StepHandle> {
        self.steps.values().map(|s| s.as_ref())
    }

    pub fn pipeline_names(&self) -> Vec<&str> {
        self.pipelines.keys().map(String::as_str).collect()
    }

    /// Busca por ruta de tipo completa, por nombre corto (sin distinguir
    /// mayúsculas) o por sufijo `::Nombre`.
    pub fn step(&self, name: &str) -> Result<Arc<dyn StepHandle>, CliError> {
        if let Some(step) = self.steps.get(name) {
            return Ok(step.clone());
        }
        let short = name.rsplit("::").next().unwrap_or(name);
        self.steps
            .values()
            .find(|s| s.name().eq_ignore_ascii_case(short))
            .cloned()
            .ok_or_else(|| CliError::UnknownStep { name: name.to_string(),
                                                   available: self.steps.values().map(|s| s.name()).collect::<Vec<_>>().join(", ") })
    }

    /// Un pipeline registrado o, si no lo hay, el grafo de un único step.
    pub fn pipeline(&self, name: &str) -> Result<(StepGraph, NodeId), CliError> {
        if let Some(factory) = self.pipelines.get(name) {
            return Ok(factory()?);
        }
        match self.step(name) {
            Ok(step) => {
                let mut graph = StepGraph::new();
                let root = graph.add_handle(step);
                Ok((graph, root))
            }
            Err(_) => Err(CliError::UnknownPipeline { name: name.to_string(),
                                                      available: self.pipeline_names().join(", ") }),
        }
    }
}

#[cfg(test)]
mod tests {
    use wurzel_core::{data_model, typed_step};

    use super::*;

    data_model!(Row { v: u32 });
    typed_step! { leaf RowsStep { output: Vec<Row>, run(_me) { vec![Row { v: 1 }] } } }

    #[test]
    fn resolves_by_type_path_and_short_name() {
        let registry = StepRegistry::new().with_step::<RowsStep>().unwrap();
        let path = std::any::type_name::<RowsStep>();
        assert_eq!(registry.step(path).unwrap().name(), "RowsStep");
        assert_eq!(registry.step("rowsstep").unwrap().name(), "RowsStep");
        assert_eq!(registry.step("some::other::RowsStep").unwrap().name(), "RowsStep");
        assert!(matches!(registry.step("Nope"), Err(CliError::UnknownStep { .. })));
    }

    #[test]
    fn single_step_is_a_pipeline() {
        let registry = StepRegistry::new().with_step::<RowsStep>().unwrap();
        let (graph, root) = registry.pipeline("RowsStep").unwrap();
        assert_eq!(graph.len(), 1);
        assert!(graph.node(root).unwrap().is_leaf());
        assert!(matches!(registry.pipeline("missing"), Err(CliError::UnknownPipeline { .. })));
    }
}
