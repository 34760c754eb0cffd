//! Ejecución directa de un grafo, nodo a nodo en orden topológico.

use std::collections::HashMap;
use std::path::Path;

use super::{NodeId, StepGraph};
use crate::errors::ExecutorError;
use crate::executor::{StepExecutor, StepInput, StepReport};

/// Ejecuta los nodos alcanzables desde `root`, dependencias primero.
///
/// Con `output_root`, cada step escribe en `output_root/<StepName>` y sus
/// dependientes leen de ahí. Sin él, los resultados se pasan en memoria, lo
/// que no es posible para steps con salida por batches.
pub fn run_graph(executor: &mut StepExecutor,
                 graph: &StepGraph,
                 root: NodeId,
                 output_root: Option<&Path>)
                 -> Result<Vec<(NodeId, Vec<StepReport>)>, ExecutorError> {
    let order = graph.traverse(root)?;
    if output_root.is_some() {
        graph.ensure_unique_names(root)?;
    }
    // None: salida por batches sin directorio, no se puede pasar en memoria
    let mut produced: HashMap<NodeId, Option<Vec<StepInput>>> = HashMap::new();
    let mut reports = Vec::with_capacity(order.len());

    for id in order {
        let node = graph.node(id)?;
        let mut inputs = Vec::new();
        for dep in node.required() {
            match produced.get(&dep) {
                Some(Some(values)) => inputs.extend(values.iter().cloned()),
                Some(None) => return Err(ExecutorError::BatchedInMemory { step: graph.node(dep)?.name().to_string() }),
                None => {}
            }
        }
        let out_dir = output_root.map(|root| root.join(node.name()));
        let outcomes = executor.execute(node.step(), &inputs, out_dir.as_deref())?;

        let outputs = match &out_dir {
            Some(dir) => Some(vec![StepInput::Location(dir.clone())]),
            None => outcomes.iter()
                            .map(|o| o.result.clone().map(StepInput::Memory))
                            .collect::<Option<Vec<_>>>(),
        };
        produced.insert(id, outputs);
        reports.push((id, outcomes.into_iter().map(|o| o.report).collect()));
    }
    Ok(reports)
}
