use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexSet;
use serde::Serialize;

use crate::errors::{ChainError, ExecutorError, GraphError};
use crate::settings::ConfigSource;
use crate::step::{handle, StepHandle, TypedStep};

/// Índice estable de un nodo dentro de su grafo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub struct StepNode {
    id: NodeId,
    step: Arc<dyn StepHandle>,
    required: IndexSet<NodeId>,
}

impl StepNode {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn step(&self) -> &dyn StepHandle {
        self.step.as_ref()
    }

    pub fn name(&self) -> &'static str {
        self.step.name()
    }

    /// Dependencias directas en orden de conexión.
    pub fn required(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.required.iter().copied()
    }

    pub fn is_leaf(&self) -> bool {
        self.required.is_empty()
    }
}

#[derive(Default)]
pub struct StepGraph {
    nodes: Vec<StepNode>,
}

impl StepGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Añade un nodo para `S`, validando su firma.
    pub fn add<S: TypedStep>(&mut self) -> Result<NodeId, GraphError> {
        Ok(self.add_handle(handle::<S>()?))
    }

    /// Añade un handle ya validado.
    pub fn add_handle(&mut self, step: Arc<dyn StepHandle>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(StepNode { id,
                                   step,
                                   required: IndexSet::new() });
        id
    }

    pub fn node(&self, id: NodeId) -> Result<&StepNode, GraphError> {
        self.nodes.get(id.0).ok_or(GraphError::UnknownNode(id.0))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &StepNode> {
        self.nodes.iter()
    }

    /// `from` alimenta a `to`. Si los contratos no coinciden no se modifica
    /// nada.
    pub fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), GraphError> {
        let produced = self.node(from)?.step.signature().output.clone();
        let target = self.node(to)?;
        let expected = &target.step.signature().input;
        if *expected != produced {
            return Err(ChainError { from: self.node(from)?.name().to_string(),
                                    to: target.name().to_string(),
                                    produced,
                                    expected: expected.clone() }.into());
        }
        self.nodes[to.0].required.insert(from);
        Ok(())
    }

    /// Encadena `steps` en orden: `a -> b -> c`.
    pub fn chain(&mut self, steps: &[NodeId]) -> Result<(), GraphError> {
        for pair in steps.windows(2) {
            self.connect(pair[0], pair[1])?;
        }
        Ok(())
    }

    /// Nodos alcanzables desde `root` (incluido) en post-orden: cada nodo
    /// aparece después de todas sus dependencias.
    pub fn traverse(&self, root: NodeId) -> Result<Vec<NodeId>, GraphError> {
        let mut done = IndexSet::new();
        let mut on_path = Vec::new();
        self.visit(root, &mut done, &mut on_path)?;
        Ok(done.into_iter().collect())
    }

    fn visit(&self, id: NodeId, done: &mut IndexSet<NodeId>, on_path: &mut Vec<NodeId>) -> Result<(), GraphError> {
        if done.contains(&id) {
            return Ok(());
        }
        if let Some(pos) = on_path.iter().position(|n| *n == id) {
            let mut path: Vec<String> = on_path[pos..].iter()
                                                      .filter_map(|n| self.nodes.get(n.0).map(|node| node.name().to_string()))
                                                      .collect();
            path.push(self.node(id)?.name().to_string());
            return Err(GraphError::Cyclic { path });
        }
        on_path.push(id);
        for dep in self.node(id)?.required() {
            self.visit(dep, done, on_path)?;
        }
        on_path.pop();
        done.insert(id);
        Ok(())
    }

    /// Falla si dos nodos alcanzables comparten nombre de step.
    pub fn ensure_unique_names(&self, root: NodeId) -> Result<(), GraphError> {
        let mut seen = HashSet::new();
        for id in self.traverse(root)? {
            let name = self.node(id)?.name();
            if !seen.insert(name) {
                return Err(GraphError::DuplicateStepName(name.to_string()));
            }
        }
        Ok(())
    }

    /// Valida los settings de todos los steps alcanzables antes de ejecutar
    /// nada. Devuelve todos los errores, no sólo el primero.
    pub fn validate_settings(&self,
                             root: NodeId,
                             source: &dyn ConfigSource,
                             encapsulate: bool)
                             -> Result<Vec<ExecutorError>, GraphError> {
        let mut errors = Vec::new();
        for id in self.traverse(root)? {
            if let Err(e) = self.node(id)?.step.resolve_settings(source, encapsulate) {
                errors.push(e);
            }
        }
        Ok(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::NoInput;
    use crate::errors::StepError;
    use crate::settings::NoSettings;
    use crate::step::StepOutput;
    use crate::{data_model, typed_step};

    data_model!(Doc { text: String });
    data_model!(Other { n: u32 });

    typed_step! { leaf SourceStep { output: Vec<Doc>, run(_me) { vec![] } } }
    typed_step! { step UpperStep { input: Vec<Doc>, output: Vec<Doc>, run(_me, inp) { inp } } }
    typed_step! { step CountStep { input: Vec<Other>, output: Other, run(_me, inp) { Other { n: inp.len() as u32 } } } }

    struct NoOutputStep;
    impl TypedStep for NoOutputStep {
        type Settings = NoSettings;
        type Input = NoInput;
        type Output = Vec<Doc>;
        fn create(_: NoSettings) -> Result<Self, StepError> {
            Ok(Self)
        }
        fn run(&mut self, _: NoInput) -> Result<StepOutput<Vec<Doc>>, StepError> {
            Ok(Vec::new().into())
        }
        fn signature() -> crate::step::StepSignature {
            crate::step::StepSignature::of::<Self>().with_output(crate::contract::ContractDescriptor::Nothing)
        }
    }

    #[test]
    fn connect_compatible_and_traverse() {
        let mut g = StepGraph::new();
        let a = g.add::<SourceStep>().unwrap();
        let b = g.add::<UpperStep>().unwrap();
        g.connect(a, b).unwrap();
        assert_eq!(g.traverse(b).unwrap(), vec![a, b]);
        assert!(g.node(a).unwrap().is_leaf());
        assert!(!g.node(b).unwrap().is_leaf());
    }

    #[test]
    fn connect_incompatible_leaves_graph_untouched() {
        let mut g = StepGraph::new();
        let a = g.add::<SourceStep>().unwrap();
        let c = g.add::<CountStep>().unwrap();
        let err = g.connect(a, c).unwrap_err();
        assert!(matches!(err, GraphError::Chaining(ChainError { ref from, ref to, .. }) if from == "SourceStep" && to == "CountStep"));
        assert!(g.node(c).unwrap().is_leaf());
        assert!(g.node(a).unwrap().is_leaf());
    }

    #[test]
    fn cycle_fails_fast() {
        let mut g = StepGraph::new();
        let a = g.add::<UpperStep>().unwrap();
        let b = g.add::<UpperStep>().unwrap();
        g.connect(a, b).unwrap();
        g.connect(b, a).unwrap();
        let err = g.traverse(b).unwrap_err();
        assert!(matches!(err, GraphError::Cyclic { ref path } if path.len() == 3), "{err}");
        g.connect(a, a).unwrap();
        assert!(matches!(g.traverse(a), Err(GraphError::Cyclic { .. })));
    }

    #[test]
    fn missing_output_is_rejected_at_construction() {
        let mut g = StepGraph::new();
        assert!(matches!(g.add::<NoOutputStep>(), Err(GraphError::Contract(_))));
        assert!(g.is_empty());
    }

    #[test]
    fn duplicate_names_are_detected() {
        let mut g = StepGraph::new();
        let s = g.add::<SourceStep>().unwrap();
        let a = g.add::<UpperStep>().unwrap();
        let b = g.add::<UpperStep>().unwrap();
        g.chain(&[s, a, b]).unwrap();
        assert_eq!(g.ensure_unique_names(b), Err(GraphError::DuplicateStepName("UpperStep".into())));
    }
}
