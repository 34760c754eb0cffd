use std::marker::PhantomData;

use super::{NodeId, StepGraph};
use crate::errors::GraphError;
use crate::step::TypedStep;

/// Igualdad de tipos comprobada por el compilador: sólo `T: SameAs<T>`.
pub trait SameAs<T> {}
impl<T> SameAs<T> for T {}

/// Constructor de cadenas lineales sobre un `StepGraph`. Encadenar un step
/// cuyo input no es el output del anterior no compila.
///
/// ```ignore
/// let mut graph = StepGraph::new();
/// let root = Pipe::<ReadStep>::start(&mut graph)?.then::<CleanStep>()?.node();
/// ```
pub struct Pipe<'g, S: TypedStep> {
    graph: &'g mut StepGraph,
    last: NodeId,
    _out: PhantomData<fn() -> S>,
}

impl<'g, S: TypedStep> Pipe<'g, S> {
    pub fn start(graph: &'g mut StepGraph) -> Result<Self, GraphError> {
        let last = graph.add::<S>()?;
        Ok(Self { graph,
                  last,
                  _out: PhantomData })
    }

    /// Añade `N` detrás del último nodo (`N::Input` debe ser `S::Output`).
    pub fn then<N>(self) -> Result<Pipe<'g, N>, GraphError>
        where N: TypedStep,
              <N as TypedStep>::Input: SameAs<<S as TypedStep>::Output>
    {
        let next = self.graph.add::<N>()?;
        self.graph.connect(self.last, next)?;
        Ok(Pipe { graph: self.graph,
                  last: next,
                  _out: PhantomData })
    }

    /// Último nodo añadido.
    pub fn node(&self) -> NodeId {
        self.last
    }
}
