//! Grafo de steps.
//!
//! Arena de nodos direccionados por índice (`NodeId`). Cada nodo guarda el
//! conjunto ordenado de nodos de los que depende. Encadenar `A -> B` exige
//! que el output de A sea igual al input de B; los recorridos detectan ciclos
//! con un conjunto de nodos en curso y fallan con `GraphError::Cyclic`.

mod arena;
mod pipeline;
mod runner;

pub use arena::{NodeId, StepGraph, StepNode};
pub use pipeline::{Pipe, SameAs};
pub use runner::run_graph;
