//! Paso de generación: grafo de steps -> descriptores de artefacto.
//!
//! Cada nodo se resuelve una sola vez por pasada (memo por `NodeId`), con
//! sus dependencias antes que él. Un diamante produce un único descriptor
//! para el nodo compartido, referenciado por todos sus dependientes.

use std::path::PathBuf;

use indexmap::IndexMap;
use wurzel_core::{ExecutorKind, GraphError, NodeId, StepGraph};

use crate::cli_call::{generate_cli_call, CliCall};
use crate::errors::BackendError;

/// Opciones comunes a todos los backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoweringOptions {
    pub data_dir: PathBuf,
    pub executor: Option<ExecutorKind>,
    pub encapsulate_env: bool,
}

impl Default for LoweringOptions {
    fn default() -> Self {
        Self { data_dir: PathBuf::from("./data"),
               executor: Some(ExecutorKind::Prometheus),
               encapsulate_env: true }
    }
}

/// Lo que un backend necesita saber de un nodo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactDescriptor {
    pub node: NodeId,
    pub name: &'static str,
    pub command: CliCall,
    /// `data_dir/StepName`.
    pub output: PathBuf,
    /// Salidas de las dependencias, en orden de declaración.
    pub deps: Vec<PathBuf>,
    /// Nombres de las dependencias, en el mismo orden.
    pub needs: Vec<&'static str>,
    /// Hojas: sin clave de caché derivada de dependencias.
    pub always_changed: bool,
}

/// Resultado de una pasada, en post-orden.
#[derive(Debug, Clone)]
pub struct Lowered {
    descriptors: IndexMap<NodeId, ArtifactDescriptor>,
}

impl Lowered {
    pub fn iter(&self) -> impl Iterator<Item = &ArtifactDescriptor> {
        self.descriptors.values()
    }

    pub fn get(&self, node: NodeId) -> Option<&ArtifactDescriptor> {
        self.descriptors.get(&node)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

struct Pass<'a> {
    graph: &'a StepGraph,
    options: &'a LoweringOptions,
    memo: IndexMap<NodeId, ArtifactDescriptor>,
    on_path: Vec<NodeId>,
}

impl Pass<'_> {
    fn resolve(&mut self, id: NodeId) -> Result<PathBuf, BackendError> {
        let graph = self.graph;
        if let Some(done) = self.memo.get(&id) {
            return Ok(done.output.clone());
        }
        if let Some(pos) = self.on_path.iter().position(|n| *n == id) {
            let mut path = Vec::with_capacity(self.on_path.len() - pos + 1);
            for n in &self.on_path[pos..] {
                path.push(graph.node(*n)?.name().to_string());
            }
            path.push(graph.node(id)?.name().to_string());
            return Err(GraphError::Cyclic { path }.into());
        }

        let node = graph.node(id)?;
        self.on_path.push(id);
        let mut deps = Vec::new();
        let mut needs = Vec::new();
        for dep in node.required() {
            deps.push(self.resolve(dep)?);
            needs.push(graph.node(dep)?.name());
        }
        self.on_path.pop();

        let output = self.options.data_dir.join(node.name());
        let command = generate_cli_call(node.step(), &deps, &output, self.options.executor, self.options.encapsulate_env);
        log::debug!("lowered {} -> {}", node.name(), output.display());
        self.memo.insert(id,
                         ArtifactDescriptor { node: id,
                                              name: node.name(),
                                              command,
                                              output: output.clone(),
                                              always_changed: deps.is_empty(),
                                              deps,
                                              needs });
        Ok(output)
    }
}

/// Resuelve todos los nodos alcanzables desde `root`.
///
/// Los nombres de step deben ser únicos: de ellos salen las rutas de
/// salida y los nombres de tarea.
pub fn lower(graph: &StepGraph, root: NodeId, options: &LoweringOptions) -> Result<Lowered, BackendError> {
    let mut pass = Pass { graph,
                          options,
                          memo: IndexMap::new(),
                          on_path: Vec::new() };
    pass.resolve(root)?;
    graph.ensure_unique_names(root)?;
    Ok(Lowered { descriptors: pass.memo })
}
