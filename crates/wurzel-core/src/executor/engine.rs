use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use super::{StepInput, StepOutcome, StepReport};
use crate::constants::{BATCH_FLUSH_SIZE, RUN_ID_ENV};
use crate::errors::ExecutorError;
use crate::middleware::{Middleware, MiddlewareChain, MiddlewareRegistry};
use crate::settings::{ConfigSource, EnvConfigSource};
use crate::step::{StepHandle, TypedHandle, TypedStep};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorOptions {
    /// Superponer `STEPNAME__KEY` como `KEY` al validar settings.
    pub encapsulate_env: bool,
    /// Items por fichero en salidas por batches.
    pub batch_flush_size: usize,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self { encapsulate_env: true,
               batch_flush_size: BATCH_FLUSH_SIZE }
    }
}

/// Lo que el eslabón más interno necesita para ejecutar un step.
pub struct StepRuntime {
    config: Arc<dyn ConfigSource>,
    options: ExecutorOptions,
    run_id: String,
}

impl StepRuntime {
    pub fn config(&self) -> &dyn ConfigSource {
        self.config.as_ref()
    }

    pub fn options(&self) -> &ExecutorOptions {
        &self.options
    }

    /// `WURZEL_RUN_ID` de la configuración o uno local generado.
    pub fn run_id(&self) -> &str {
        &self.run_id
    }
}

fn local_run_id() -> String {
    let short = uuid::Uuid::new_v4().simple().to_string();
    format!("local-{}-{}", chrono::Utc::now().format("%Y%m%d-%H%M%S"), &short[..8])
}

/// Executors con nombre, seleccionables desde la línea de comandos.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorKind {
    Base,
    Prometheus,
}

impl ExecutorKind {
    pub fn name(&self) -> &'static str {
        match self {
            ExecutorKind::Base => "BaseStepExecutor",
            ExecutorKind::Prometheus => "PrometheusStepExecutor",
        }
    }

    /// Middlewares que el executor instala siempre.
    pub fn builtin_middlewares(&self) -> &'static [&'static str] {
        match self {
            ExecutorKind::Base => &[],
            ExecutorKind::Prometheus => &["prometheus"],
        }
    }
}

impl FromStr for ExecutorKind {
    type Err = ExecutorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [ExecutorKind::Base, ExecutorKind::Prometheus].into_iter()
                                                       .find(|k| k.name().eq_ignore_ascii_case(s) || k.name().to_lowercase().starts_with(&s.to_lowercase()))
                                                       .ok_or_else(|| ExecutorError::UnknownExecutor(s.to_string()))
    }
}

/// Executor de steps.
///
/// Los middlewares entran (`enter`) al construirlo y salen (`exit`, en orden
/// inverso) al soltarlo o con `close`, una única vez por executor.
pub struct StepExecutor {
    chain: MiddlewareChain,
    runtime: StepRuntime,
}

/// Builder del executor (config, opciones y middlewares).
pub struct StepExecutorBuilder {
    config: Arc<dyn ConfigSource>,
    options: ExecutorOptions,
    middlewares: Vec<Box<dyn Middleware>>,
    names: Vec<String>,
    registry: MiddlewareRegistry,
}

impl Default for StepExecutorBuilder {
    fn default() -> Self {
        Self { config: Arc::new(EnvConfigSource),
               options: ExecutorOptions::default(),
               middlewares: Vec::new(),
               names: Vec::new(),
               registry: MiddlewareRegistry::default() }
    }
}

impl StepExecutorBuilder {
    #[inline]
    pub fn config(mut self, config: Arc<dyn ConfigSource>) -> Self {
        self.config = config;
        self
    }

    #[inline]
    pub fn options(mut self, options: ExecutorOptions) -> Self {
        self.options = options;
        self
    }

    #[inline]
    pub fn encapsulate_env(mut self, on: bool) -> Self {
        self.options.encapsulate_env = on;
        self
    }

    #[inline]
    pub fn batch_flush_size(mut self, size: usize) -> Self {
        self.options.batch_flush_size = size;
        self
    }

    #[inline]
    pub fn registry(mut self, registry: MiddlewareRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Añade un middleware ya construido (el primero añadido es el más
    /// externo).
    #[inline]
    pub fn middleware(mut self, middleware: Box<dyn Middleware>) -> Self {
        self.middlewares.push(middleware);
        self
    }

    /// Añade middlewares por nombre; se construyen desde el registry en
    /// `build`, detrás de los añadidos con `middleware`.
    pub fn middleware_names<I, N>(mut self, names: I) -> Self
        where I: IntoIterator<Item = N>,
              N: Into<String>
    {
        self.names.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn kind(self, kind: ExecutorKind) -> Self {
        self.middleware_names(kind.builtin_middlewares().iter().copied())
    }

    pub fn build(self) -> Result<StepExecutor, ExecutorError> {
        let mut chain = MiddlewareChain::default();
        for m in self.middlewares {
            chain.push(m);
        }
        for m in self.registry.build(&self.names, self.config.as_ref())? {
            chain.push(m);
        }
        chain.enter_all()?;
        let run_id = self.config.get(RUN_ID_ENV).filter(|v| !v.is_empty()).unwrap_or_else(local_run_id);
        log::debug!("executor ready with middlewares [{}], run id {run_id}", chain.names().join(", "));
        Ok(StepExecutor { chain,
                          runtime: StepRuntime { config: self.config,
                                                 options: self.options,
                                                 run_id } })
    }
}

impl StepExecutor {
    pub fn builder() -> StepExecutorBuilder {
        StepExecutorBuilder::default()
    }

    pub fn runtime(&self) -> &StepRuntime {
        &self.runtime
    }

    pub fn middleware_names(&self) -> Vec<&str> {
        self.chain.names()
    }

    /// Ejecuta `step` a través de la cadena de middlewares.
    pub fn execute(&mut self,
                   step: &dyn StepHandle,
                   inputs: &[StepInput],
                   output_dir: Option<&Path>)
                   -> Result<Vec<StepOutcome>, ExecutorError> {
        let runtime = &self.runtime;
        self.chain.dispatch(&mut |s: &dyn StepHandle, i: &[StepInput], o: Option<&Path>| s.execute(runtime, i, o),
                            step,
                            inputs,
                            output_dir)
    }

    /// Variante tipada de `execute`: devuelve el output en memoria (`None`
    /// para salidas por batches) junto al reporte.
    pub fn execute_step<S: TypedStep>(&mut self,
                                      inputs: &[StepInput],
                                      output_dir: Option<&Path>)
                                      -> Result<Vec<(Option<S::Output>, StepReport)>, ExecutorError> {
        let handle = TypedHandle::<S>::new()?;
        let outcomes = self.execute(&handle, inputs, output_dir)?;
        Ok(outcomes.into_iter()
                   .map(|o| (o.result_as::<S::Output>().cloned(), o.report))
                   .collect())
    }

    /// Libera el executor llamando a `exit` de los middlewares.
    pub fn close(mut self) {
        self.chain.exit_all();
    }
}

impl Drop for StepExecutor {
    fn drop(&mut self) {
        self.chain.exit_all();
    }
}
