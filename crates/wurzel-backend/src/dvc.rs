//! Backend DVC: un `dvc.yaml` con un stage por step.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use wurzel_core::constants::RUN_ID_ENV;
use wurzel_core::settings::from_prefixed;
use wurzel_core::{ConfigSource, ExecutorKind, NodeId, StepGraph};

use crate::backend::Backend;
use crate::errors::BackendError;
use crate::lowering::{lower, LoweringOptions};
use crate::values::{load_values, select};

/// Prefijo de settings en la configuración ambiente.
pub const SETTINGS_PREFIX: &str = "DVCBACKEND";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DvcConfig {
    #[serde(alias = "DATA_DIR")]
    pub data_dir: PathBuf,
    #[serde(alias = "ENCAPSULATE_ENV")]
    pub encapsulate_env: bool,
    /// Código de los steps (binario `wurzel`, fuentes): se añade a los
    /// `deps` de cada stage para que `dvc repro` lo relance al cambiar.
    #[serde(alias = "CODE_DEPS")]
    pub code_deps: Vec<PathBuf>,
}

impl Default for DvcConfig {
    fn default() -> Self {
        Self { data_dir: PathBuf::from("./data"),
               encapsulate_env: true,
               code_deps: Vec::new() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DvcStage {
    pub cmd: String,
    pub deps: Vec<String>,
    pub outs: Vec<String>,
    pub always_changed: bool,
}

#[derive(Serialize)]
struct DvcFile<'a> {
    stages: &'a IndexMap<String, DvcStage>,
}

/// Sin `WURZEL_RUN_ID` en el entorno de `dvc repro`, cada stage usa un id
/// local basado en la hora y el pid.
fn run_id_prefix() -> String {
    format!("{RUN_ID_ENV}=${{{RUN_ID_ENV}:-dvc-$(date +%Y%m%d-%H%M%S)-$$}}")
}

fn as_posix(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[derive(Debug, Clone)]
pub struct DvcBackend {
    pub config: DvcConfig,
    pub executor: Option<ExecutorKind>,
}

impl Default for DvcBackend {
    fn default() -> Self {
        Self::new(DvcConfig::default())
    }
}

impl DvcBackend {
    pub fn new(config: DvcConfig) -> Self {
        Self { config,
               executor: Some(ExecutorKind::Prometheus) }
    }

    pub fn with_executor(mut self, executor: Option<ExecutorKind>) -> Self {
        self.executor = executor;
        self
    }

    /// `DVCBACKEND__DATA_DIR`, `DVCBACKEND__ENCAPSULATE_ENV`, `DVCBACKEND__CODE_DEPS`.
    pub fn from_config(config: &dyn ConfigSource) -> Result<Self, BackendError> {
        Ok(Self::new(from_prefixed(config, SETTINGS_PREFIX)?))
    }

    /// Sección `dvc` de los ficheros de values.
    pub fn from_values(files: &[PathBuf], name: Option<&str>) -> Result<Self, BackendError> {
        let values = load_values(files)?;
        Ok(Self::new(select(&values, "dvc", name)?))
    }

    fn options(&self) -> LoweringOptions {
        LoweringOptions { data_dir: self.config.data_dir.clone(),
                          executor: self.executor,
                          encapsulate_env: self.config.encapsulate_env }
    }

    /// Stages por nombre de step, dependencias primero.
    pub fn generate_dict(&self, graph: &StepGraph, root: NodeId) -> Result<IndexMap<String, DvcStage>, BackendError> {
        let lowered = lower(graph, root, &self.options())?;
        let prefix = run_id_prefix();
        Ok(lowered.iter()
                  .map(|d| {
                      (d.name.to_string(),
                       DvcStage { cmd: format!("{prefix} {}", d.command),
                                  deps: d.deps.iter().chain(&self.config.code_deps).map(|p| as_posix(p)).collect(),
                                  outs: vec![as_posix(&d.output)],
                                  always_changed: d.always_changed })
                  })
                  .collect())
    }
}

impl Backend for DvcBackend {
    fn name(&self) -> &'static str {
        "DvcBackend"
    }

    fn generate_artifact(&self, graph: &StepGraph, root: NodeId) -> Result<String, BackendError> {
        let stages = self.generate_dict(graph, root)?;
        Ok(serde_yaml::to_string(&DvcFile { stages: &stages })?)
    }
}
