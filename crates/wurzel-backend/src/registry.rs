//! Selección de backend por nombre.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use wurzel_core::{ConfigSource, ExecutorKind};

use crate::argo::ArgoBackend;
use crate::backend::Backend;
use crate::dvc::DvcBackend;
use crate::errors::BackendError;
use crate::gitlab::GitlabBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Dvc,
    Argo,
    Gitlab,
}

impl BackendKind {
    pub const ALL: [BackendKind; 3] = [BackendKind::Dvc, BackendKind::Argo, BackendKind::Gitlab];

    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::Dvc => "DvcBackend",
            BackendKind::Argo => "ArgoBackend",
            BackendKind::Gitlab => "GitlabBackend",
        }
    }

    fn aliases(&self) -> &'static [&'static str] {
        match self {
            BackendKind::Dvc => &["dvc", "dvcbackend"],
            BackendKind::Argo => &["argo", "argobackend", "argoworkflowbackend"],
            BackendKind::Gitlab => &["gitlab", "gitlabbackend"],
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackendKind {
    type Err = BackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL.into_iter()
                 .find(|k| k.aliases().iter().any(|a| *a == wanted))
                 .ok_or_else(|| BackendError::UnknownBackend { name: s.to_string(),
                                                               available: Self::ALL.iter().map(|k| k.name()).collect::<Vec<_>>().join(", ") })
    }
}

/// Cómo construir un backend: ficheros de values (con nombre de entrada
/// opcional) o, sin ficheros, settings de la configuración ambiente.
#[derive(Debug, Clone, Default)]
pub struct BackendOptions {
    pub values: Vec<PathBuf>,
    pub workflow: Option<String>,
    /// `None` conserva el executor por defecto del backend.
    pub executor: Option<ExecutorKind>,
}

pub fn build_backend(kind: BackendKind, config: &dyn ConfigSource, options: &BackendOptions) -> Result<Box<dyn Backend>, BackendError> {
    let from_values = !options.values.is_empty();
    let name = options.workflow.as_deref();
    log::debug!("building {kind} from {}", if from_values { "values files" } else { "settings" });
    let backend: Box<dyn Backend> = match kind {
        BackendKind::Dvc => {
            let mut b = if from_values { DvcBackend::from_values(&options.values, name)? } else { DvcBackend::from_config(config)? };
            if options.executor.is_some() {
                b.executor = options.executor;
            }
            Box::new(b)
        }
        BackendKind::Argo => {
            let mut b = if from_values { ArgoBackend::from_values(&options.values, name)? } else { ArgoBackend::from_config(config)? };
            if options.executor.is_some() {
                b.executor = options.executor;
            }
            Box::new(b)
        }
        BackendKind::Gitlab => {
            let mut b = if from_values { GitlabBackend::from_values(&options.values, name)? } else { GitlabBackend::from_config(config)? };
            if options.executor.is_some() {
                b.executor = options.executor;
            }
            Box::new(b)
        }
    };
    Ok(backend)
}
