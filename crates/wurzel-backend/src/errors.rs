use std::path::PathBuf;

use thiserror::Error;
use wurzel_core::{GraphError, SettingsError};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("unknown backend {name} (available: {available})")]
    UnknownBackend { name: String, available: String },
    #[error("{section} entry '{name}' not found in values")]
    NotFound { section: String, name: String },
    #[error("values file {path}: {message}")]
    ValuesFile { path: PathBuf, message: String },
    #[error("invalid value for {key}: {message}")]
    InvalidSetting { key: String, message: String },
    #[error(transparent)] Settings(#[from] SettingsError),
    #[error(transparent)] Graph(#[from] GraphError),
    #[error("could not serialize manifest: {0}")] Yaml(#[from] serde_yaml::Error),
    #[error("io error on {path}: {source}")] Io { path: PathBuf, source: std::io::Error },
}

impl BackendError {
    pub(crate) fn values(path: &std::path::Path, message: impl std::fmt::Display) -> Self {
        BackendError::ValuesFile { path: path.to_path_buf(),
                                   message: message.to_string() }
    }
}
