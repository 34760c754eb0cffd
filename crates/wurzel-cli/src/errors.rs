use std::path::PathBuf;

use thiserror::Error;
use wurzel_backend::BackendError;
use wurzel_core::{ContractError, ExecutorError, GraphError};

#[derive(Debug, Error)]
pub enum CliError {
    #[error("unknown step {name:?} (available: {available})")]
    UnknownStep { name: String, available: String },
    #[error("unknown pipeline {name:?} (available: {available})")]
    UnknownPipeline { name: String, available: String },
    #[error("{failed} step(s) have invalid settings")]
    InvalidSettings { failed: usize },
    #[error(transparent)] Executor(#[from] ExecutorError),
    #[error(transparent)] Backend(#[from] BackendError),
    #[error(transparent)] Graph(#[from] GraphError),
    #[error(transparent)] Contract(#[from] ContractError),
    #[error("cannot write {path}: {source}")]
    Write { path: PathBuf, source: std::io::Error },
}
