//! Errores del core.
//!
//! La taxonomía separa errores estáticos (contratos mal declarados o
//! incompatibles, detectados al construir el grafo) de errores de ejecución
//! (settings inválidos, fallos del cuerpo del step, finalize).

use std::path::PathBuf;

use thiserror::Error;

use crate::contract::ContractDescriptor;
use crate::step::OutputMode;

/// Errores de contrato: declaraciones mal formadas y fallos de persistencia.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ContractError {
    #[error("unsupported contract declaration: {0}")] Unsupported(String),
    #[error("step {step} declares no output contract")] MissingOutput { step: String },
    #[error("step {step}: run body {part} is {found} but {declared} was declared")]
    BodyMismatch { step: String,
                   part: &'static str,
                   found: ContractDescriptor,
                   declared: ContractDescriptor },
    #[error("step {step} streams batches but {output} is not a collection contract")]
    BatchedSingle { step: String, output: ContractDescriptor },
    #[error("expected exactly one {model}, found {found}")] Cardinality { model: String, found: usize },
    #[error("{model} failed validation: {message}")] Validation { model: String, message: String },
    #[error("could not decode {path}: {message}")] Decode { path: PathBuf, message: String },
    #[error("could not encode {path}: {message}")] Encode { path: PathBuf, message: String },
    #[error("io error on {path}: {message}")] Io { path: PathBuf, message: String },
}

impl ContractError {
    pub(crate) fn io(path: &std::path::Path, err: std::io::Error) -> Self {
        ContractError::Io { path: path.to_path_buf(),
                            message: err.to_string() }
    }
}

/// `A -> B` con contratos incompatibles. Lleva ambos descriptores para
/// diagnóstico.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[error("cannot chain {from} -> {to}: {from} produces {produced}, {to} expects {expected}")]
pub struct ChainError {
    pub from: String,
    pub to: String,
    pub produced: ContractDescriptor,
    pub expected: ContractDescriptor,
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum GraphError {
    #[error(transparent)] Chaining(#[from] ChainError),
    #[error(transparent)] Contract(#[from] ContractError),
    #[error("unknown node #{0}")] UnknownNode(usize),
    #[error("cyclic pipeline: {}", path.join(" -> "))] Cyclic { path: Vec<String> },
    #[error("step {0} appears more than once in the pipeline")] DuplicateStepName(String),
}

/// Los settings del step no validan contra la configuración ambiente.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[error("settings {label} are invalid: {message}")]
pub struct SettingsError {
    pub label: String,
    pub message: String,
}

/// Fallos emitidos por el cuerpo de un step.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("{0}")] Message(String),
    #[error("all {failed} of {total} items failed")] PartialFailure { failed: usize, total: usize },
    #[error(transparent)] Contract(#[from] ContractError),
    #[error(transparent)] Settings(#[from] SettingsError),
    #[error(transparent)] Io(#[from] std::io::Error),
    #[error(transparent)] Other(Box<dyn std::error::Error + Send + Sync>),
}

impl StepError {
    pub fn msg(message: impl Into<String>) -> Self {
        StepError::Message(message.into())
    }

    pub fn other<E>(err: E) -> Self
        where E: std::error::Error + Send + Sync + 'static
    {
        StepError::Other(Box::new(err))
    }
}

/// Errores del executor. `EnvSettings` es distinguible de un fallo de lógica
/// (`StepFailed`) para que el llamador sepa si la configuración es la causa.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("environment settings error in {step}: {source}")]
    EnvSettings { step: String, source: SettingsError },
    #[error("step {step} failed: {source}")]
    StepFailed { step: String, source: StepError },
    #[error("finalize of {step} failed: {source}")]
    FinalizeFailed { step: String, source: StepError },
    #[error("step {step} failed: {source}; finalize failed too: {finalize}")]
    StepAndFinalizeFailed { step: String,
                            source: StepError,
                            finalize: StepError },
    #[error("step {step} requires input but none was provided")] MissingInput { step: String },
    #[error("step {step} takes no input but {count} were provided")] UnexpectedInput { step: String, count: usize },
    #[error("step {step} received an in-memory input that is not {expected}")]
    InputType { step: String, expected: ContractDescriptor },
    #[error("step {step} declares {declared} output but returned {returned}")]
    OutputModeMismatch { step: String,
                         declared: OutputMode,
                         returned: OutputMode },
    #[error("batched output of {step} only lives on disk; run with an output directory")]
    BatchedInMemory { step: String },
    #[error("unknown executor {0}")] UnknownExecutor(String),
    #[error("middleware {name}: {message}")] Middleware { name: String, message: String },
    #[error(transparent)] Contract(#[from] ContractError),
    #[error(transparent)] Graph(#[from] GraphError),
    #[error("io error on {path}: {source}")] Io { path: PathBuf, source: std::io::Error },
}

impl ExecutorError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        ExecutorError::Io { path: path.to_path_buf(),
                            source }
    }

    pub(crate) fn middleware(name: &str, message: impl std::fmt::Display) -> Self {
        ExecutorError::Middleware { name: name.to_string(),
                                    message: message.to_string() }
    }
}
