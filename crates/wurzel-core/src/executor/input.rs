//! Ensamblado de inputs: ubicaciones en disco o valores en memoria.

use std::any::Any;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::contract::Contract;
use crate::errors::ExecutorError;
use crate::history::History;

/// Un input de `execute`.
#[derive(Clone)]
pub enum StepInput {
    /// Directorio (o fichero) con salidas persistidas de otro step.
    Location(PathBuf),
    /// Valor ya construido; debe ser exactamente el contrato de input.
    Memory(Arc<dyn Any + Send + Sync>),
}

impl StepInput {
    pub fn location(path: impl Into<PathBuf>) -> Self {
        StepInput::Location(path.into())
    }

    pub fn memory<T: Contract>(value: T) -> Self {
        StepInput::Memory(Arc::new(value))
    }
}

impl std::fmt::Debug for StepInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepInput::Location(p) => f.debug_tuple("Location").field(p).finish(),
            StepInput::Memory(_) => f.write_str("Memory(..)"),
        }
    }
}

/// Ficheros con extensión `ext` bajo `location`, ordenados por ruta. Una
/// ubicación que es un fichero se usa tal cual.
pub fn discover_files(location: &Path, ext: &str) -> Result<Vec<PathBuf>, ExecutorError> {
    if location.is_file() {
        return Ok(vec![location.to_path_buf()]);
    }
    let entries = fs::read_dir(location).map_err(|e| ExecutorError::io(location, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| ExecutorError::io(location, e))?.path();
        if path.is_file() && path.extension().and_then(|x| x.to_str()) == Some(ext) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Una invocación lógica preparada.
pub(crate) struct LoadedInput<T> {
    pub history: History,
    pub value: T,
    pub load_time: Duration,
}

/// Prepara las invocaciones de un step con input `T`: una por ubicación o
/// valor en memoria, o una sola con input vacío para steps hoja.
pub(crate) fn assemble<T: Contract>(step: &str, inputs: &[StepInput]) -> Result<Vec<LoadedInput<T>>, ExecutorError> {
    let descriptor = T::descriptor();
    if descriptor.is_nothing() {
        if !inputs.is_empty() {
            return Err(ExecutorError::UnexpectedInput { step: step.to_string(),
                                                        count: inputs.len() });
        }
        return Ok(vec![LoadedInput { history: History::new(),
                                     value: T::from_items(Vec::new())?,
                                     load_time: Duration::ZERO }]);
    }
    if inputs.is_empty() {
        return Err(ExecutorError::MissingInput { step: step.to_string() });
    }

    let ext = descriptor.file_extension();
    let mut out = Vec::with_capacity(inputs.len());
    for input in inputs {
        let started = Instant::now();
        let loaded = match input {
            StepInput::Memory(value) => {
                let value = value.downcast_ref::<T>()
                                 .ok_or_else(|| ExecutorError::InputType { step: step.to_string(),
                                                                           expected: descriptor.clone() })?;
                LoadedInput { history: History::memory(),
                              value: value.clone(),
                              load_time: Duration::ZERO }
            }
            StepInput::Location(location) => {
                let files = discover_files(location, ext)?;
                let history = match files.first().and_then(|f| f.file_stem()).and_then(|s| s.to_str()) {
                    Some(stem) => History::from_file_stem(stem),
                    None => location.file_name()
                                    .and_then(|n| n.to_str())
                                    .map(|n| History::new().with(n))
                                    .unwrap_or_default(),
                };
                log::debug!("loading {} file(s) from {}", files.len(), location.display());
                LoadedInput { history,
                              value: T::load(&files)?,
                              load_time: Duration::ZERO }
            }
        };
        out.push(LoadedInput { load_time: started.elapsed(),
                               ..loaded });
    }
    Ok(out)
}
