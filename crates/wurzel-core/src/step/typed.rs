use std::fmt;

use serde::Serialize;

use super::{short_type_name, StepSignature};
use crate::contract::Contract;
use crate::errors::StepError;
use crate::settings::Settings;

/// Forma en que un step entrega su resultado. Es una capacidad declarada por
/// el implementador, no se infiere de la forma del cuerpo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Un único valor.
    Whole,
    /// Secuencia perezosa de batches parciales, persistidos como ficheros
    /// numerados.
    Batched,
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputMode::Whole => f.write_str("whole"),
            OutputMode::Batched => f.write_str("batched"),
        }
    }
}

/// Resultado de una invocación del cuerpo del step.
pub enum StepOutput<T> {
    Whole(T),
    Batches(Box<dyn Iterator<Item = Result<T, StepError>>>),
}

impl<T> StepOutput<T> {
    pub fn batches<I>(batches: I) -> Self
        where I: IntoIterator<Item = Result<T, StepError>>,
              I::IntoIter: 'static
    {
        StepOutput::Batches(Box::new(batches.into_iter()))
    }

    pub fn mode(&self) -> OutputMode {
        match self {
            StepOutput::Whole(_) => OutputMode::Whole,
            StepOutput::Batches(_) => OutputMode::Batched,
        }
    }
}

impl<T> From<T> for StepOutput<T> {
    fn from(value: T) -> Self {
        StepOutput::Whole(value)
    }
}

/// Interfaz de alto nivel para definir Steps con tipos fuertes
/// (Settings / Input / Output).
///
/// El executor construye el step con `create` a partir de settings ya
/// validados, llama a `run` una vez por invocación lógica y a `finalize`
/// al terminar, tanto si `run` tuvo éxito como si falló.
pub trait TypedStep: Sized + 'static {
    /// Settings del step (`NoSettings` si no tiene).
    type Settings: Settings;
    /// Contrato de entrada (`NoInput` para steps hoja).
    type Input: Contract;
    /// Contrato de salida. Nunca vacío.
    type Output: Contract;

    /// `Batched` si `run` devuelve `StepOutput::Batches`.
    const OUTPUT_MODE: OutputMode = OutputMode::Whole;

    fn create(settings: Self::Settings) -> Result<Self, StepError>;

    fn run(&mut self, input: Self::Input) -> Result<StepOutput<Self::Output>, StepError>;

    /// Hook de limpieza opcional.
    fn finalize(&mut self) -> Result<(), StepError> {
        Ok(())
    }

    /// Nombre del step (nombre corto del tipo).
    fn name() -> &'static str {
        short_type_name(std::any::type_name::<Self>())
    }

    /// Descriptores declarados. Por defecto se derivan de los tipos
    /// asociados; un override se contrasta con ellos al construir el nodo.
    fn signature() -> StepSignature {
        StepSignature::of::<Self>()
    }
}
