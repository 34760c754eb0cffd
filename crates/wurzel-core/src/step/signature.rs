//! Firma explícita de un step.
//!
//! Los tres descriptores (settings, input, output) y el modo de salida se
//! registran de forma explícita y se validan al construir el nodo. Un step
//! mal declarado no llega nunca a formar parte de un grafo.

use serde::Serialize;

use super::{OutputMode, TypedStep};
use crate::contract::{Contract, ContractDescriptor};
use crate::errors::ContractError;
use crate::settings::Settings;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepSignature {
    pub name: &'static str,
    pub type_path: &'static str,
    /// Nombre del tipo de settings, `None` si el step no tiene.
    pub settings: Option<&'static str>,
    pub input: ContractDescriptor,
    pub output: ContractDescriptor,
    pub mode: OutputMode,
}

impl StepSignature {
    /// Firma derivada de los tipos asociados del step.
    pub fn of<S: TypedStep>() -> Self {
        Self { name: S::name(),
               type_path: std::any::type_name::<S>(),
               settings: <S::Settings as Settings>::label(),
               input: <S::Input as Contract>::descriptor(),
               output: <S::Output as Contract>::descriptor(),
               mode: S::OUTPUT_MODE }
    }

    #[inline]
    pub fn with_output(mut self, output: ContractDescriptor) -> Self {
        self.output = output;
        self
    }

    /// Validación estática de la declaración (sin mirar el cuerpo).
    pub fn validate(&self) -> Result<(), ContractError> {
        self.input.unpack()?;
        let output = self.output.unpack()?;
        if output.base.is_none() {
            return Err(ContractError::MissingOutput { step: self.name.to_string() });
        }
        if self.mode == OutputMode::Batched && output.container.is_none() {
            return Err(ContractError::BatchedSingle { step: self.name.to_string(),
                                                      output: self.output.clone() });
        }
        Ok(())
    }

    /// Valida la declaración y comprueba que coincide con la forma real del
    /// cuerpo del step `S`.
    pub fn check_against<S: TypedStep>(&self) -> Result<(), ContractError> {
        self.validate()?;
        let body = Self::of::<S>();
        if body.input != self.input {
            return Err(ContractError::BodyMismatch { step: self.name.to_string(),
                                                     part: "input",
                                                     found: body.input,
                                                     declared: self.input.clone() });
        }
        if body.output != self.output {
            return Err(ContractError::BodyMismatch { step: self.name.to_string(),
                                                     part: "output",
                                                     found: body.output,
                                                     declared: self.output.clone() });
        }
        Ok(())
    }
}
