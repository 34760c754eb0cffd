//! Vista sin tipos de un step.
//!
//! El grafo, la cadena de middlewares y los backends trabajan con
//! `dyn StepHandle`; `TypedHandle<S>` conecta esa vista con el `TypedStep`
//! concreto.

use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;

use super::{StepSignature, TypedStep};
use crate::errors::{ContractError, ExecutorError};
use crate::executor::{run, StepInput, StepOutcome, StepRuntime};
use crate::settings::ConfigSource;

pub trait StepHandle: Send + Sync {
    fn signature(&self) -> &StepSignature;

    fn name(&self) -> &'static str {
        self.signature().name
    }

    fn type_path(&self) -> &'static str {
        self.signature().type_path
    }

    /// Valida los settings del step contra `source` sin ejecutarlo.
    fn resolve_settings(&self, source: &dyn ConfigSource, encapsulate: bool) -> Result<(), ExecutorError>;

    /// Ejecuta el step (carga, run, guardado). Llamado por la cadena de
    /// middlewares como eslabón más interno.
    fn execute(&self,
               runtime: &StepRuntime,
               inputs: &[StepInput],
               output_dir: Option<&Path>)
               -> Result<Vec<StepOutcome>, ExecutorError>;
}

pub struct TypedHandle<S> {
    signature: StepSignature,
    _step: PhantomData<fn() -> S>,
}

impl<S: TypedStep> TypedHandle<S> {
    /// Construye el handle comprobando la firma declarada contra el cuerpo.
    pub fn new() -> Result<Self, ContractError> {
        let signature = S::signature();
        signature.check_against::<S>()?;
        Ok(Self { signature,
                  _step: PhantomData })
    }
}

impl<S: TypedStep> StepHandle for TypedHandle<S> {
    fn signature(&self) -> &StepSignature {
        &self.signature
    }

    fn resolve_settings(&self, source: &dyn ConfigSource, encapsulate: bool) -> Result<(), ExecutorError> {
        run::resolve_settings::<S>(source, encapsulate).map(|_| ())
    }

    fn execute(&self,
               runtime: &StepRuntime,
               inputs: &[StepInput],
               output_dir: Option<&Path>)
               -> Result<Vec<StepOutcome>, ExecutorError> {
        run::execute_typed::<S>(runtime, inputs, output_dir)
    }
}

/// Atajo: handle compartible de `S`.
pub fn handle<S: TypedStep>() -> Result<Arc<dyn StepHandle>, ContractError> {
    Ok(Arc::new(TypedHandle::<S>::new()?))
}
