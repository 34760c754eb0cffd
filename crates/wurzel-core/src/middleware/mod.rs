//! Cadena de middlewares alrededor de la ejecución de steps.
//!
//! Modelo cebolla: el primer middleware añadido es el más externo (su
//! lógica "antes" corre primero y su lógica "después" la última). Cada
//! middleware decide cuándo llamar a `next`; si `next` falla debe propagar
//! el error tras su contabilidad, nunca tragárselo.

mod logging;
mod prometheus;
mod registry;

use std::path::Path;

pub use self::logging::LoggingMiddleware;
pub use self::prometheus::{PrometheusMiddleware, PrometheusSettings};
pub use registry::{MiddlewareFactory, MiddlewareRegistry};

use crate::errors::ExecutorError;
use crate::executor::{StepInput, StepOutcome};
use crate::step::StepHandle;

/// Firma del eslabón más interno (ejecución real del step).
pub type Dispatch<'a> =
    dyn FnMut(&dyn StepHandle, &[StepInput], Option<&Path>) -> Result<Vec<StepOutcome>, ExecutorError> + 'a;

pub trait Middleware: Send {
    fn name(&self) -> &str;

    fn call(&mut self,
            next: Next<'_>,
            step: &dyn StepHandle,
            inputs: &[StepInput],
            output_dir: Option<&Path>)
            -> Result<Vec<StepOutcome>, ExecutorError>;

    /// Una vez por executor, al adquirirlo.
    fn enter(&mut self) -> Result<(), ExecutorError> {
        Ok(())
    }

    /// Una vez por executor, al liberarlo (orden inverso a `enter`).
    fn exit(&mut self) -> Result<(), ExecutorError> {
        Ok(())
    }
}

/// Resto de la cadena a partir de un middleware.
pub struct Next<'a> {
    rest: &'a mut [Box<dyn Middleware>],
    base: &'a mut Dispatch<'a>,
}

impl<'a> Next<'a> {
    pub fn run(self,
               step: &dyn StepHandle,
               inputs: &[StepInput],
               output_dir: Option<&Path>)
               -> Result<Vec<StepOutcome>, ExecutorError> {
        let Next { rest, base } = self;
        match rest.split_first_mut() {
            Some((head, tail)) => head.call(Next { rest: tail, base }, step, inputs, output_dir),
            None => base(step, inputs, output_dir),
        }
    }
}

/// Lista ordenada de middlewares de un executor.
#[derive(Default)]
pub struct MiddlewareChain {
    middlewares: Vec<Box<dyn Middleware>>,
    entered: usize,
}

impl MiddlewareChain {
    pub fn push(&mut self, middleware: Box<dyn Middleware>) {
        self.middlewares.push(middleware);
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.middlewares.iter().map(|m| m.name()).collect()
    }

    pub fn dispatch(&mut self,
                    base: &mut Dispatch<'_>,
                    step: &dyn StepHandle,
                    inputs: &[StepInput],
                    output_dir: Option<&Path>)
                    -> Result<Vec<StepOutcome>, ExecutorError> {
        Next { rest: &mut self.middlewares,
               base }.run(step, inputs, output_dir)
    }

    /// `enter` en orden; si uno falla, los ya entrados salen antes de
    /// devolver el error.
    pub fn enter_all(&mut self) -> Result<(), ExecutorError> {
        for idx in self.entered..self.middlewares.len() {
            if let Err(e) = self.middlewares[idx].enter() {
                self.exit_all();
                return Err(e);
            }
            self.entered = idx + 1;
        }
        Ok(())
    }

    /// `exit` en orden inverso de los middlewares entrados. Idempotente.
    pub fn exit_all(&mut self) {
        for m in self.middlewares[..self.entered].iter_mut().rev() {
            if let Err(e) = m.exit() {
                log::warn!("middleware {} failed on exit: {e}", m.name());
            }
        }
        self.entered = 0;
    }
}
