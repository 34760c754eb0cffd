use std::path::Path;
use std::time::Instant;

use super::{Middleware, Next};
use crate::errors::ExecutorError;
use crate::executor::{StepInput, StepOutcome};
use crate::step::StepHandle;

/// Registra inicio, reportes y fallos de cada step.
#[derive(Debug, Default)]
pub struct LoggingMiddleware {
    executed: usize,
    failed: usize,
}

impl Middleware for LoggingMiddleware {
    fn name(&self) -> &str {
        "logging"
    }

    fn call(&mut self,
            next: Next<'_>,
            step: &dyn StepHandle,
            inputs: &[StepInput],
            output_dir: Option<&Path>)
            -> Result<Vec<StepOutcome>, ExecutorError> {
        let started = Instant::now();
        log::info!("step {} started ({} input(s))", step.name(), inputs.len());
        match next.run(step, inputs, output_dir) {
            Ok(outcomes) => {
                self.executed += 1;
                for o in &outcomes {
                    let r = &o.report;
                    log::info!("step {} [{}]: results={} inputs={} load={:?} execute={:?} save={:?}",
                               r.step_name, r.history, r.results, r.inputs, r.time_to_load, r.time_to_execute, r.time_to_save);
                }
                log::info!("step {} finished in {:?}", step.name(), started.elapsed());
                Ok(outcomes)
            }
            Err(e) => {
                self.failed += 1;
                log::error!("step {} failed after {:?}: {e}", step.name(), started.elapsed());
                Err(e)
            }
        }
    }

    fn exit(&mut self) -> Result<(), ExecutorError> {
        log::info!("executor released: {} step(s) executed, {} failed", self.executed, self.failed);
        Ok(())
    }
}
