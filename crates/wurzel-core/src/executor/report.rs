use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

/// Registro de una invocación lógica de un step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub step_name: String,
    pub history: String,
    pub results: usize,
    pub inputs: usize,
    pub time_to_load: Duration,
    pub time_to_execute: Duration,
    pub time_to_save: Duration,
}

/// Resultado en memoria y reporte de una invocación. `result` es `None`
/// para salidas por batches (los datos sólo viven en disco).
#[derive(Clone)]
pub struct StepOutcome {
    pub result: Option<Arc<dyn Any + Send + Sync>>,
    pub report: StepReport,
}

impl StepOutcome {
    pub fn result_as<T: 'static>(&self) -> Option<&T> {
        self.result.as_ref().and_then(|r| r.downcast_ref::<T>())
    }
}

impl std::fmt::Debug for StepOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepOutcome")
         .field("has_result", &self.result.is_some())
         .field("report", &self.report)
         .finish()
    }
}
