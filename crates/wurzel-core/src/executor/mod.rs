//! Motor de ejecución de steps.
//!
//! `StepExecutor::execute` ensambla los inputs, pasa por la cadena de
//! middlewares y ejecuta el step: settings aislados, cuerpo, persistencia
//! (entera o por batches), finalize y un `StepReport` por invocación.
//!
//! Modelo: síncrono y de un solo hilo por executor. Con `EnvConfigSource`
//! la configuración es el entorno del proceso; dos executors concurrentes
//! en el mismo proceso sobre él no están soportados.

mod batch;
mod engine;
mod input;
mod report;
pub(crate) mod run;

pub use engine::{ExecutorKind, ExecutorOptions, StepExecutor, StepExecutorBuilder, StepRuntime};
pub use input::{discover_files, StepInput};
pub use report::{StepOutcome, StepReport};
