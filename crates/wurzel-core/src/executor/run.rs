//! Ejecución de un `TypedStep` concreto (eslabón más interno de la cadena).

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::batch::BatchWriter;
use super::input::assemble;
use super::{StepInput, StepOutcome, StepReport, StepRuntime};
use crate::context::{CorrelationScope, HistoryScope};
use crate::contract::Contract;
use crate::errors::{ExecutorError, StepError};
use crate::settings::{prefixed_view, ConfigSource, Settings};
use crate::step::{settings_prefix, StepOutput, TypedStep};

/// Valida los settings de `S` dentro del scope de aislamiento.
///
/// Con `encapsulate`, las claves `STEPNAME__KEY` se superponen como `KEY`
/// sólo mientras dura la validación; el guard restaura la configuración en
/// cualquier salida.
pub(crate) fn resolve_settings<S: TypedStep>(source: &dyn ConfigSource, encapsulate: bool) -> Result<S::Settings, ExecutorError> {
    let resolved = if encapsulate {
        let overlay = prefixed_view(&source.snapshot(), &settings_prefix(S::name()));
        let _guard = source.overlay(&overlay);
        <S::Settings as Settings>::from_snapshot(&source.snapshot())
    } else {
        <S::Settings as Settings>::from_snapshot(&source.snapshot())
    };
    resolved.map_err(|source| ExecutorError::EnvSettings { step: S::name().to_string(),
                                                           source })
}

pub(crate) fn execute_typed<S: TypedStep>(runtime: &StepRuntime,
                                          inputs: &[StepInput],
                                          output_dir: Option<&Path>)
                                          -> Result<Vec<StepOutcome>, ExecutorError> {
    let name = S::name();
    let _correlation = CorrelationScope::enter(name);
    log::info!("[{name}] run {} starting with {} input(s)", runtime.run_id(), inputs.len());

    if let Some(dir) = output_dir {
        fs::create_dir_all(dir).map_err(|e| ExecutorError::io(dir, e))?;
    }
    let settings = resolve_settings::<S>(runtime.config(), runtime.options().encapsulate_env)?;
    let mut step = S::create(settings).map_err(|source| ExecutorError::StepFailed { step: name.to_string(),
                                                                                     source })?;

    let outcome = run_invocations(&mut step, runtime, inputs, output_dir);
    let finalized = step.finalize();
    match (outcome, finalized) {
        (Ok(outcomes), Ok(())) => Ok(outcomes),
        (Ok(_), Err(source)) => Err(ExecutorError::FinalizeFailed { step: name.to_string(),
                                                                    source }),
        (Err(ExecutorError::StepFailed { step, source }), Err(finalize)) => {
            Err(ExecutorError::StepAndFinalizeFailed { step,
                                                       source,
                                                       finalize })
        }
        (Err(err), Err(finalize)) => {
            log::error!("[{name}] finalize failed after an earlier error: {finalize}");
            Err(err)
        }
        (Err(err), Ok(())) => Err(err),
    }
}

fn run_invocations<S: TypedStep>(step: &mut S,
                                 runtime: &StepRuntime,
                                 inputs: &[StepInput],
                                 output_dir: Option<&Path>)
                                 -> Result<Vec<StepOutcome>, ExecutorError> {
    let name = S::name();
    let invocations = assemble::<S::Input>(name, inputs)?;
    let mut outcomes = Vec::with_capacity(invocations.len());

    for loaded in invocations {
        let history = loaded.history.with(name);
        let _lineage = HistoryScope::enter(history.clone());
        let input_count = loaded.value.count();
        let failed = |source: StepError| ExecutorError::StepFailed { step: name.to_string(),
                                                          source };

        let started = Instant::now();
        let output = step.run(loaded.value).map_err(failed)?;
        if output.mode() != S::OUTPUT_MODE {
            return Err(ExecutorError::OutputModeMismatch { step: name.to_string(),
                                                           declared: S::OUTPUT_MODE,
                                                           returned: output.mode() });
        }

        let (result, results, time_to_execute, time_to_save) = match output {
            StepOutput::Whole(value) => {
                let time_to_execute = started.elapsed();
                let results = value.count();
                let mut time_to_save = Duration::ZERO;
                if let Some(dir) = output_dir {
                    let saving = Instant::now();
                    let path = value.save(&dir.join(history.to_string()))?;
                    time_to_save = saving.elapsed();
                    log::debug!("[{name}] saved {}", path.display());
                }
                (Some(Arc::new(value) as Arc<dyn std::any::Any + Send + Sync>), results, time_to_execute, time_to_save)
            }
            StepOutput::Batches(batches) => {
                let mut writer = BatchWriter::<S::Output>::new(output_dir, history.to_string(), runtime.options().batch_flush_size);
                for batch in batches {
                    writer.push(batch.map_err(failed)?)?;
                }
                let summary = writer.finish()?;
                log::debug!("[{name}] wrote {} batch file(s)", summary.files.len());
                let total = started.elapsed();
                (None, summary.results, total.saturating_sub(summary.save_time), summary.save_time)
            }
        };

        let report = StepReport { step_name: name.to_string(),
                                  history: history.to_string(),
                                  results,
                                  inputs: input_count,
                                  time_to_load: loaded.load_time,
                                  time_to_execute,
                                  time_to_save };
        log::info!("[{name}] {} produced {} result(s) from {} input(s)", report.history, report.results, report.inputs);
        outcomes.push(StepOutcome { result, report });
    }
    Ok(outcomes)
}
