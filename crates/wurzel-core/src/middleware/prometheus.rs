//! Métricas Prometheus de la ejecución de steps.
//!
//! Cada instancia tiene su propio `Registry`. Al liberar el executor el
//! registry se codifica en formato texto y se escribe en
//! `PROMETHEUS__TEXTFILE` (textfile collector de node-exporter) o, si no
//! está configurado, se vuelca al log.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use serde::Deserialize;

use super::{Middleware, Next};
use crate::errors::ExecutorError;
use crate::executor::{StepInput, StepOutcome};
use crate::settings::{from_prefixed, ConfigSource};
use crate::step::StepHandle;

const NAME: &str = "prometheus";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE", default)]
pub struct PrometheusSettings {
    /// Fichero donde escribir las métricas al salir.
    pub textfile: Option<PathBuf>,
    /// Valor de la etiqueta constante `job`.
    pub job: String,
}

impl Default for PrometheusSettings {
    fn default() -> Self {
        Self { textfile: None,
               job: "wurzel".to_string() }
    }
}

pub struct PrometheusMiddleware {
    settings: PrometheusSettings,
    registry: Registry,
    steps_started: CounterVec,
    steps_failed: CounterVec,
    step_results: CounterVec,
    step_inputs: CounterVec,
    step_hist_load: HistogramVec,
    step_hist_execute: HistogramVec,
    step_hist_save: HistogramVec,
}

fn metric_error(e: prometheus::Error) -> ExecutorError {
    ExecutorError::middleware(NAME, e)
}

impl PrometheusMiddleware {
    pub fn from_config(config: &dyn ConfigSource) -> Result<Self, ExecutorError> {
        let settings: PrometheusSettings =
            from_prefixed(config, "PROMETHEUS").map_err(|e| ExecutorError::middleware(NAME, e))?;
        Self::new(settings)
    }

    pub fn new(settings: PrometheusSettings) -> Result<Self, ExecutorError> {
        let labels = HashMap::from([("job".to_string(), settings.job.clone())]);
        let registry = Registry::new_custom(None, Some(labels)).map_err(metric_error)?;

        let counter = |name: &str, help: &str, labels: &[&str]| -> Result<CounterVec, ExecutorError> {
            let c = CounterVec::new(Opts::new(name, help), labels).map_err(metric_error)?;
            registry.register(Box::new(c.clone())).map_err(metric_error)?;
            Ok(c)
        };
        let histogram = |name: &str, help: &str| -> Result<HistogramVec, ExecutorError> {
            let h = HistogramVec::new(HistogramOpts::new(name, help), &["step_name", "history"]).map_err(metric_error)?;
            registry.register(Box::new(h.clone())).map_err(metric_error)?;
            Ok(h)
        };

        let steps_started = counter("steps_started", "Steps started", &["step_name"])?;
        let steps_failed = counter("steps_failed", "Steps failed", &["step_name"])?;
        let step_results = counter("step_results", "Results produced", &["step_name", "history"])?;
        let step_inputs = counter("step_inputs", "Inputs consumed", &["step_name", "history"])?;
        let step_hist_load = histogram("step_hist_load", "Seconds spent loading inputs")?;
        let step_hist_execute = histogram("step_hist_execute", "Seconds spent in the step body")?;
        let step_hist_save = histogram("step_hist_save", "Seconds spent persisting outputs")?;

        Ok(Self { settings,
                  registry,
                  steps_started,
                  steps_failed,
                  step_results,
                  step_inputs,
                  step_hist_load,
                  step_hist_execute,
                  step_hist_save })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Métricas actuales en formato de exposición de texto.
    pub fn render(&self) -> Result<String, ExecutorError> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer).map_err(metric_error)?;
        String::from_utf8(buffer).map_err(|e| ExecutorError::middleware(NAME, e))
    }

    fn observe(&self, outcome: &StepOutcome) {
        let r = &outcome.report;
        let labels = [r.step_name.as_str(), r.history.as_str()];
        self.step_results.with_label_values(&labels).inc_by(r.results as f64);
        self.step_inputs.with_label_values(&labels).inc_by(r.inputs as f64);
        self.step_hist_load.with_label_values(&labels).observe(r.time_to_load.as_secs_f64());
        self.step_hist_execute.with_label_values(&labels).observe(r.time_to_execute.as_secs_f64());
        self.step_hist_save.with_label_values(&labels).observe(r.time_to_save.as_secs_f64());
    }
}

impl Middleware for PrometheusMiddleware {
    fn name(&self) -> &str {
        NAME
    }

    fn call(&mut self,
            next: Next<'_>,
            step: &dyn StepHandle,
            inputs: &[StepInput],
            output_dir: Option<&Path>)
            -> Result<Vec<StepOutcome>, ExecutorError> {
        self.steps_started.with_label_values(&[step.name()]).inc();
        match next.run(step, inputs, output_dir) {
            Ok(outcomes) => {
                outcomes.iter().for_each(|o| self.observe(o));
                Ok(outcomes)
            }
            Err(e) => {
                self.steps_failed.with_label_values(&[step.name()]).inc();
                Err(e)
            }
        }
    }

    fn exit(&mut self) -> Result<(), ExecutorError> {
        let text = self.render()?;
        match &self.settings.textfile {
            Some(path) => {
                fs::write(path, text).map_err(|e| ExecutorError::io(path, e))?;
                log::info!("metrics written to {}", path.display());
            }
            None => log::info!("metrics:\n{text}"),
        }
        Ok(())
    }
}
