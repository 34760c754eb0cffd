mod common;

use std::sync::atomic::{AtomicUsize, Ordering};

use common::*;
use serde::Deserialize;
use wurzel_core::{ExecutorError, NoInput, Settings, StepError, StepOutput, TypedStep};

static FINALIZED: AtomicUsize = AtomicUsize::new(0);

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE", default)]
pub struct FlakySettings {
    fail_run: bool,
    fail_finalize: bool,
}

impl Settings for FlakySettings {}

struct FlakyStep {
    settings: FlakySettings,
}

impl TypedStep for FlakyStep {
    type Settings = FlakySettings;
    type Input = NoInput;
    type Output = Vec<Item>;

    fn create(settings: FlakySettings) -> Result<Self, StepError> {
        Ok(Self { settings })
    }

    fn run(&mut self, _: NoInput) -> Result<StepOutput<Vec<Item>>, StepError> {
        if self.settings.fail_run {
            return Err(StepError::msg("run broke"));
        }
        Ok(items(1).into())
    }

    fn finalize(&mut self) -> Result<(), StepError> {
        FINALIZED.fetch_add(1, Ordering::SeqCst);
        if self.settings.fail_finalize {
            return Err(StepError::msg("cleanup broke"));
        }
        Ok(())
    }
}

fn run(pairs: &[(&str, &str)]) -> Result<usize, ExecutorError> {
    let before = FINALIZED.load(Ordering::SeqCst);
    let result = executor_with(pairs).execute_step::<FlakyStep>(&[], None);
    assert!(FINALIZED.load(Ordering::SeqCst) > before, "finalize must always run");
    result.map(|out| out.len())
}

#[test]
fn finalize_runs_after_success() {
    assert_eq!(run(&[]).unwrap(), 1);
}

#[test]
fn finalize_failure_alone_is_reported() {
    let err = run(&[("FLAKYSTEP__FAIL_FINALIZE", "true")]).unwrap_err();
    assert!(matches!(err, ExecutorError::FinalizeFailed { .. }), "{err}");
}

#[test]
fn run_failure_wins_when_finalize_succeeds() {
    let err = run(&[("FLAKYSTEP__FAIL_RUN", "true")]).unwrap_err();
    assert!(matches!(err, ExecutorError::StepFailed { .. }), "{err}");
}

#[test]
fn both_failures_are_reported_together() {
    let err = run(&[("FLAKYSTEP__FAIL_RUN", "true"), ("FLAKYSTEP__FAIL_FINALIZE", "true")]).unwrap_err();
    match err {
        ExecutorError::StepAndFinalizeFailed { step, source, finalize } => {
            assert_eq!(step, "FlakyStep");
            assert_eq!(source.to_string(), "run broke");
            assert_eq!(finalize.to_string(), "cleanup broke");
        }
        other => panic!("unexpected error {other}"),
    }
    assert!(wurzel_core::context::correlation_id().is_none());
}
