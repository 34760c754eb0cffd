mod common;

use std::collections::BTreeSet;

use common::*;
use wurzel_core::contract::persistence::read_json_items;
use wurzel_core::executor::discover_files;
use wurzel_core::step::TypedHandle;
use wurzel_core::{data_model, typed_step};
use wurzel_core::{Contract, ContractError, ExecutorError, NoInput, NoSettings, StepError, StepInput, StepOutput, Table, TypedStep};

#[test]
fn leaf_step_persists_list_named_after_step() {
    let dir = tempfile::tempdir().unwrap();
    let mut executor = executor_with(&[]);
    let out = executor.execute_step::<TwoItemsStep>(&[], Some(dir.path())).unwrap();

    assert_eq!(out.len(), 1);
    let (result, report) = &out[0];
    assert_eq!(result.as_ref().map(Vec::len), Some(2));
    assert_eq!(report.results, 2);
    assert_eq!(report.inputs, 0);
    assert_eq!(report.step_name, "TwoItemsStep");

    let file = dir.path().join("TwoItems.json");
    assert!(file.exists(), "expected {file:?}");
    let stored: Vec<Item> = read_json_items(&file).unwrap();
    assert_eq!(stored, items(2));
}

#[test]
fn memory_input_uses_memory_history() {
    let dir = tempfile::tempdir().unwrap();
    let mut executor = executor_with(&[]);
    let out = executor.execute_step::<EchoStep>(&[StepInput::memory(items(3))], Some(dir.path())).unwrap();

    assert_eq!(out[0].1.history, "[Memory]-Echo");
    assert_eq!(out[0].1.inputs, 3);
    assert!(dir.path().join("[Memory]-Echo.json").exists());
}

#[test]
fn no_output_dir_keeps_result_in_memory() {
    let mut executor = executor_with(&[]);
    let out = executor.execute_step::<EchoStep>(&[StepInput::memory(items(2))], None).unwrap();
    assert_eq!(out[0].0.as_deref(), Some(items(2).as_slice()));
    assert_eq!(out[0].1.time_to_save, std::time::Duration::ZERO);
}

#[test]
fn chained_on_disk_extends_history() {
    let root = tempfile::tempdir().unwrap();
    let first = root.path().join("TwoItemsStep");
    let second = root.path().join("EchoStep");
    let mut executor = executor_with(&[]);
    executor.execute_step::<TwoItemsStep>(&[], Some(&first)).unwrap();
    let out = executor.execute_step::<EchoStep>(&[StepInput::location(&first)], Some(&second)).unwrap();

    assert_eq!(out[0].1.history, "TwoItems-Echo");
    assert_eq!(out[0].1.inputs, 2);
    assert!(second.join("TwoItems-Echo.json").exists());
}

#[test]
fn one_report_per_input_location() {
    let root = tempfile::tempdir().unwrap();
    let a = root.path().join("a");
    let b = root.path().join("b");
    let mut executor = executor_with(&[]);
    executor.execute_step::<TwoItemsStep>(&[], Some(&a)).unwrap();
    executor.execute_step::<TagStep>(&[StepInput::location(&a)], Some(&b)).unwrap();

    let out = executor.execute_step::<EchoStep>(&[StepInput::location(&a), StepInput::location(&b)], None).unwrap();
    let histories: Vec<_> = out.iter().map(|(_, r)| r.history.as_str()).collect();
    assert_eq!(histories, vec!["TwoItems-Echo", "TwoItems-Tag-Echo"]);
}

#[test]
fn non_leaf_without_inputs_is_rejected() {
    let mut executor = executor_with(&[]);
    let err = executor.execute_step::<EchoStep>(&[], None).unwrap_err();
    assert!(matches!(err, ExecutorError::MissingInput { ref step } if step == "EchoStep"));
}

#[test]
fn wrong_memory_type_is_rejected() {
    let mut executor = executor_with(&[]);
    let err = executor.execute_step::<EchoStep>(&[StepInput::memory(Table(items(1)))], None).unwrap_err();
    assert!(matches!(err, ExecutorError::InputType { .. }), "{err}");
}

#[test]
fn batches_flush_at_threshold() {
    let dir = tempfile::tempdir().unwrap();
    let mut executor = wurzel_core::StepExecutor::builder().config(map_config(&[("BATCHSTEP__BATCHES", "3"), ("BATCHSTEP__SIZE", "100")]))
                                                          .batch_flush_size(250)
                                                          .build()
                                                          .unwrap();
    let out = executor.execute_step::<BatchStep>(&[], Some(dir.path())).unwrap();

    let (result, report) = &out[0];
    assert!(result.is_none(), "batched results only live on disk");
    assert_eq!(report.results, 300);
    let files = discover_files(dir.path(), "json").unwrap();
    let names: Vec<_> = files.iter().map(|f| f.file_name().unwrap().to_string_lossy().to_string()).collect();
    assert_eq!(names, vec!["Batch_batch0000.json", "Batch_batch0001.json"]);
    assert_eq!(read_json_items::<Item>(&files[0]).unwrap().len(), 250);
    assert_eq!(read_json_items::<Item>(&files[1]).unwrap().len(), 50);
}

#[test]
fn batch_round_trip_is_independent_of_threshold() {
    let expected: Vec<Item> = (0..9).map(|id| Item { id, text: format!("{}-{}", id / 3, id % 3) }).collect();
    for (threshold, file_count) in [(1usize, 9usize), (3, 3), (500, 1)] {
        let dir = tempfile::tempdir().unwrap();
        let mut executor = wurzel_core::StepExecutor::builder().config(map_config(&[("BATCHSTEP__BATCHES", "3"), ("BATCHSTEP__SIZE", "3")]))
                                                              .batch_flush_size(threshold)
                                                              .build()
                                                              .unwrap();
        executor.execute_step::<BatchStep>(&[], Some(dir.path())).unwrap();
        let files = discover_files(dir.path(), "json").unwrap();
        assert_eq!(files.len(), file_count, "threshold {threshold}");
        assert_eq!(Vec::<Item>::load(&files).unwrap(), expected, "threshold {threshold}");
    }
}

#[test]
fn empty_batches_are_not_written() {
    let dir = tempfile::tempdir().unwrap();
    let mut executor = executor_with(&[("BATCHSTEP__BATCHES", "2"), ("BATCHSTEP__SIZE", "0")]);
    let out = executor.execute_step::<BatchStep>(&[], Some(dir.path())).unwrap();
    assert_eq!(out[0].1.results, 0);
    assert!(discover_files(dir.path(), "json").unwrap().is_empty());
}

// Step que declara salida entera pero devuelve batches.
struct LyingStep;

impl TypedStep for LyingStep {
    type Settings = NoSettings;
    type Input = NoInput;
    type Output = Vec<Item>;

    fn create(_: NoSettings) -> Result<Self, StepError> {
        Ok(Self)
    }

    fn run(&mut self, _: NoInput) -> Result<StepOutput<Vec<Item>>, StepError> {
        Ok(StepOutput::batches(vec![Ok(items(1))]))
    }
}

#[test]
fn undeclared_streaming_is_rejected() {
    let mut executor = executor_with(&[]);
    let err = executor.execute_step::<LyingStep>(&[], None).unwrap_err();
    assert!(matches!(err, ExecutorError::OutputModeMismatch { .. }), "{err}");
}

// Streaming declarado sobre un modelo suelto: error estático.
struct SingleBatchStep;

impl TypedStep for SingleBatchStep {
    type Settings = NoSettings;
    type Input = NoInput;
    type Output = Item;

    const OUTPUT_MODE: wurzel_core::OutputMode = wurzel_core::OutputMode::Batched;

    fn create(_: NoSettings) -> Result<Self, StepError> {
        Ok(Self)
    }

    fn run(&mut self, _: NoInput) -> Result<StepOutput<Item>, StepError> {
        Ok(StepOutput::batches(Vec::new()))
    }
}

#[test]
fn streaming_single_model_is_a_static_error() {
    assert!(matches!(TypedHandle::<SingleBatchStep>::new(), Err(ContractError::BatchedSingle { .. })));
}

data_model!(#[derive(Eq, PartialOrd, Ord)] Tag { name: String });

typed_step! {
    leaf TagsStep {
        output: BTreeSet<Tag>,
        run(_me) {
            ["b", "a", "b"].iter().map(|n| Tag { name: n.to_string() }).collect()
        }
    }
}

typed_step! { leaf RowsStep { output: Table<Item>, run(_me) { Table(items(3)) } } }

#[test]
fn set_and_table_contracts_persist() {
    let dir = tempfile::tempdir().unwrap();
    let mut executor = executor_with(&[]);

    let tags = executor.execute_step::<TagsStep>(&[], Some(dir.path())).unwrap();
    assert_eq!(tags[0].1.results, 2);
    let reloaded = BTreeSet::<Tag>::load(&[dir.path().join("Tags.json")]).unwrap();
    assert_eq!(reloaded.len(), 2);

    executor.execute_step::<RowsStep>(&[], Some(dir.path())).unwrap();
    let csv = dir.path().join("Rows.csv");
    assert!(csv.exists());
    assert_eq!(Table::<Item>::load(&[csv]).unwrap(), Table(items(3)));
}

data_model!(Observed { correlation: String, history: String });

typed_step! {
    step ObserverStep {
        input: Vec<Item>,
        output: Observed,
        run(_me, _inp) {
            Observed { correlation: wurzel_core::context::correlation_id().unwrap_or_default(),
                       history: wurzel_core::context::active_history().map(|h| h.to_string()).unwrap_or_default() }
        }
    }
}

#[test]
fn lineage_and_correlation_are_scoped_to_the_step() {
    let mut executor = executor_with(&[]);
    let out = executor.execute_step::<ObserverStep>(&[StepInput::memory(items(1))], None).unwrap();
    let observed = out[0].0.clone().unwrap();
    assert_eq!(observed.correlation, "ObserverStep");
    assert_eq!(observed.history, "[Memory]-Observer");
    assert!(wurzel_core::context::correlation_id().is_none());
    assert!(wurzel_core::context::active_history().is_none());
}

#[test]
fn leaf_step_rejects_inputs() {
    let mut executor = executor_with(&[]);
    let err = executor.execute_step::<TwoItemsStep>(&[StepInput::memory(items(1))], None).unwrap_err();
    assert!(matches!(err, ExecutorError::UnexpectedInput { ref step, count: 1 } if step == "TwoItemsStep"), "{err}");
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct VerSettings {
    pub version: String,
    pub folder: std::path::PathBuf,
    pub retries: u8,
}
impl wurzel_core::Settings for VerSettings {}

typed_step! { leaf VerStep { settings: VerSettings, output: Vec<Item>, run(me) {
    vec![Item { id: me.settings.retries as u32, text: format!("{}@{}", me.settings.version, me.settings.folder.display()) }]
} } }

#[test]
fn numeric_looking_settings_keep_string_and_path_types() {
    let mut executor = executor_with(&[("VERSTEP__VERSION", "2024"), ("VERSTEP__FOLDER", "2024"), ("VERSTEP__RETRIES", "3")]);
    let out = executor.execute_step::<VerStep>(&[], None).unwrap();
    assert_eq!(out[0].0, Some(vec![Item { id: 3, text: "2024@2024".into() }]));
}
