mod common;

use common::*;
use wurzel_core::contract::{Container, ContractDescriptor};
use wurzel_core::{data_model, typed_step};
use wurzel_core::{run_graph, Contract, ContractError, ExecutorError, GraphError, NoInput, NoSettings, Pipe, StepError, StepGraph,
                  StepOutput, StepSignature, TypedStep};

typed_step! { step MergeStep { input: Vec<Item>, output: Vec<Item>, run(_me, inp) { inp } } }

/// TwoItems -> {Tag, Echo} -> Merge
fn diamond() -> (StepGraph, [wurzel_core::NodeId; 4]) {
    let mut graph = StepGraph::new();
    let src = graph.add::<TwoItemsStep>().unwrap();
    let tag = graph.add::<TagStep>().unwrap();
    let echo = graph.add::<EchoStep>().unwrap();
    let merge = graph.add::<MergeStep>().unwrap();
    graph.connect(src, tag).unwrap();
    graph.connect(src, echo).unwrap();
    graph.connect(tag, merge).unwrap();
    graph.connect(echo, merge).unwrap();
    (graph, [src, tag, echo, merge])
}

#[test]
fn diamond_runs_shared_dependency_once_on_disk() {
    let (graph, [src, tag, echo, merge]) = diamond();
    assert_eq!(graph.traverse(merge).unwrap(), vec![src, tag, echo, merge]);

    let out = tempfile::tempdir().unwrap();
    let mut executor = executor_with(&[]);
    let reports = run_graph(&mut executor, &graph, merge, Some(out.path())).unwrap();

    assert_eq!(reports.len(), 4);
    let (last, merge_reports) = &reports[3];
    assert_eq!(*last, merge);
    let histories: Vec<_> = merge_reports.iter().map(|r| r.history.as_str()).collect();
    assert_eq!(histories, vec!["TwoItems-Tag-Merge", "TwoItems-Echo-Merge"]);
    assert!(out.path().join("MergeStep").join("TwoItems-Tag-Merge.json").exists());
    assert!(out.path().join("MergeStep").join("TwoItems-Echo-Merge.json").exists());
}

#[test]
fn diamond_in_memory_passes_values() {
    let (graph, [.., merge]) = diamond();
    let mut executor = executor_with(&[]);
    let reports = run_graph(&mut executor, &graph, merge, None).unwrap();
    let merged = &reports[3].1;
    assert_eq!(merged.len(), 2);
    assert!(merged.iter().all(|r| r.history == "[Memory]-Merge" && r.results == 2));
}

#[test]
fn batched_output_needs_a_directory() {
    let mut graph = StepGraph::new();
    let root = Pipe::<BatchStep>::start(&mut graph).unwrap().then::<EchoStep>().unwrap().node();
    let config = [("BATCHSTEP__BATCHES", "2"), ("BATCHSTEP__SIZE", "2")];

    let mut executor = executor_with(&config);
    let err = run_graph(&mut executor, &graph, root, None).unwrap_err();
    assert!(matches!(err, ExecutorError::BatchedInMemory { ref step } if step == "BatchStep"), "{err}");

    let out = tempfile::tempdir().unwrap();
    let reports = run_graph(&mut executor, &graph, root, Some(out.path())).unwrap();
    assert_eq!(reports[1].1[0].history, "Batch-Echo");
    assert_eq!(reports[1].1[0].inputs, 4);
}

#[test]
fn settings_are_validated_for_the_whole_graph() {
    let mut graph = StepGraph::new();
    let root = Pipe::<BatchStep>::start(&mut graph).unwrap().then::<EchoStep>().unwrap().node();

    let missing = map_config(&[]);
    let errors = graph.validate_settings(root, missing.as_ref(), true).unwrap();
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], ExecutorError::EnvSettings { ref step, .. } if step == "BatchStep"));

    let complete = map_config(&[("BATCHSTEP__BATCHES", "1"), ("BATCHSTEP__SIZE", "1")]);
    assert!(graph.validate_settings(root, complete.as_ref(), true).unwrap().is_empty());
}

#[test]
fn duplicate_step_names_cannot_share_an_output_root() {
    let mut graph = StepGraph::new();
    let src = graph.add::<TwoItemsStep>().unwrap();
    let a = graph.add::<EchoStep>().unwrap();
    let b = graph.add::<EchoStep>().unwrap();
    graph.chain(&[src, a, b]).unwrap();

    let out = tempfile::tempdir().unwrap();
    let mut executor = executor_with(&[]);
    let err = run_graph(&mut executor, &graph, b, Some(out.path())).unwrap_err();
    assert!(matches!(err, ExecutorError::Graph(GraphError::DuplicateStepName(ref n)) if n == "EchoStep"), "{err}");
    // en memoria no hay colisión de directorios
    assert_eq!(run_graph(&mut executor, &graph, b, None).unwrap().len(), 3);
}

data_model!(Other { n: u32 });

/// Declara `list[Other]` como output pero su cuerpo produce `list[Item]`.
struct WrongOutputStep;
impl TypedStep for WrongOutputStep {
    type Settings = NoSettings;
    type Input = NoInput;
    type Output = Vec<Item>;
    fn create(_: NoSettings) -> Result<Self, StepError> {
        Ok(Self)
    }
    fn run(&mut self, _: NoInput) -> Result<StepOutput<Vec<Item>>, StepError> {
        Ok(items(1).into())
    }
    fn signature() -> StepSignature {
        StepSignature::of::<Self>().with_output(<Vec<Other> as Contract>::descriptor())
    }
}

/// Declara un input distinto del que recibe su cuerpo.
struct WrongInputStep;
impl TypedStep for WrongInputStep {
    type Settings = NoSettings;
    type Input = Vec<Item>;
    type Output = Vec<Item>;
    fn create(_: NoSettings) -> Result<Self, StepError> {
        Ok(Self)
    }
    fn run(&mut self, input: Vec<Item>) -> Result<StepOutput<Vec<Item>>, StepError> {
        Ok(input.into())
    }
    fn signature() -> StepSignature {
        StepSignature { input: <Vec<Other> as Contract>::descriptor(),
                        ..StepSignature::of::<Self>() }
    }
}

/// `list[set[Item]]`: contenedores anidados.
struct NestedStep;
impl TypedStep for NestedStep {
    type Settings = NoSettings;
    type Input = NoInput;
    type Output = Vec<Item>;
    fn create(_: NoSettings) -> Result<Self, StepError> {
        Ok(Self)
    }
    fn run(&mut self, _: NoInput) -> Result<StepOutput<Vec<Item>>, StepError> {
        Ok(Vec::new().into())
    }
    fn signature() -> StepSignature {
        let set = ContractDescriptor::wrap(Container::Set, <Item as Contract>::descriptor());
        StepSignature::of::<Self>().with_output(ContractDescriptor::wrap(Container::List, set))
    }
}

#[test]
fn declared_output_must_match_run_body() {
    let mut graph = StepGraph::new();
    let err = graph.add::<WrongOutputStep>().unwrap_err();
    match err {
        GraphError::Contract(ContractError::BodyMismatch { step, part, found, declared }) => {
            assert_eq!(step, "WrongOutputStep");
            assert_eq!(part, "output");
            assert_eq!(found, <Vec<Item> as Contract>::descriptor());
            assert_eq!(declared, <Vec<Other> as Contract>::descriptor());
        }
        other => panic!("expected body mismatch, got {other:?}"),
    }
    assert!(graph.is_empty());
}

#[test]
fn declared_input_must_match_run_body() {
    let mut graph = StepGraph::new();
    assert!(matches!(graph.add::<WrongInputStep>(),
                     Err(GraphError::Contract(ContractError::BodyMismatch { part: "input", .. }))));
    assert!(graph.is_empty());
}

#[test]
fn nested_containers_are_unsupported() {
    let mut graph = StepGraph::new();
    let err = graph.add::<NestedStep>().unwrap_err();
    assert!(matches!(err, GraphError::Contract(ContractError::Unsupported(ref msg)) if msg.contains("nested")), "{err}");
    assert!(graph.is_empty());
}
