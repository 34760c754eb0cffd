use std::fs;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use wurzel_backend::{lower, LoweringOptions};
use wurzel_cli::{dispatch, Cli};
use wurzel_core::contract::persistence::read_json_items;
use wurzel_core::{ConfigSource, ExecutorKind, MapConfigSource};
use wurzel_rs::demo::{markdown_pipeline, registry, MARKDOWN_PIPELINE};
use wurzel_steps::MarkdownDataContract;

fn config(pairs: &[(&str, String)]) -> Arc<dyn ConfigSource> {
    Arc::new(MapConfigSource::from_pairs(pairs.iter().map(|(k, v)| (k.to_string(), v.clone()))))
}

fn wurzel(args: &[String], config: Arc<dyn ConfigSource>) -> String {
    let cli = Cli::try_parse_from(std::iter::once("wurzel".to_string()).chain(args.iter().cloned())).expect("args");
    let mut out = Vec::new();
    dispatch(&registry().unwrap(), config, cli.command, &mut out).expect("command");
    String::from_utf8(out).unwrap()
}

fn markdown_folder(dir: &Path) {
    fs::write(dir.join("one.md"), "---\nurl: https://docs/one\ntopics: uno\n---\nsame body").unwrap();
    fs::write(dir.join("two.md"), "same body").unwrap();
    fs::write(dir.join("three.md"), "other body").unwrap();
}

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn demo_pipeline_runs_and_deduplicates() {
    let docs = tempfile::tempdir().unwrap();
    markdown_folder(docs.path());
    let out = tempfile::tempdir().unwrap();
    let cfg = config(&[("MANUALMARKDOWNSTEP__FOLDER_PATH", docs.path().display().to_string())]);

    wurzel(&args(&["execute", MARKDOWN_PIPELINE, "-o", &out.path().display().to_string()]), cfg);

    let file = out.path().join("DropDuplicationStep").join("ManualMarkdown-DropDuplication.json");
    let kept: Vec<MarkdownDataContract> = read_json_items(&file).unwrap();
    let md: Vec<&str> = kept.iter().map(|d| d.md.as_str()).collect();
    // orden por nombre de fichero: one, three, two
    assert_eq!(md, ["same body", "other body"]);
    assert_eq!(kept[0].url, "https://docs/one");
}

#[test]
fn generated_commands_reproduce_the_pipeline() {
    let docs = tempfile::tempdir().unwrap();
    markdown_folder(docs.path());
    let data = tempfile::tempdir().unwrap();
    let cfg = config(&[("MANUALMARKDOWNSTEP__FOLDER_PATH", docs.path().display().to_string())]);

    let (graph, root) = markdown_pipeline().unwrap();
    let options = LoweringOptions { data_dir: data.path().to_path_buf(),
                                    executor: Some(ExecutorKind::Base),
                                    encapsulate_env: true };
    let lowered = lower(&graph, root, &options).unwrap();
    assert_eq!(lowered.len(), 2);
    for descriptor in lowered.iter() {
        wurzel(&descriptor.command.args(), cfg.clone());
    }

    let kept: Vec<MarkdownDataContract> =
        read_json_items(&data.path().join("DropDuplicationStep").join("ManualMarkdown-DropDuplication.json")).unwrap();
    assert_eq!(kept.len(), 2);
}

#[test]
fn generate_command_emits_each_backend() {
    let cfg = config(&[]);
    let dvc = wurzel(&args(&["generate", MARKDOWN_PIPELINE, "-b", "dvc"]), cfg.clone());
    assert!(dvc.contains("ManualMarkdownStep:"), "{dvc}");
    assert!(dvc.contains("always_changed: true"), "{dvc}");

    let argo = wurzel(&args(&["generate", MARKDOWN_PIPELINE, "-b", "argo"]), cfg.clone());
    assert!(argo.contains("kind: CronWorkflow"), "{argo}");
    assert!(argo.contains("{{workflow.uid}}"), "{argo}");

    let gitlab = wurzel(&args(&["generate", MARKDOWN_PIPELINE, "-b", "gitlab"]), cfg);
    assert!(gitlab.contains("needs:"), "{gitlab}");
}

#[test]
fn inspect_lists_demo_step() {
    let out = wurzel(&args(&["inspect", "DropDuplicationStep"]), config(&[]));
    let doc: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(doc["settings_prefix"], "DROPDUPLICATIONSTEP");
    assert_eq!(doc["settings"], "DropSettings");
}
