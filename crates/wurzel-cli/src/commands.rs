//! Implementación de cada subcomando.

use std::fs;
use std::io::Write;
use std::sync::Arc;

use serde_json::json;
use wurzel_backend::{build_backend, BackendKind, BackendOptions};
use wurzel_core::step::settings_prefix;
use wurzel_core::{run_graph, ConfigSource, EnvConfigSource, ExecutorKind, MiddlewareRegistry, StepExecutor, StepInput};

use crate::args::{Command, EnvArgs, ExecuteArgs, GenerateArgs, InspectArgs, RunArgs};
use crate::errors::CliError;
use crate::registry::StepRegistry;

/// Ejecuta `command`; toda la salida de datos va a `out`.
pub fn dispatch(registry: &StepRegistry,
                config: Arc<dyn ConfigSource>,
                command: Command,
                out: &mut dyn Write)
                -> Result<(), CliError> {
    match command {
        Command::Run(args) => run(registry, config, args),
        Command::Execute(args) => execute(registry, config, args),
        Command::Generate(args) => generate(registry, config.as_ref(), args, out),
        Command::Inspect(args) => inspect(registry, args, out),
        Command::Env(args) => env(registry, config.as_ref(), args, out),
        Command::Middlewares => middlewares(config.as_ref(), out),
    }
}

fn executor(config: Arc<dyn ConfigSource>, kind: ExecutorKind, extra: &[String], encapsulate: bool) -> Result<StepExecutor, CliError> {
    let names = if extra.is_empty() { MiddlewareRegistry::names_from_config(config.as_ref()) } else { extra.to_vec() };
    Ok(StepExecutor::builder().config(config)
                              .encapsulate_env(encapsulate)
                              .kind(kind)
                              .middleware_names(names)
                              .build()?)
}

fn run(registry: &StepRegistry, config: Arc<dyn ConfigSource>, args: RunArgs) -> Result<(), CliError> {
    let step = registry.step(&args.step)?;
    let inputs: Vec<StepInput> = args.inputs.iter().map(StepInput::location).collect();
    let mut exec = executor(config, args.executor, &args.middlewares, args.encapsulate.enabled())?;
    let outcomes = exec.execute(step.as_ref(), &inputs, Some(args.output.as_path()))?;
    for outcome in &outcomes {
        let r = &outcome.report;
        log::info!("{} [{}]: {} inputs -> {} results", r.step_name, r.history, r.inputs, r.results);
    }
    exec.close();
    Ok(())
}

fn execute(registry: &StepRegistry, config: Arc<dyn ConfigSource>, args: ExecuteArgs) -> Result<(), CliError> {
    let (graph, root) = registry.pipeline(&args.pipeline)?;
    let mut exec = executor(config, args.executor, &[], args.encapsulate.enabled())?;
    let reports = run_graph(&mut exec, &graph, root, args.output.as_deref())?;
    log::info!("pipeline {} finished: {} steps", args.pipeline, reports.len());
    exec.close();
    Ok(())
}

fn generate(registry: &StepRegistry, config: &dyn ConfigSource, args: GenerateArgs, out: &mut dyn Write) -> Result<(), CliError> {
    let kind: BackendKind = args.backend.parse()?;
    let options = BackendOptions { values: args.values,
                                   workflow: args.pipeline_name,
                                   executor: args.executor };
    let backend = build_backend(kind, config, &options)?;
    let (graph, root) = registry.pipeline(&args.pipeline)?;
    // se genera entero antes de escribir nada
    let manifest = backend.generate_artifact(&graph, root)?;
    match args.output {
        Some(path) => {
            fs::write(&path, &manifest).map_err(|source| CliError::Write { path: path.clone(), source })?;
            log::info!("{} manifest written to {}", backend.name(), path.display());
        }
        None => write_out(out, &manifest)?,
    }
    Ok(())
}

fn inspect(registry: &StepRegistry, args: InspectArgs, out: &mut dyn Write) -> Result<(), CliError> {
    let step = registry.step(&args.step)?;
    let sig = step.signature();
    let doc = json!({
        "name": sig.name,
        "type_path": sig.type_path,
        "input": sig.input.to_string(),
        "output": sig.output.to_string(),
        "settings": sig.settings,
        "settings_prefix": settings_prefix(sig.name),
        "output_mode": sig.mode,
    });
    write_out(out, &format!("{}\n", serde_json::to_string_pretty(&doc).unwrap_or_default()))
}

fn env(registry: &StepRegistry, config: &dyn ConfigSource, args: EnvArgs, out: &mut dyn Write) -> Result<(), CliError> {
    let (graph, root) = registry.pipeline(&args.pipeline)?;
    let mut text = String::new();
    for id in graph.traverse(root)? {
        let sig = graph.node(id)?.step().signature();
        match sig.settings {
            Some(label) => text.push_str(&format!("{}: {} ({}__*)\n", sig.name, label, settings_prefix(sig.name))),
            None => text.push_str(&format!("{}: no settings\n", sig.name)),
        }
    }
    write_out(out, &text)?;
    if !args.check {
        return Ok(());
    }
    let errors = graph.validate_settings(root, config, args.encapsulate.enabled())?;
    for e in &errors {
        log::error!("{e}");
    }
    if errors.is_empty() {
        write_out(out, "all settings valid\n")
    } else {
        Err(CliError::InvalidSettings { failed: errors.len() })
    }
}

fn middlewares(config: &dyn ConfigSource, out: &mut dyn Write) -> Result<(), CliError> {
    let registry = MiddlewareRegistry::default();
    let active = MiddlewareRegistry::names_from_config(config);
    let mut text = String::new();
    for name in registry.names() {
        let mark = if active.iter().any(|a| a == name) { " (enabled)" } else { "" };
        text.push_str(&format!("{name}{mark}\n"));
    }
    write_out(out, &text)
}

fn write_out(out: &mut dyn Write, text: &str) -> Result<(), CliError> {
    out.write_all(text.as_bytes())
       .map_err(|source| CliError::Write { path: "<stdout>".into(), source })
}

/// Config por defecto del binario: entorno del proceso tras cargar `.env`.
pub fn env_config() -> Arc<dyn ConfigSource> {
    wurzel_core::config::init_dotenv();
    Arc::new(EnvConfigSource)
}
