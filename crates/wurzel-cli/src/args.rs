//! Definición de la línea de comandos.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use wurzel_core::ExecutorKind;

/// Ejecuta steps tipados y genera manifiestos para orquestadores.
#[derive(Parser, Debug)]
#[command(name = "wurzel", version, about = "Typed step pipelines: run steps, generate DVC/Argo/GitLab manifests")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Nivel de log (trace, debug, info, warn, error). `RUST_LOG` tiene prioridad.
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Ejecuta un step.
    Run(RunArgs),
    /// Ejecuta un pipeline completo, dependencias primero.
    Execute(ExecuteArgs),
    /// Genera el manifiesto de un pipeline para un backend.
    Generate(GenerateArgs),
    /// Muestra la firma de un step.
    Inspect(InspectArgs),
    /// Lista (y opcionalmente valida) los settings de un pipeline.
    Env(EnvArgs),
    /// Lista los middlewares disponibles.
    Middlewares,
}

/// `--encapsulate-env` / `--no-encapsulate-env`; gana el último.
#[derive(Args, Debug, Clone)]
pub struct EncapsulateFlags {
    #[arg(long = "encapsulate-env", action = ArgAction::SetTrue, overrides_with = "no_encapsulate_env")]
    encapsulate_env: bool,
    #[arg(long = "no-encapsulate-env", action = ArgAction::SetTrue, overrides_with = "encapsulate_env")]
    no_encapsulate_env: bool,
}

impl EncapsulateFlags {
    /// Activado salvo `--no-encapsulate-env`.
    pub fn enabled(&self) -> bool {
        !self.no_encapsulate_env
    }
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Ruta de tipo o nombre del step.
    pub step: String,
    /// Directorio de salida.
    #[arg(short, long)]
    pub output: PathBuf,
    /// Directorios o ficheros de entrada.
    #[arg(short, long = "input")]
    pub inputs: Vec<PathBuf>,
    #[arg(short, long, default_value = "BaseStepExecutor")]
    pub executor: ExecutorKind,
    /// Middlewares extra (separados por comas); por defecto `MIDDLEWARES`.
    #[arg(short, long, value_delimiter = ',')]
    pub middlewares: Vec<String>,
    #[command(flatten)]
    pub encapsulate: EncapsulateFlags,
}

#[derive(Args, Debug)]
pub struct ExecuteArgs {
    pub pipeline: String,
    /// Raíz de salida; cada step escribe en `<output>/<StepName>`.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    #[arg(short, long, default_value = "BaseStepExecutor")]
    pub executor: ExecutorKind,
    #[command(flatten)]
    pub encapsulate: EncapsulateFlags,
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Pipeline registrado o step suelto.
    pub pipeline: String,
    /// dvc, argo o gitlab.
    #[arg(short, long, default_value = "dvc")]
    pub backend: String,
    /// Ficheros de values YAML, fusionados en orden.
    #[arg(long = "values")]
    pub values: Vec<PathBuf>,
    /// Entrada de `workflows`/`pipelines` en los values.
    #[arg(long)]
    pub pipeline_name: Option<String>,
    /// Executor que usarán los nodos generados.
    #[arg(short, long)]
    pub executor: Option<ExecutorKind>,
    /// Fichero de salida; por defecto stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    pub step: String,
}

#[derive(Args, Debug)]
pub struct EnvArgs {
    pub pipeline: String,
    /// Valida los settings contra el entorno actual.
    #[arg(long)]
    pub check: bool,
    #[command(flatten)]
    pub encapsulate: EncapsulateFlags,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_generated_run_call() {
        let cli = Cli::try_parse_from(["wurzel", "run", "demo::SplitStep", "-o", "data/Split", "-e", "PrometheusStepExecutor",
                                       "-i", "data/A", "-i", "data/B", "--no-encapsulate-env"]).unwrap();
        let Command::Run(args) = cli.command else { panic!("expected run") };
        assert_eq!(args.inputs, vec![PathBuf::from("data/A"), PathBuf::from("data/B")]);
        assert_eq!(args.executor, ExecutorKind::Prometheus);
        assert!(!args.encapsulate.enabled());
    }

    #[test]
    fn last_encapsulate_flag_wins() {
        let cli = Cli::try_parse_from(["wurzel", "env", "p", "--no-encapsulate-env", "--encapsulate-env"]).unwrap();
        let Command::Env(args) = cli.command else { panic!("expected env") };
        assert!(args.encapsulate.enabled());
    }

    #[test]
    fn encapsulation_defaults_on() {
        let cli = Cli::try_parse_from(["wurzel", "run", "S", "-o", "out"]).unwrap();
        let Command::Run(args) = cli.command else { panic!("expected run") };
        assert!(args.encapsulate.enabled());
        assert_eq!(args.executor, ExecutorKind::Base);
    }

    #[test]
    fn unknown_executor_is_rejected() {
        assert!(Cli::try_parse_from(["wurzel", "run", "S", "-o", "out", "-e", "Dask"]).is_err());
    }
}
