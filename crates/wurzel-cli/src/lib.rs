//! wurzel-cli: línea de comandos de wurzel sobre un registry de steps.
pub mod args;
pub mod commands;
pub mod errors;
pub mod logging;
pub mod registry;

use std::process::ExitCode;

use clap::Parser;

pub use args::{Cli, Command};
pub use commands::{dispatch, env_config};
pub use errors::CliError;
pub use registry::{PipelineFactory, StepRegistry};

/// Punto de entrada del binario: parsea argumentos, instala logs y ejecuta.
/// Cualquier error termina con un mensaje en stderr y código 1.
pub fn main_with(registry: &StepRegistry) -> ExitCode {
    let cli = Cli::parse();
    logging::init_tracing(&cli.log_level);
    let mut stdout = std::io::stdout().lock();
    match dispatch(registry, env_config(), cli.command, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
