//! Línea de comandos con la que un orquestador ejecuta un nodo.
//!
//! El manifiesto y la ejecución directa usan el mismo punto de entrada
//! (`wurzel run`), de modo que lo generado se puede reproducir a mano.

use std::fmt;
use std::path::{Path, PathBuf};

use wurzel_core::{ExecutorKind, StepHandle};

/// Binario que ejecutan los nodos generados.
pub const PROGRAM: &str = "wurzel";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliCall {
    pub step: String,
    pub output: PathBuf,
    pub inputs: Vec<PathBuf>,
    pub executor: Option<ExecutorKind>,
    pub encapsulate_env: bool,
}

fn posix(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

impl CliCall {
    /// Argumentos tras el nombre del programa.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec!["run".to_string(), self.step.clone(), "-o".to_string(), posix(&self.output)];
        if let Some(kind) = self.executor {
            args.push("-e".to_string());
            args.push(kind.name().to_string());
        }
        for input in &self.inputs {
            args.push("-i".to_string());
            args.push(posix(input));
        }
        args.push(if self.encapsulate_env { "--encapsulate-env" } else { "--no-encapsulate-env" }.to_string());
        args
    }

    /// Programa y argumentos, listo para un `command:` de contenedor.
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(PROGRAM.to_string()).chain(self.args()).collect()
    }
}

impl fmt::Display for CliCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.argv().join(" "))
    }
}

/// Llamada `wurzel run` para `step` con sus inputs y su salida declarada.
pub fn generate_cli_call(step: &dyn StepHandle,
                         inputs: &[PathBuf],
                         output: &Path,
                         executor: Option<ExecutorKind>,
                         encapsulate_env: bool)
                         -> CliCall {
    CliCall { step: step.type_path().to_string(),
              output: output.to_path_buf(),
              inputs: inputs.to_vec(),
              executor,
              encapsulate_env }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_flags_in_stable_order() {
        let call = CliCall { step: "demo::SplitStep".into(),
                             output: PathBuf::from("data/SplitStep"),
                             inputs: vec![PathBuf::from("data/A"), PathBuf::from("data/B")],
                             executor: Some(ExecutorKind::Prometheus),
                             encapsulate_env: false };
        assert_eq!(call.to_string(),
                   "wurzel run demo::SplitStep -o data/SplitStep -e PrometheusStepExecutor -i data/A -i data/B --no-encapsulate-env");
    }

    #[test]
    fn leaf_without_executor() {
        let call = CliCall { step: "demo::Source".into(),
                             output: PathBuf::from("out"),
                             inputs: vec![],
                             executor: None,
                             encapsulate_env: true };
        assert_eq!(call.args(), vec!["run", "demo::Source", "-o", "out", "--encapsulate-env"]);
    }
}
