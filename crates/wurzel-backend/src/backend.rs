use wurzel_core::constants::RUN_ID_ENV;
use wurzel_core::{ConfigSource, NodeId, StepGraph};

use crate::errors::BackendError;

/// Generador de manifiestos para un orquestador externo.
pub trait Backend {
    /// Nombre con el que se selecciona desde la línea de comandos.
    fn name(&self) -> &'static str;

    /// Manifiesto completo para el grafo que termina en `root`. Nada se
    /// escribe si la generación falla.
    fn generate_artifact(&self, graph: &StepGraph, root: NodeId) -> Result<String, BackendError>;
}

/// `WURZEL_RUN_ID` de la configuración, vacío si no está.
pub fn run_id(config: &dyn ConfigSource) -> String {
    config.get(RUN_ID_ENV).unwrap_or_default()
}
