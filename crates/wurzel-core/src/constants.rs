//! Constantes del motor.
//!
//! Valores estáticos compartidos por el executor, los backends y el CLI. Los
//! nombres de fichero generados dependen de `BATCH_SUFFIX` y
//! `MEMORY_HISTORY`; cambiarlos rompe la carga de salidas ya persistidas.

/// Número de items acumulados antes de volcar un fichero de batch.
pub const BATCH_FLUSH_SIZE: usize = 500;

/// Sufijo de los ficheros de batch: `<history>_batch0000.json`.
pub const BATCH_SUFFIX: &str = "_batch";

/// Etiqueta de lineage para inputs entregados en memoria.
pub const MEMORY_HISTORY: &str = "[Memory]";

/// Separador entre el prefijo del step y la clave de settings
/// (`MYSTEP__KEY`).
pub const SETTINGS_SEPARATOR: &str = "__";

/// Variable con el identificador de ejecución compartido por todos los nodos.
pub const RUN_ID_ENV: &str = "WURZEL_RUN_ID";

/// Lista separada por comas de middlewares a instalar.
pub const MIDDLEWARES_ENV: &str = "MIDDLEWARES";
