//! Definiciones relacionadas a Steps.
//!
//! Un step es una unidad con settings, contrato de input y contrato de output
//! declarados. Este módulo define:
//! - `TypedStep`: interfaz tipada que implementan los usuarios.
//! - `StepSignature`: descriptores explícitos comprobados al construir.
//! - `StepHandle`: vista sin tipos usada por el grafo, el executor y los
//!   backends.
//! - `collect_partial` para steps que toleran fallos parciales.

pub mod handle;
pub mod macros;
mod partial;
pub mod signature;
pub mod typed;

pub use handle::{handle, StepHandle, TypedHandle};
pub use partial::collect_partial;
pub use signature::StepSignature;
pub use typed::{OutputMode, StepOutput, TypedStep};

/// Último segmento de una ruta de tipo, sin parámetros genéricos.
///
/// `my_crate::steps::SplitStep<Foo>` -> `SplitStep`.
pub fn short_type_name(type_path: &'static str) -> &'static str {
    let base = match type_path.find('<') {
        Some(idx) => &type_path[..idx],
        None => type_path,
    };
    match base.rfind("::") {
        Some(idx) => &base[idx + 2..],
        None => base,
    }
}

/// Prefijo de settings de un step: el nombre en mayúsculas.
pub fn settings_prefix(step_name: &str) -> String {
    step_name.to_uppercase()
}
