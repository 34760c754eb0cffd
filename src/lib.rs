//! wurzel: pipelines de steps tipados.
//!
//! Este crate agrupa el workspace:
//! - `wurzel_core`: contratos, steps, grafo y executor.
//! - `wurzel_backend`: generación de manifiestos DVC / Argo / GitLab.
//! - `wurzel_steps`: steps genéricos (markdown, deduplicación).
//! - `wurzel_cli`: línea de comandos.
//!
//! `demo` registra los steps de `steps` y un pipeline de ejemplo para el
//! binario `wurzel`.

pub mod demo;

pub use wurzel_backend;
pub use wurzel_cli;
pub use wurzel_core;
pub use wurzel_steps;

pub use wurzel_core::{run_graph, Pipe, StepExecutor, StepGraph, TypedStep};
