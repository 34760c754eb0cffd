//! Lineage de un artifact en vuelo.
//!
//! Secuencia de nombres cortos de steps (sin el sufijo `Step`) que
//! produjeron un dato. Se renderiza unida por `-` y forma el nombre de los
//! ficheros de salida, lo que mantiene distinguibles las ramas hermanas de un
//! diamante (`A-B-D.json` vs `A-C-D.json`).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{BATCH_SUFFIX, MEMORY_HISTORY};

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct History(Vec<String>);

/// `TestAStep` -> `TestA`. Un nombre que es sólo `Step` se deja intacto.
pub fn short_name(step_name: &str) -> &str {
    match step_name.strip_suffix("Step") {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => step_name,
    }
}

impl History {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Lineage de un input entregado en memoria.
    pub fn memory() -> Self {
        Self(vec![MEMORY_HISTORY.to_string()])
    }

    /// Reconstruye el lineage a partir del nombre de un fichero persistido,
    /// ignorando el sufijo de batch (`A-B_batch0003` -> `A-B`).
    pub fn from_file_stem(stem: &str) -> Self {
        let base = match stem.rfind(BATCH_SUFFIX) {
            Some(idx) if is_batch_index(&stem[idx + BATCH_SUFFIX.len()..]) => &stem[..idx],
            _ => stem,
        };
        Self(base.split('-').filter(|s| !s.is_empty()).map(str::to_string).collect())
    }

    /// Nuevo lineage con el nombre corto de `step_name` al final.
    pub fn with(&self, step_name: &str) -> Self {
        let mut steps = self.0.clone();
        steps.push(short_name(step_name).to_string());
        Self(steps)
    }

    pub fn steps(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn is_batch_index(raw: &str) -> bool {
    !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit())
}

impl fmt::Display for History {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("-"))
    }
}
