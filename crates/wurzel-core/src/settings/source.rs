//! Fuentes de configuración.
//!
//! `EnvConfigSource` adapta el entorno del proceso: es estado global
//! mutable, por lo que dos executors concurrentes sobre él en el mismo
//! proceso no están soportados. `MapConfigSource` mantiene la configuración
//! en memoria y nunca toca el entorno.

use std::sync::{Mutex, MutexGuard};

use super::ConfigSnapshot;

pub trait ConfigSource: Send + Sync {
    fn snapshot(&self) -> ConfigSnapshot;

    fn get(&self, key: &str) -> Option<String> {
        self.snapshot().remove(key)
    }

    /// Superpone `values` hasta que se suelta el guard; al soltarlo la
    /// configuración vuelve a ser exactamente la de antes.
    fn overlay(&self, values: &ConfigSnapshot) -> OverlayGuard<'_>;
}

/// Restaura la configuración anterior al soltarse (también en unwind).
#[must_use = "the overlay is undone as soon as the guard is dropped"]
pub struct OverlayGuard<'a> {
    restore: Option<Box<dyn FnOnce() + 'a>>,
}

impl<'a> OverlayGuard<'a> {
    pub fn new(restore: impl FnOnce() + 'a) -> Self {
        Self { restore: Some(Box::new(restore)) }
    }
}

impl Drop for OverlayGuard<'_> {
    fn drop(&mut self) {
        if let Some(restore) = self.restore.take() {
            restore();
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct EnvConfigSource;

fn env_snapshot() -> ConfigSnapshot {
    std::env::vars_os().filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
                       .collect()
}

impl ConfigSource for EnvConfigSource {
    fn snapshot(&self) -> ConfigSnapshot {
        env_snapshot()
    }

    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn overlay(&self, values: &ConfigSnapshot) -> OverlayGuard<'_> {
        let before = env_snapshot();
        for (k, v) in values {
            std::env::set_var(k, v);
        }
        OverlayGuard::new(move || {
            let now = env_snapshot();
            for k in now.keys() {
                if !before.contains_key(k) {
                    std::env::remove_var(k);
                }
            }
            for (k, v) in &before {
                if now.get(k) != Some(v) {
                    std::env::set_var(k, v);
                }
            }
        })
    }
}

#[derive(Debug, Default)]
pub struct MapConfigSource {
    values: Mutex<ConfigSnapshot>,
}

impl MapConfigSource {
    pub fn new(values: ConfigSnapshot) -> Self {
        Self { values: Mutex::new(values) }
    }

    pub fn from_pairs<K: Into<String>, V: Into<String>>(pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        Self::new(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.lock().insert(key.into(), value.into());
    }

    fn lock(&self) -> MutexGuard<'_, ConfigSnapshot> {
        self.values.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ConfigSource for MapConfigSource {
    fn snapshot(&self) -> ConfigSnapshot {
        self.lock().clone()
    }

    fn overlay(&self, values: &ConfigSnapshot) -> OverlayGuard<'_> {
        let before = {
            let mut current = self.lock();
            let before = current.clone();
            current.extend(values.iter().map(|(k, v)| (k.clone(), v.clone())));
            before
        };
        OverlayGuard::new(move || {
            *self.lock() = before;
        })
    }
}
