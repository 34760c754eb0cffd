//! Registro de middlewares por nombre.

use indexmap::IndexMap;

use super::{LoggingMiddleware, Middleware, PrometheusMiddleware};
use crate::constants::MIDDLEWARES_ENV;
use crate::errors::ExecutorError;
use crate::settings::ConfigSource;

pub type MiddlewareFactory = fn(&dyn ConfigSource) -> Result<Box<dyn Middleware>, ExecutorError>;

/// Nombre (en minúsculas) -> constructor. Los nombres desconocidos se
/// registran como warning y se ignoran; los duplicados se construyen todos.
pub struct MiddlewareRegistry {
    factories: IndexMap<String, MiddlewareFactory>,
}

impl Default for MiddlewareRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("prometheus", prometheus_factory);
        registry.register("logging", logging_factory);
        registry
    }
}

fn prometheus_factory(config: &dyn ConfigSource) -> Result<Box<dyn Middleware>, ExecutorError> {
    Ok(Box::new(PrometheusMiddleware::from_config(config)?))
}

fn logging_factory(_config: &dyn ConfigSource) -> Result<Box<dyn Middleware>, ExecutorError> {
    Ok(Box::new(LoggingMiddleware::default()))
}

impl MiddlewareRegistry {
    pub fn empty() -> Self {
        Self { factories: IndexMap::new() }
    }

    pub fn register(&mut self, name: &str, factory: MiddlewareFactory) {
        self.factories.insert(name.to_lowercase(), factory);
    }

    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(&name.to_lowercase())
    }

    /// Construye los middlewares pedidos, en orden.
    pub fn build<N: AsRef<str>>(&self, names: &[N], config: &dyn ConfigSource) -> Result<Vec<Box<dyn Middleware>>, ExecutorError> {
        let mut out = Vec::with_capacity(names.len());
        for name in names {
            let key = name.as_ref().trim().to_lowercase();
            match self.factories.get(&key) {
                Some(factory) => out.push(factory(config)?),
                None => log::warn!("unknown middleware {key:?} skipped (available: {})", self.names().join(", ")),
            }
        }
        Ok(out)
    }

    /// Nombres listados en `MIDDLEWARES` (separados por comas).
    pub fn names_from_config(config: &dyn ConfigSource) -> Vec<String> {
        config.get(MIDDLEWARES_ENV)
              .map(|raw| {
                  raw.split(',')
                     .map(|s| s.trim().to_lowercase())
                     .filter(|s| !s.is_empty())
                     .collect()
              })
              .unwrap_or_default()
    }
}
