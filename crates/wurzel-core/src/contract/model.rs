//! Traits `DataModel` y `Contract`.
//!
//! `DataModel` describe un modelo base serializable. `Contract` es lo que un
//! step declara como input/output: el modelo suelto, o envuelto en un
//! contenedor. Todo contrato se puede ver como una secuencia de items; eso
//! permite fusionar varios ficheros al cargar y trocear batches al guardar
//! con el mismo código para cualquier forma.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use super::descriptor::{Container, ContractDescriptor};
use super::persistence;
use crate::errors::ContractError;

/// Modelo base de datos (un registro).
pub trait DataModel: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Nombre corto del modelo.
    fn model_name() -> &'static str;

    /// Validación semántica ligera, ejecutada antes de persistir.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }

    fn descriptor() -> ContractDescriptor {
        ContractDescriptor::model(Self::model_name(), std::any::type_name::<Self>())
    }
}

/// Contrato declarado por un step.
pub trait Contract: Clone + Send + Sync + 'static {
    type Item: Send + 'static;

    fn descriptor() -> ContractDescriptor;

    fn into_items(self) -> Vec<Self::Item>;

    fn from_items(items: Vec<Self::Item>) -> Result<Self, ContractError>;

    /// Número de resultados que representa el valor (1 para un modelo suelto).
    fn count(&self) -> usize;

    /// Persiste en `path` + extensión del contrato y devuelve la ruta final.
    fn save(&self, path: &Path) -> Result<PathBuf, ContractError>;

    /// Carga y fusiona, en orden, los ficheros dados.
    fn load(paths: &[PathBuf]) -> Result<Self, ContractError>;
}

/// Input de los steps hoja.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoInput;

impl Contract for NoInput {
    type Item = ();

    fn descriptor() -> ContractDescriptor {
        ContractDescriptor::Nothing
    }

    fn into_items(self) -> Vec<()> {
        Vec::new()
    }

    fn from_items(_items: Vec<()>) -> Result<Self, ContractError> {
        Ok(NoInput)
    }

    fn count(&self) -> usize {
        0
    }

    fn save(&self, path: &Path) -> Result<PathBuf, ContractError> {
        Err(ContractError::Encode { path: path.to_path_buf(),
                                    message: "nothing to persist".into() })
    }

    fn load(_paths: &[PathBuf]) -> Result<Self, ContractError> {
        Ok(NoInput)
    }
}

impl<T: DataModel> Contract for Vec<T> {
    type Item = T;

    fn descriptor() -> ContractDescriptor {
        ContractDescriptor::wrap(Container::List, T::descriptor())
    }

    fn into_items(self) -> Vec<T> {
        self
    }

    fn from_items(items: Vec<T>) -> Result<Self, ContractError> {
        Ok(items)
    }

    fn count(&self) -> usize {
        self.len()
    }

    fn save(&self, path: &Path) -> Result<PathBuf, ContractError> {
        persistence::validate_all(self.iter())?;
        persistence::write_json(path, self)
    }

    fn load(paths: &[PathBuf]) -> Result<Self, ContractError> {
        persistence::read_json_all(paths)
    }
}

impl<T: DataModel + Ord> Contract for BTreeSet<T> {
    type Item = T;

    fn descriptor() -> ContractDescriptor {
        ContractDescriptor::wrap(Container::Set, T::descriptor())
    }

    fn into_items(self) -> Vec<T> {
        self.into_iter().collect()
    }

    fn from_items(items: Vec<T>) -> Result<Self, ContractError> {
        Ok(items.into_iter().collect())
    }

    fn count(&self) -> usize {
        self.len()
    }

    fn save(&self, path: &Path) -> Result<PathBuf, ContractError> {
        persistence::validate_all(self.iter())?;
        persistence::write_json(path, self)
    }

    fn load(paths: &[PathBuf]) -> Result<Self, ContractError> {
        Ok(persistence::read_json_all::<T>(paths)?.into_iter().collect())
    }
}
