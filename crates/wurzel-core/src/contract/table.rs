use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::descriptor::{Container, ContractDescriptor};
use super::model::{Contract, DataModel};
use super::persistence;
use crate::errors::ContractError;

/// Contrato tabular: filas planas de `T`, persistidas como CSV.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Table<T>(pub Vec<T>);

impl<T> Table<T> {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T> From<Vec<T>> for Table<T> {
    fn from(rows: Vec<T>) -> Self {
        Table(rows)
    }
}

impl<T: DataModel> Contract for Table<T> {
    type Item = T;

    fn descriptor() -> ContractDescriptor {
        ContractDescriptor::wrap(Container::Table, T::descriptor())
    }

    fn into_items(self) -> Vec<T> {
        self.0
    }

    fn from_items(items: Vec<T>) -> Result<Self, ContractError> {
        Ok(Table(items))
    }

    fn count(&self) -> usize {
        self.0.len()
    }

    fn save(&self, path: &Path) -> Result<PathBuf, ContractError> {
        persistence::validate_all(self.0.iter())?;
        persistence::write_csv(path, &self.0)
    }

    fn load(paths: &[PathBuf]) -> Result<Self, ContractError> {
        let mut rows = Vec::new();
        for p in paths {
            rows.extend(persistence::read_csv::<T>(p)?);
        }
        Ok(Table(rows))
    }
}
