//! Persistencia en disco de los contratos (JSON y CSV).
//!
//! `save` recibe la ruta sin extensión; la extensión la decide el contrato.
//! `load` acepta tanto un objeto suelto como un array, de modo que un
//! contrato lista puede leer ficheros escritos por un step de modelo único.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use super::model::DataModel;
use crate::errors::ContractError;

/// Añade `.ext` sin tocar los puntos que ya tenga el nombre.
pub fn with_extension(path: &Path, ext: &str) -> PathBuf {
    let mut raw = path.as_os_str().to_owned();
    raw.push(".");
    raw.push(ext);
    PathBuf::from(raw)
}

pub fn validate_all<'a, T: DataModel>(items: impl IntoIterator<Item = &'a T>) -> Result<(), ContractError> {
    for item in items {
        item.validate()
            .map_err(|message| ContractError::Validation { model: T::model_name().to_string(),
                                                           message })?;
    }
    Ok(())
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<PathBuf, ContractError> {
    let target = with_extension(path, "json");
    let bytes = serde_json::to_vec_pretty(value).map_err(|e| ContractError::Encode { path: target.clone(),
                                                                                   message: e.to_string() })?;
    fs::write(&target, bytes).map_err(|e| ContractError::io(&target, e))?;
    Ok(target)
}

/// Lee un fichero JSON como secuencia de items (objeto => un item).
pub fn read_json_items<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, ContractError> {
    let raw = fs::read(path).map_err(|e| ContractError::io(path, e))?;
    let decode = |message: String| ContractError::Decode { path: path.to_path_buf(),
                                                           message };
    let value: Value = serde_json::from_slice(&raw).map_err(|e| decode(e.to_string()))?;
    match value {
        Value::Array(entries) => entries.into_iter()
                                        .map(|v| serde_json::from_value(v).map_err(|e| decode(e.to_string())))
                                        .collect(),
        single => Ok(vec![serde_json::from_value(single).map_err(|e| decode(e.to_string()))?]),
    }
}

pub fn read_json_all<T: DeserializeOwned>(paths: &[PathBuf]) -> Result<Vec<T>, ContractError> {
    let mut out = Vec::new();
    for p in paths {
        out.extend(read_json_items::<T>(p)?);
    }
    Ok(out)
}

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<PathBuf, ContractError> {
    let target = with_extension(path, "csv");
    let encode = |message: String| ContractError::Encode { path: target.clone(),
                                                           message };
    let mut writer = csv::Writer::from_path(&target).map_err(|e| encode(e.to_string()))?;
    for row in rows {
        writer.serialize(row).map_err(|e| encode(e.to_string()))?;
    }
    writer.flush().map_err(|e| ContractError::io(&target, e))?;
    Ok(target)
}

pub fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, ContractError> {
    let decode = |message: String| ContractError::Decode { path: path.to_path_buf(),
                                                           message };
    let mut reader = csv::Reader::from_path(path).map_err(|e| decode(e.to_string()))?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row.map_err(|e| decode(e.to_string()))?);
    }
    Ok(rows)
}
