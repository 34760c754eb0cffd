//! Ficheros de values YAML: se fusionan en orden (el último gana clave a
//! clave) y de la sección del backend se elige una entrada por nombre.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use wurzel_core::settings::deep_merge;

use crate::errors::BackendError;

fn load_file(path: &Path) -> Result<Map<String, Value>, BackendError> {
    if !path.exists() {
        return Err(BackendError::values(path, "does not exist"));
    }
    let raw = fs::read_to_string(path).map_err(|source| BackendError::Io { path: path.to_path_buf(),
                                                                            source })?;
    let parsed: Value = serde_yaml::from_str(&raw).map_err(|e| BackendError::values(path, format!("invalid YAML: {e}")))?;
    match parsed {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        _ => Err(BackendError::values(path, "must start with a mapping")),
    }
}

/// Fusión profunda de `files` en orden.
pub fn load_values(files: &[PathBuf]) -> Result<Value, BackendError> {
    let mut merged = Value::Object(Map::new());
    for file in files {
        let data = Value::Object(load_file(file)?);
        merged = deep_merge(&merged, &data);
    }
    Ok(merged)
}

/// Entrada `name` de `values[section]`; sin nombre, la primera; sin
/// entradas, `T::default()`.
pub fn select<T>(values: &Value, section: &str, name: Option<&str>) -> Result<T, BackendError>
    where T: DeserializeOwned + Default
{
    let entries = values.get(section).and_then(Value::as_object);
    let entry = match name {
        Some(name) => entries.and_then(|m| m.get(name))
                             .cloned()
                             .ok_or_else(|| BackendError::NotFound { section: section.to_string(),
                                                                     name: name.to_string() })?,
        None => match entries.and_then(|m| m.values().next()) {
            Some(first) => first.clone(),
            None => return Ok(T::default()),
        },
    };
    let entry = if entry.is_null() { Value::Object(Map::new()) } else { entry };
    serde_json::from_value(entry).map_err(|e| BackendError::InvalidSetting { key: format!("{section}.{}", name.unwrap_or("<first>")),
                                                                             message: e.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase", default)]
    struct Demo {
        data_dir: Option<String>,
        encapsulate_env: Option<bool>,
    }

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let p = dir.join(name);
        fs::write(&p, body).unwrap();
        p
    }

    #[test]
    fn later_files_win_key_by_key() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.yaml", "dvc:\n  test:\n    dataDir: ./data1\n");
        let b = write(dir.path(), "b.yaml", "dvc:\n  test:\n    encapsulateEnv: false\n");
        let values = load_values(&[a, b]).unwrap();
        let demo: Demo = select(&values, "dvc", Some("test")).unwrap();
        assert_eq!(demo, Demo { data_dir: Some("./data1".into()), encapsulate_env: Some(false) });
    }

    #[test]
    fn first_entry_is_the_default_choice() {
        let dir = tempfile::tempdir().unwrap();
        let f = write(dir.path(), "v.yaml", "dvc:\n  zeta:\n    dataDir: ./z\n  alpha:\n    dataDir: ./a\n");
        let values = load_values(&[f]).unwrap();
        let demo: Demo = select(&values, "dvc", None).unwrap();
        assert_eq!(demo.data_dir.as_deref(), Some("./z"));
    }

    #[test]
    fn unknown_name_and_bad_files_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        let f = write(dir.path(), "v.yaml", "dvc: {}\n");
        let values = load_values(&[f]).unwrap();
        assert!(matches!(select::<Demo>(&values, "dvc", Some("nope")), Err(BackendError::NotFound { .. })));
        assert_eq!(select::<Demo>(&values, "dvc", None).unwrap(), Demo::default());

        let list = write(dir.path(), "list.yaml", "- a\n- b\n");
        assert!(matches!(load_values(&[list]), Err(BackendError::ValuesFile { .. })));
        assert!(matches!(load_values(&[dir.path().join("missing.yaml")]), Err(BackendError::ValuesFile { .. })));
    }
}
