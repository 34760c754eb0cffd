//! Settings de steps, backends y middlewares.
//!
//! La resolución parte de una instantánea (`ConfigSnapshot`) de una
//! `ConfigSource` explícita. Los valores son texto y el tipo de cada campo
//! decide cómo se leen: strings y rutas tal cual, números, booleanos, listas
//! y objetos como JSON.
//!
//! Con encapsulación, las claves `PREFIX__KEY` (y un objeto JSON guardado
//! en `PREFIX`) se superponen como `KEY` mientras se validan los settings.

mod merge;
mod raw;
mod source;

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

pub use merge::deep_merge;
pub use source::{ConfigSource, EnvConfigSource, MapConfigSource, OverlayGuard};

use crate::constants::SETTINGS_SEPARATOR;
use crate::errors::SettingsError;
use crate::step::short_type_name;

/// Vista plana clave -> valor de la configuración ambiente.
pub type ConfigSnapshot = BTreeMap<String, String>;

/// Tipo de settings de un step.
///
/// Basta con `#[derive(Deserialize)]` e `impl Settings for T {}`. Los
/// nombres de campo se comparan tal cual (sensible a mayúsculas), por lo que
/// lo habitual es `#[serde(rename_all = "UPPERCASE")]`.
pub trait Settings: DeserializeOwned + Send + 'static {
    /// Nombre del tipo para diagnóstico; `None` si el step no tiene settings.
    fn label() -> Option<&'static str> {
        Some(short_type_name(std::any::type_name::<Self>()))
    }

    fn from_snapshot(snapshot: &ConfigSnapshot) -> Result<Self, SettingsError> {
        decode(snapshot, Self::label().unwrap_or("settings"))
    }
}

/// Marca de los steps sin settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct NoSettings;

impl Settings for NoSettings {
    fn label() -> Option<&'static str> {
        None
    }

    fn from_snapshot(_snapshot: &ConfigSnapshot) -> Result<Self, SettingsError> {
        Ok(NoSettings)
    }
}

/// Decodifica `T` a partir de las claves de `snapshot`.
pub fn decode<T: DeserializeOwned>(snapshot: &ConfigSnapshot, label: &str) -> Result<T, SettingsError> {
    raw::from_snapshot(snapshot).map_err(|e| SettingsError { label: label.to_string(),
                                                             message: e.to_string() })
}

/// Claves de `prefix` sin el prefijo: primero las del objeto JSON guardado
/// en `PREFIX`, luego las `PREFIX__KEY`, que ganan.
pub fn prefixed_view(snapshot: &ConfigSnapshot, prefix: &str) -> ConfigSnapshot {
    let mut view = ConfigSnapshot::new();
    if let Some(Value::Object(blob)) = snapshot.get(prefix).and_then(|raw| serde_json::from_str::<Value>(raw).ok()) {
        for (k, v) in blob {
            let text = match v {
                Value::String(s) => s,
                other => other.to_string(),
            };
            view.insert(k, text);
        }
    }
    let head = format!("{prefix}{SETTINGS_SEPARATOR}");
    for (k, v) in snapshot {
        if let Some(key) = k.strip_prefix(&head) {
            if !key.is_empty() {
                view.insert(key.to_string(), v.clone());
            }
        }
    }
    view
}

/// Resuelve settings con prefijo propio (backends, middlewares):
/// `PROMETHEUS__TEXTFILE` -> campo `TEXTFILE`.
pub fn from_prefixed<T: DeserializeOwned>(source: &dyn ConfigSource, prefix: &str) -> Result<T, SettingsError> {
    decode(&prefixed_view(&source.snapshot(), prefix), prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "UPPERCASE")]
    struct Demo {
        key: String,
        port: u16,
        #[serde(default)]
        flags: Vec<String>,
    }

    fn snap(pairs: &[(&str, &str)]) -> ConfigSnapshot {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn decode_reads_values_by_field_type() {
        let s = snap(&[("KEY", "abc"), ("PORT", "8080"), ("FLAGS", "[\"a\",\"b\"]"), ("PATH", "/bin")]);
        let d: Demo = decode(&s, "Demo").unwrap();
        assert_eq!(d, Demo { key: "abc".into(), port: 8080, flags: vec!["a".into(), "b".into()] });
    }

    #[test]
    fn decode_reports_missing_field() {
        let err = decode::<Demo>(&snap(&[("PORT", "1")]), "Demo").unwrap_err();
        assert_eq!(err.label, "Demo");
        assert!(err.message.contains("KEY"), "message should name the missing field: {}", err.message);
    }

    #[test]
    fn prefixed_view_merges_blob_and_keys() {
        let s = snap(&[("MYSTEP", r#"{"KEY": "blob", "PORT": 1}"#), ("MYSTEP__KEY", "explicit"), ("OTHER__KEY", "x")]);
        let view = prefixed_view(&s, "MYSTEP");
        assert_eq!(view.get("KEY").map(String::as_str), Some("explicit"));
        assert_eq!(view.get("PORT").map(String::as_str), Some("1"));
        assert_eq!(view.len(), 2);
    }
}
