//! Deserializer sobre los valores de texto de la configuración.
//!
//! El tipo destino decide cómo se lee cada valor: strings y rutas reciben
//! el texto tal cual (`FOLDER_PATH=2024` es la ruta `2024`); números,
//! booleanos, listas y objetos se leen como JSON; un texto que no es JSON
//! válido sigue siendo un string.

use serde::de::value::MapDeserializer;
use serde::de::{DeserializeOwned, Deserializer, IntoDeserializer, Visitor};
use serde::forward_to_deserialize_any;
use serde_json::Value;

use super::ConfigSnapshot;

type Error = serde_json::Error;

/// Valor de configuración sin interpretar.
#[derive(Clone, Copy)]
pub(crate) struct RawValue<'a>(pub &'a str);

impl RawValue<'_> {
    fn json(&self) -> Value {
        match serde_json::from_str::<Value>(self.0) {
            Ok(v) if !v.is_null() => v,
            _ => Value::String(self.0.to_string()),
        }
    }
}

impl<'de> Deserializer<'de> for RawValue<'de> {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        self.json().deserialize_any(visitor)
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_borrowed_str(self.0)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_string(self.0.to_string())
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_borrowed_str(self.0)
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_borrowed_str(self.0)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        if self.0 == "null" {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(self, _name: &'static str, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(self,
                                         name: &'static str,
                                         variants: &'static [&'static str],
                                         visitor: V)
                                         -> Result<V::Value, Error> {
        self.json().deserialize_enum(name, variants, visitor)
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64
        bytes byte_buf unit unit_struct seq tuple tuple_struct map struct ignored_any
    }
}

impl<'de> IntoDeserializer<'de, Error> for RawValue<'de> {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self {
        self
    }
}

/// Decodifica `T` con las claves de `snapshot` como campos.
pub(crate) fn from_snapshot<T: DeserializeOwned>(snapshot: &ConfigSnapshot) -> Result<T, Error> {
    let entries = snapshot.iter().map(|(k, v)| (k.as_str(), RawValue(v.as_str())));
    T::deserialize(MapDeserializer::new(entries))
}
