//! Macros para declarar modelos de datos sin boilerplate.
//!
//!   use wurzel_core::data_model;
//!   data_model!(Doc { md: String, url: String });

/// Implementa `Contract` para un modelo suelto (un único objeto JSON).
/// El tipo debe implementar `DataModel`.
#[macro_export]
macro_rules! impl_contract {
    ($name:ty) => {
        impl $crate::contract::Contract for $name {
            type Item = $name;

            fn descriptor() -> $crate::contract::ContractDescriptor {
                <$name as $crate::contract::DataModel>::descriptor()
            }

            fn into_items(self) -> Vec<$name> {
                vec![self]
            }

            fn from_items(mut items: Vec<$name>) -> Result<Self, $crate::errors::ContractError> {
                if items.len() != 1 {
                    return Err($crate::errors::ContractError::Cardinality {
                        model: <$name as $crate::contract::DataModel>::model_name().to_string(),
                        found: items.len(),
                    });
                }
                Ok(items.remove(0))
            }

            fn count(&self) -> usize {
                1
            }

            fn save(&self, path: &std::path::Path) -> Result<std::path::PathBuf, $crate::errors::ContractError> {
                $crate::contract::persistence::validate_all(std::iter::once(self))?;
                $crate::contract::persistence::write_json(path, self)
            }

            fn load(paths: &[std::path::PathBuf]) -> Result<Self, $crate::errors::ContractError> {
                let items = $crate::contract::persistence::read_json_all::<$name>(paths)?;
                <Self as $crate::contract::Contract>::from_items(items)
            }
        }
    };
}

/// Declara un struct de datos con derives serde, `DataModel` (nombre = el
/// identificador) y `Contract` de modelo suelto.
///
/// Atributos extra (`#[derive(Eq, PartialOrd, Ord)]`, doc comments) se
/// propagan al struct.
#[macro_export]
macro_rules! data_model {
    ($(#[$meta:meta])* $name:ident { $($(#[$fmeta:meta])* $fname:ident : $fty:ty),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
        pub struct $name { $($(#[$fmeta])* pub $fname: $fty,)+ }

        impl $crate::contract::DataModel for $name {
            fn model_name() -> &'static str {
                stringify!($name)
            }
        }

        $crate::impl_contract!($name);
    };
}
