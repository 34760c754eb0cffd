//! Descriptores de contrato (variante etiquetada, sin reflexión).

use std::fmt;

use serde::Serialize;

use crate::errors::ContractError;

/// Contenedores soportados alrededor de un modelo base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    List,
    Set,
    Table,
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Container::List => "list",
            Container::Set => "set",
            Container::Table => "table",
        };
        f.write_str(label)
    }
}

/// Referencia a un modelo base: nombre corto para mostrar y ruta completa
/// del tipo para la igualdad.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ModelRef {
    pub name: &'static str,
    pub type_path: &'static str,
}

/// Descriptor estructural de un contrato.
///
/// `Nothing` sólo es válido como input (steps hoja). Se permite construir
/// descriptores mal formados (contenedores anidados, contenedor vacío) para
/// que `unpack` los rechace de forma explícita.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractDescriptor {
    Nothing,
    Model(ModelRef),
    Wrapped {
        container: Container,
        inner: Box<ContractDescriptor>,
    },
}

/// Resultado de desempaquetar un descriptor hasta su modelo base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unpacked {
    pub container: Option<Container>,
    pub base: Option<ModelRef>,
}

impl ContractDescriptor {
    pub fn model(name: &'static str, type_path: &'static str) -> Self {
        ContractDescriptor::Model(ModelRef { name, type_path })
    }

    pub fn wrap(container: Container, inner: ContractDescriptor) -> Self {
        ContractDescriptor::Wrapped { container,
                                      inner: Box::new(inner) }
    }

    pub fn is_nothing(&self) -> bool {
        matches!(self, ContractDescriptor::Nothing)
    }

    pub fn container(&self) -> Option<Container> {
        match self {
            ContractDescriptor::Wrapped { container, .. } => Some(*container),
            _ => None,
        }
    }

    /// Baja a través de como mucho un contenedor hasta el modelo base.
    /// Contenedores anidados o vacíos son declaraciones no soportadas.
    pub fn unpack(&self) -> Result<Unpacked, ContractError> {
        match self {
            ContractDescriptor::Nothing => Ok(Unpacked { container: None, base: None }),
            ContractDescriptor::Model(m) => Ok(Unpacked { container: None,
                                                          base: Some(m.clone()) }),
            ContractDescriptor::Wrapped { container, inner } => match inner.as_ref() {
                ContractDescriptor::Model(m) => Ok(Unpacked { container: Some(*container),
                                                              base: Some(m.clone()) }),
                ContractDescriptor::Nothing => {
                    Err(ContractError::Unsupported(format!("{container} of nothing")))
                }
                nested @ ContractDescriptor::Wrapped { .. } => {
                    Err(ContractError::Unsupported(format!("nested container {container}[{nested}]")))
                }
            },
        }
    }

    /// Extensión de los ficheros que persisten este contrato.
    pub fn file_extension(&self) -> &'static str {
        match self.container() {
            Some(Container::Table) => "csv",
            _ => "json",
        }
    }
}

impl fmt::Display for ContractDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractDescriptor::Nothing => f.write_str("None"),
            ContractDescriptor::Model(m) => f.write_str(m.name),
            ContractDescriptor::Wrapped { container, inner } => write!(f, "{container}[{inner}]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> ContractDescriptor {
        ContractDescriptor::model("Doc", "tests::Doc")
    }

    #[test]
    fn unpack_supported_shapes() {
        assert_eq!(ContractDescriptor::Nothing.unpack().unwrap().base, None);
        let list = ContractDescriptor::wrap(Container::List, doc());
        let u = list.unpack().unwrap();
        assert_eq!(u.container, Some(Container::List));
        assert_eq!(u.base.map(|m| m.name), Some("Doc"));
        assert_eq!(list.to_string(), "list[Doc]");
    }

    #[test]
    fn unpack_rejects_nested_and_empty_containers() {
        let nested = ContractDescriptor::wrap(Container::List, ContractDescriptor::wrap(Container::Set, doc()));
        assert!(matches!(nested.unpack(), Err(ContractError::Unsupported(_))));
        let empty = ContractDescriptor::wrap(Container::Table, ContractDescriptor::Nothing);
        assert!(matches!(empty.unpack(), Err(ContractError::Unsupported(_))));
    }

    #[test]
    fn equality_includes_container() {
        assert_ne!(ContractDescriptor::wrap(Container::List, doc()),
                   ContractDescriptor::wrap(Container::Set, doc()));
        assert_ne!(ContractDescriptor::wrap(Container::List, doc()), doc());
        assert_eq!(ContractDescriptor::wrap(Container::Table, doc()).file_extension(), "csv");
    }
}
