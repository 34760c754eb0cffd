//! Contratos de datos entre steps.
//!
//! Un contrato es un modelo base (`DataModel`) opcionalmente envuelto en un
//! contenedor (`Vec` = list, `BTreeSet` = set, `Table` = table). Dos steps se
//! pueden encadenar sólo si sus descriptores son estructuralmente iguales,
//! incluyendo el contenedor.

pub mod descriptor;
pub mod macros;
pub mod model;
pub mod persistence;
mod table;

pub use descriptor::{Container, ContractDescriptor, ModelRef, Unpacked};
pub use model::{Contract, DataModel, NoInput};
pub use table::Table;
