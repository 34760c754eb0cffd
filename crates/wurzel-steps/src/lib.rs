//! wurzel-steps: contratos de datos y steps genéricos reutilizables.
pub mod contracts;
pub mod duplication;
pub mod manual_markdown;

pub use contracts::MarkdownDataContract;
pub use duplication::{DropDuplicationStep, DropSettings};
pub use manual_markdown::{ManualMarkdownSettings, ManualMarkdownStep};
