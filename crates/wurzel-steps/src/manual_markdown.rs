//! Step hoja que carga documentos markdown de una carpeta.

use std::path::PathBuf;

use serde::Deserialize;
use walkdir::WalkDir;
use wurzel_core::errors::StepError;
use wurzel_core::step::{StepOutput, TypedStep};
use wurzel_core::{NoInput, Settings};

use crate::contracts::MarkdownDataContract;

/// Prefijo de la url por defecto de cada documento.
pub const URL_PREFIX: &str = "ManualMarkdownStep/";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct ManualMarkdownSettings {
    pub folder_path: PathBuf,
}

impl Settings for ManualMarkdownSettings {}

/// Lee recursivamente todos los `*.md` bajo `FOLDER_PATH`, en orden de nombre.
#[derive(Debug, Clone)]
pub struct ManualMarkdownStep {
    pub settings: ManualMarkdownSettings,
}

impl TypedStep for ManualMarkdownStep {
    type Settings = ManualMarkdownSettings;
    type Input = NoInput;
    type Output = Vec<MarkdownDataContract>;

    fn create(settings: Self::Settings) -> Result<Self, StepError> {
        Ok(Self { settings })
    }

    fn run(&mut self, _input: NoInput) -> Result<StepOutput<Self::Output>, StepError> {
        let mut docs = Vec::new();
        for entry in WalkDir::new(&self.settings.folder_path).follow_links(false).sort_by_file_name() {
            let entry = entry.map_err(StepError::other)?;
            let is_md = entry.path().extension().is_some_and(|ext| ext == "md");
            if entry.file_type().is_file() && is_md {
                docs.push(MarkdownDataContract::from_file(entry.path(), URL_PREFIX)?);
            }
        }
        log::info!("loaded {} markdown files from {}", docs.len(), self.settings.folder_path.display());
        Ok(StepOutput::Whole(docs))
    }
}
