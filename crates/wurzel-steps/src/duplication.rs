//! Eliminación de documentos duplicados.

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::Value;
use wurzel_core::errors::StepError;
use wurzel_core::step::{StepOutput, TypedStep};
use wurzel_core::Settings;

use crate::contracts::MarkdownDataContract;

/// Campo comodín: compara el registro completo.
pub const ALL_FIELDS: &str = "*";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct DropSettings {
    #[serde(default = "default_fields")]
    pub drop_by_fields: Vec<String>,
}

fn default_fields() -> Vec<String> {
    vec!["md".to_string()]
}

impl Default for DropSettings {
    fn default() -> Self {
        Self { drop_by_fields: default_fields() }
    }
}

impl Settings for DropSettings {}

/// Descarta los documentos repetidos según `DROP_BY_FIELDS`, conservando la
/// primera aparición.
#[derive(Debug, Clone)]
pub struct DropDuplicationStep {
    pub settings: DropSettings,
}

impl DropDuplicationStep {
    fn key(&self, doc: &MarkdownDataContract) -> Result<String, StepError> {
        let value = serde_json::to_value(doc).map_err(StepError::other)?;
        if self.settings.drop_by_fields.iter().any(|f| f == ALL_FIELDS) {
            return Ok(value.to_string());
        }
        let picked: Vec<&Value> = self.settings
                                      .drop_by_fields
                                      .iter()
                                      .map(|field| value.get(field).unwrap_or(&Value::Null))
                                      .collect();
        serde_json::to_string(&picked).map_err(StepError::other)
    }
}

impl TypedStep for DropDuplicationStep {
    type Settings = DropSettings;
    type Input = Vec<MarkdownDataContract>;
    type Output = Vec<MarkdownDataContract>;

    fn create(settings: Self::Settings) -> Result<Self, StepError> {
        for field in &settings.drop_by_fields {
            let known = matches!(field.as_str(), ALL_FIELDS | "md" | "keywords" | "url");
            if !known {
                return Err(StepError::msg(format!("unknown field in DROP_BY_FIELDS: {field}")));
            }
        }
        Ok(Self { settings })
    }

    fn run(&mut self, input: Self::Input) -> Result<StepOutput<Self::Output>, StepError> {
        let before = input.len();
        let mut seen = HashSet::with_capacity(before);
        let mut kept = Vec::with_capacity(before);
        for doc in input {
            if seen.insert(self.key(&doc)?) {
                kept.push(doc);
            }
        }
        if kept.len() != before {
            log::warn!("dropped duplicates: {} -> {} documents", before, kept.len());
        }
        Ok(StepOutput::Whole(kept))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(md: &str, url: &str) -> MarkdownDataContract {
        MarkdownDataContract { md: md.into(), keywords: "k".into(), url: url.into() }
    }

    fn run_with(fields: &[&str], docs: Vec<MarkdownDataContract>) -> Vec<MarkdownDataContract> {
        let settings = DropSettings { drop_by_fields: fields.iter().map(|f| f.to_string()).collect() };
        let mut step = DropDuplicationStep::create(settings).unwrap();
        match step.run(docs).unwrap() {
            StepOutput::Whole(out) => out,
            StepOutput::Batches(_) => panic!("expected whole output"),
        }
    }

    #[test]
    fn drops_by_md_keeping_first() {
        let out = run_with(&["md"], vec![doc("a", "1"), doc("b", "2"), doc("a", "3")]);
        assert_eq!(out, vec![doc("a", "1"), doc("b", "2")]);
    }

    #[test]
    fn wildcard_compares_whole_record() {
        let out = run_with(&["*"], vec![doc("a", "1"), doc("a", "2"), doc("a", "1")]);
        assert_eq!(out, vec![doc("a", "1"), doc("a", "2")]);
    }

    #[test]
    fn no_duplicates_is_identity() {
        let docs = vec![doc("a", "1"), doc("b", "2")];
        assert_eq!(run_with(&["md", "url"], docs.clone()), docs);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let settings = DropSettings { drop_by_fields: vec!["title".into()] };
        assert!(DropDuplicationStep::create(settings).is_err());
    }

    #[test]
    fn defaults_to_md() {
        assert_eq!(DropSettings::default().drop_by_fields, vec!["md".to_string()]);
    }
}
