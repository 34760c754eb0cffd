//! Steps y modelos compartidos por los tests de integración.
#![allow(dead_code)]

use std::sync::Arc;

use serde::Deserialize;
use wurzel_core::settings::MapConfigSource;
use wurzel_core::{data_model, typed_step};
use wurzel_core::{NoInput, OutputMode, Settings, StepError, StepExecutor, StepOutput, TypedStep};

data_model!(Item { id: u32, text: String });

pub fn items(n: u32) -> Vec<Item> {
    (1..=n).map(|id| Item { id, text: format!("item-{id}") }).collect()
}

typed_step! { leaf TwoItemsStep { output: Vec<Item>, run(_me) { items(2) } } }

typed_step! { step EchoStep { input: Vec<Item>, output: Vec<Item>, run(_me, inp) { inp } } }

typed_step! {
    step TagStep {
        input: Vec<Item>,
        output: Vec<Item>,
        run(_me, inp) {
            inp.into_iter().map(|mut i| { i.text.push_str("-tagged"); i }).collect()
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct BatchSettings {
    pub batches: u32,
    pub size: u32,
}

impl Settings for BatchSettings {}

/// Emite `batches` batches de `size` items (ids consecutivos desde 0).
pub struct BatchStep {
    settings: BatchSettings,
}

impl TypedStep for BatchStep {
    type Settings = BatchSettings;
    type Input = NoInput;
    type Output = Vec<Item>;

    const OUTPUT_MODE: OutputMode = OutputMode::Batched;

    fn create(settings: BatchSettings) -> Result<Self, StepError> {
        Ok(Self { settings })
    }

    fn run(&mut self, _input: NoInput) -> Result<StepOutput<Vec<Item>>, StepError> {
        let (batches, size) = (self.settings.batches, self.settings.size);
        Ok(StepOutput::batches((0..batches).map(move |b| {
                                               Ok((0..size).map(|i| Item { id: b * size + i,
                                                                          text: format!("{b}-{i}") })
                                                           .collect::<Vec<_>>())
                                           })))
    }
}

pub fn map_config(pairs: &[(&str, &str)]) -> Arc<MapConfigSource> {
    Arc::new(MapConfigSource::from_pairs(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string()))))
}

pub fn executor_with(pairs: &[(&str, &str)]) -> StepExecutor {
    StepExecutor::builder().config(map_config(pairs))
                           .build()
                           .expect("executor")
}
