//! Volcado de salidas por batches.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::constants::BATCH_SUFFIX;
use crate::contract::Contract;
use crate::errors::ExecutorError;

/// Acumula items de batches sucesivos y escribe un fichero numerado cada
/// vez que el buffer alcanza `flush_size` items, más uno final con el resto.
/// Sin directorio de salida sólo cuenta.
pub(crate) struct BatchWriter<'a, C: Contract> {
    dir: Option<&'a Path>,
    stem: String,
    flush_size: usize,
    buffer: Vec<C::Item>,
    next_index: usize,
    results: usize,
    save_time: Duration,
    files: Vec<PathBuf>,
}

pub(crate) struct BatchSummary {
    pub results: usize,
    pub save_time: Duration,
    pub files: Vec<PathBuf>,
}

impl<'a, C: Contract> BatchWriter<'a, C> {
    pub fn new(dir: Option<&'a Path>, stem: String, flush_size: usize) -> Self {
        Self { dir,
               stem,
               flush_size: flush_size.max(1),
               buffer: Vec::new(),
               next_index: 0,
               results: 0,
               save_time: Duration::ZERO,
               files: Vec::new() }
    }

    pub fn push(&mut self, batch: C) -> Result<(), ExecutorError> {
        let items = batch.into_items();
        if items.is_empty() {
            return Ok(());
        }
        self.results += items.len();
        self.buffer.extend(items);
        while self.buffer.len() >= self.flush_size {
            let rest = self.buffer.split_off(self.flush_size);
            let chunk = std::mem::replace(&mut self.buffer, rest);
            self.flush(chunk)?;
        }
        Ok(())
    }

    pub fn finish(mut self) -> Result<BatchSummary, ExecutorError> {
        if !self.buffer.is_empty() {
            let chunk = std::mem::take(&mut self.buffer);
            self.flush(chunk)?;
        }
        Ok(BatchSummary { results: self.results,
                          save_time: self.save_time,
                          files: self.files })
    }

    fn flush(&mut self, chunk: Vec<C::Item>) -> Result<(), ExecutorError> {
        let Some(dir) = self.dir else {
            return Ok(());
        };
        let started = Instant::now();
        let path = dir.join(format!("{}{}{:04}", self.stem, BATCH_SUFFIX, self.next_index));
        let written = C::from_items(chunk)?.save(&path)?;
        self.save_time += started.elapsed();
        self.next_index += 1;
        self.files.push(written);
        Ok(())
    }
}
