// ============================================================
// Layer 2 — ConvertUseCase
// ============================================================
// Turns a raw corpus into the tensor text format:
//
//   Step 1: Load every sample of the subset   (Layer 4 - data)
//   Step 2: Drop samples that fail the filter (Layer 4 - data)
//   Step 3: Write the survivors, ragged       (Layer 4 - data)
//
// The loader is injected, so the same workflow serves both corpus
// layouts.
//
// Reference: Rust Book §17 (Trait Objects)

use anyhow::{Context, Result};
use std::path::Path;

use crate::data::{tensor_codec, validator};
use crate::data::validator::FilterConfig;
use crate::domain::traits::CorpusLoader;

pub struct ConvertUseCase {
    loader: Box<dyn CorpusLoader>,
    filter: FilterConfig,
}

impl ConvertUseCase {
    pub fn new(loader: Box<dyn CorpusLoader>, filter: FilterConfig) -> Self {
        Self { loader, filter }
    }

    /// Run the conversion and return the number of samples written.
    pub fn execute(&self, out: &Path) -> Result<usize> {
        // ── Step 1: Load ─────────────────────────────────────────────────────
        let samples = self.loader.load_all().context("Failed to load corpus")?;

        // ── Step 2: Filter ───────────────────────────────────────────────────
        let valid = validator::filter_valid(samples, &self.filter);

        // ── Step 3: Persist ──────────────────────────────────────────────────
        tensor_codec::save_inks(out, &valid)
    }
}
