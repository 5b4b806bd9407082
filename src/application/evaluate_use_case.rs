// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Scores recogniser output against the ground truth:
//
//   Step 1: Load the predictions file          (Layer 4 - data)
//   Step 2: Decode every probability matrix    (Layer 5 - ml)
//   Step 3: Score each decode against its text (Layer 5 - ml)
//   Step 4: Optionally write a CSV report      (Layer 6 - infra)
//
// The predictions file uses the padded tensor layout: the text
// field is the ground truth, each row is one timestep, each value
// the probability of one class. Every row counts as valid, so the
// declared length is the row count.
//
// Reference: Rust Book §13 (Iterators and Closures)

use anyhow::{Context, Result};
use std::path::Path;

use crate::data::tensor_codec;
use crate::infra::report::{EvaluationRow, ReportWriter};
use crate::ml::decoder::{AllowedChars, CtcDecoder, LanguageModel, Uniform};
use crate::ml::scorer;

/// Everything an evaluation run produced.
#[derive(Debug, Clone)]
pub struct EvaluationSummary {
    pub rows:     Vec<EvaluationRow>,

    /// None when the file held no samples
    pub mean_cer: Option<f64>,
}

pub struct EvaluateUseCase {
    decoder: CtcDecoder<Box<dyn LanguageModel>>,
}

impl EvaluateUseCase {
    /// `allowed` restricts beam search to those characters; greedy
    /// decoding ignores it.
    pub fn new(beam_width: usize, allowed: Option<&str>) -> Self {
        let lm: Box<dyn LanguageModel> = match allowed {
            Some(chars) => Box::new(AllowedChars::new(chars.chars())),
            None => Box::new(Uniform),
        };
        Self { decoder: CtcDecoder::with_language_model(beam_width, lm) }
    }

    pub fn execute(&self, predictions: &Path, report: Option<&Path>) -> Result<EvaluationSummary> {
        // ── Step 1: Load ─────────────────────────────────────────────────────
        let samples = tensor_codec::load_matrices(predictions)?;
        tracing::info!(
            "Decoding {} samples with beam width {}",
            samples.len(),
            self.decoder.beam_width()
        );

        // ── Steps 2 + 3: Decode and score ────────────────────────────────────
        let rows = samples
            .iter()
            .enumerate()
            .map(|(i, sample)| -> Result<EvaluationRow> {
                let pred = self
                    .decoder
                    .decode(&sample.ink, sample.ink.len())
                    .with_context(|| format!("Cannot decode sample {} (`{}`)", i, sample.text))?;
                let cer = scorer::cer(&pred, &sample.text);
                Ok(EvaluationRow::new(i, sample.text.clone(), pred, cer))
            })
            .collect::<Result<Vec<_>>>()?;

        let rates: Vec<f64> = rows.iter().map(|r| r.cer).collect();
        let mean_cer = scorer::mean(&rates);

        // ── Step 4: Report ───────────────────────────────────────────────────
        if let Some(path) = report {
            let mut writer = ReportWriter::create(path)?;
            for row in &rows {
                writer.log(row)?;
            }
            let path = writer.finish()?;
            tracing::info!("Wrote evaluation report to '{}'", path.display());
        }

        Ok(EvaluationSummary { rows, mean_cer })
    }
}
