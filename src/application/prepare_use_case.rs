// ============================================================
// Layer 2 — PrepareUseCase
// ============================================================
// The file-to-file stages that turn a converted corpus into
// training input. Each one reads a tensor text file, runs one
// data-layer transform, and writes the result:
//
//   augment    ragged  → ragged   partition + oversample
//   flatten    ragged  → padded   strokes → pen-marked points
//   normalize  padded  → padded   time repair, rescale, downsample
//   to_delta   padded  → padded   point-to-point differences
//   validate   padded  → report   audit only, nothing written
//
// A typical run: convert → augment → flatten → normalize →
// validate → (optionally) to_delta.
//
// Reference: Rust Book §13 (Iterators and Closures)

use anyhow::Result;
use std::path::Path;

use crate::application::config::PipelineConfig;
use crate::data::{augmenter, delta, normalizer, tensor_codec, validator};
use crate::data::validator::Finding;

/// Outcome of an audit run.
#[derive(Debug, Clone)]
pub struct AuditSummary {
    /// Samples inspected
    pub total:   usize,

    /// (sample index, findings) for every flagged sample
    pub flagged: Vec<(usize, Vec<Finding>)>,
}

pub struct PrepareUseCase {
    config: PipelineConfig,
}

impl PrepareUseCase {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Select a subset and optionally oversample it to `target_size`.
    pub fn augment(
        &self,
        from:        &Path,
        to:          &Path,
        subset:      Option<&str>,
        target_size: Option<usize>,
    ) -> Result<usize> {
        let samples = tensor_codec::load_inks(from)?;
        let mut rng = rand::thread_rng();
        let out = augmenter::augment(samples, subset, target_size, &self.config.augment, &mut rng);
        tensor_codec::save_inks(to, &out)
    }

    /// Flatten stroke samples into pen-marked point sequences.
    pub fn flatten(&self, from: &Path, to: &Path) -> Result<usize> {
        let flat: Vec<_> = tensor_codec::load_inks(from)?
            .into_iter()
            .map(|sample| sample.flatten())
            .collect();
        tensor_codec::save_tensors(to, &flat)
    }

    /// Normalise point sequences; degenerate samples are dropped.
    pub fn normalize(&self, from: &Path, to: &Path) -> Result<usize> {
        let samples = tensor_codec::load_tensors(from)?;
        let normalized = normalizer::normalize(samples, &self.config.normalize);
        tensor_codec::save_tensors(to, &normalized)
    }

    /// Delta-encode point sequences.
    pub fn to_delta(&self, from: &Path, to: &Path) -> Result<usize> {
        let samples = tensor_codec::load_tensors(from)?;
        tensor_codec::save_tensors(to, &delta::encode_corpus(samples))
    }

    /// Audit a normalised corpus without changing it.
    pub fn validate(&self, path: &Path) -> Result<AuditSummary> {
        let samples = tensor_codec::load_tensors(path)?;
        let flagged = validator::audit(&samples, &self.config.audit);
        tracing::info!("{} of {} samples flagged", flagged.len(), samples.len());
        Ok(AuditSummary { total: samples.len(), flagged })
    }
}
