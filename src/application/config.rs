// ============================================================
// Layer 2 — Pipeline Configuration
// ============================================================
// Every tunable of every stage, in one serialisable struct.
//
// The defaults reproduce the constants the corpora were prepared
// with, so running without a config file gives the standard
// pipeline. A JSON file only needs the keys it changes:
//
//   { "normalize": { "min_distance_sq": 0.001 } }
//
// #[serde(default)] on each struct fills the missing keys from
// Default::default().
//
// Reference: serde documentation (Field and container attributes)

use serde::{Deserialize, Serialize};

use crate::data::{
    augmenter::AugmentConfig,
    normalizer::NormalizeConfig,
    validator::{AuditConfig, FilterConfig},
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Post-load sample filter
    pub filter:    FilterConfig,

    /// Time repair, rescale and downsampling
    pub normalize: NormalizeConfig,

    /// Jitter for oversampled copies
    pub augment:   AugmentConfig,

    /// Thresholds of the post-normalisation audit
    pub audit:     AuditConfig,
}
