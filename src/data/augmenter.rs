// ============================================================
// Layer 4 — Partitioner and Augmenter
// ============================================================
// Picks a train/validation partition out of a corpus and, when
// asked, pads it to a target size with jittered copies.
//
// Partitioning is deterministic: sample i goes to a partition by
// i % 5, so the same corpus file always splits the same way.
//
//   "trainset"  → remainders 0, 1, 2
//   "validset"  → remainder  3
//   anything else (or no name) → every sample
//
// Remainder 4 is held out: no subset name selects it on its own.
//
// Oversampling cycles through the partition, appending a copy of
// each sample with a fresh random affine transform applied to all
// of its points:
//
//   x' = sx·x + shear·y        sx, sy, st ∈ [1-j, 1+j]
//   y' = sy·y                  shear      ∈ [-2j, 2j]
//   t' = st·t
//
// The random source is not seeded: every run produces different
// synthetic copies. Tests pass their own seeded RNG.
//
// Reference: rand crate documentation
//            Rust Book §13 (Iterators: cycle, take)

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::ink::{Ink, Stroke, StrokePoint};
use crate::domain::sample::StrokeSample;

/// Tunables for augmentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AugmentConfig {
    /// Relative jitter of the random affine transform
    pub jitter: f32,
}

impl Default for AugmentConfig {
    fn default() -> Self {
        Self { jitter: 0.1 }
    }
}

/// Which samples, by index modulo 5, a subset name selects.
pub fn remainders_for(subset: Option<&str>) -> &'static [usize] {
    match subset {
        Some("trainset") => &[0, 1, 2],
        Some("validset") => &[3],
        _ => &[0, 1, 2, 3, 4],
    }
}

/// Keep only the samples whose index falls in the named subset.
pub fn partition<T>(samples: Vec<T>, subset: Option<&str>) -> Vec<T> {
    let remainders = remainders_for(subset);
    samples
        .into_iter()
        .enumerate()
        .filter(|(i, _)| remainders.contains(&(i % 5)))
        .map(|(_, sample)| sample)
        .collect()
}

/// A near-identity affine transform over (x, y, t).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Jitter {
    pub scale_x: f32,
    pub shear:   f32,
    pub scale_y: f32,
    pub scale_t: f32,
}

impl Jitter {
    /// Draw a random transform with relative jitter `j`.
    pub fn random<R: Rng + ?Sized>(rng: &mut R, j: f32) -> Self {
        Self {
            scale_x: rng.gen_range(1.0 - j..=1.0 + j),
            shear:   rng.gen_range(-2.0 * j..=2.0 * j),
            scale_y: rng.gen_range(1.0 - j..=1.0 + j),
            scale_t: rng.gen_range(1.0 - j..=1.0 + j),
        }
    }

    pub fn apply(&self, p: &StrokePoint) -> StrokePoint {
        StrokePoint {
            x: self.scale_x * p.x + self.shear * p.y,
            y: self.scale_y * p.y,
            t: self.scale_t * p.t,
        }
    }

    pub fn apply_ink(&self, ink: &Ink) -> Ink {
        Ink::new(
            ink.strokes
                .iter()
                .map(|s| Stroke::new(s.points.iter().map(|p| self.apply(p)).collect()))
                .collect(),
        )
    }
}

/// Select a subset and optionally pad it to `target_size`.
///
/// - no target (or 0)        → the partition unchanged
/// - partition ≥ target      → the first `target_size` samples
/// - partition < target      → the partition, then jittered copies
///                             cycling through it until the target
pub fn augment<R: Rng + ?Sized>(
    samples:     Vec<StrokeSample>,
    subset:      Option<&str>,
    target_size: Option<usize>,
    cfg:         &AugmentConfig,
    rng:         &mut R,
) -> Vec<StrokeSample> {
    let mut pairs = partition(samples, subset);
    tracing::info!("Partition '{}' holds {} samples", subset.unwrap_or("all"), pairs.len());

    let target = match target_size {
        Some(n) if n > 0 => n,
        _ => return pairs,
    };

    if pairs.len() >= target {
        pairs.truncate(target);
        return pairs;
    }

    if pairs.is_empty() {
        tracing::warn!("Cannot augment an empty partition up to {} samples", target);
        return pairs;
    }

    let missing = target - pairs.len();
    let copies: Vec<StrokeSample> = pairs
        .iter()
        .cycle()
        .take(missing)
        .map(|sample| {
            let jitter = Jitter::random(&mut *rng, cfg.jitter);
            StrokeSample::new(sample.text.clone(), jitter.apply_ink(&sample.ink))
        })
        .collect();

    tracing::info!("Appended {} augmented samples", copies.len());
    pairs.extend(copies);
    pairs
}
