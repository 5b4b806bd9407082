// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The seams where one implementation can be swapped for another.
//
//   CorpusLoader  → OndbLoader   (segmented-writer line corpus)
//                 → InkmlLoader  (trace/annotation-graph corpus)
//
// The two corpus schemas have nothing in common beyond their
// output, so the trait only fixes the output. Each loader parses
// its own format in its own module.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::sample::StrokeSample;

// ─── CorpusLoader ─────────────────────────────────────────────────────────────
/// Anything that can read a raw handwriting corpus into samples.
///
/// A file that cannot be parsed is logged and skipped. An error is
/// returned only when the corpus cannot be read at all (missing
/// manifest) or contradicts itself (dangling trace reference).
pub trait CorpusLoader {
    /// Load every sample the corpus subset describes, in corpus order.
    fn load_all(&self) -> Result<Vec<StrokeSample>>;
}
