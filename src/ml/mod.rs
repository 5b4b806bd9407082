// ============================================================
// Layer 5 — Recognition Output Layer
// ============================================================
// The recogniser itself lives outside this crate. This layer
// handles what comes back from it:
//
//   decoder.rs — per-timestep class probabilities → text
//                greedy best path, or prefix beam search with
//                an optional language model
//
//   scorer.rs  — decoded text vs. ground truth → character
//                error rate
//
// Both work on plain slices so they can be fed from files, a
// model runtime, or test fixtures alike.
//
// Reference: Graves et al. (2006) Connectionist Temporal Classification

/// CTC greedy and beam decoding
pub mod decoder;

/// Levenshtein distance and character error rate
pub mod scorer;
