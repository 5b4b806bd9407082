// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Handles the cross-cutting file concerns that don't belong to
// any single pipeline stage:
//
//   config_store.rs — Pipeline configuration persistence
//                     Loads the PipelineConfig from JSON, falling
//                     back to defaults for missing keys, and
//                     writes it back out for reproducible runs.
//
//   report.rs       — Evaluation report
//                     Writes per-line decode results (truth,
//                     prediction, error rate) to a CSV file for
//                     later analysis.
//
// The corpus files themselves are the data layer's business
// (data::tensor_codec); this layer only handles the files that
// describe a run.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)

/// Pipeline config saving and loading
pub mod config_store;

/// Per-line evaluation CSV writer
pub mod report;
