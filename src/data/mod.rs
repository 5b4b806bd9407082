// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// This layer handles everything from raw corpus files all the
// way to the normalised point sequences a recogniser trains on.
//
// The pipeline flows in this order:
//
//   corpus on disk (segmented-writer or trace-graph XML)
//       │
//       ▼
//   OndbLoader / InkmlLoader → parse ink, attach transcriptions
//       │
//       ▼
//   Preprocessor      → normalise transcription punctuation
//       │
//       ▼
//   validator         → drop samples that cannot be trusted
//       │
//       ▼
//   tensor_codec      → one sample per line on disk
//       │
//       ▼
//   augmenter         → partition, oversample with jitter
//       │
//       ▼
//   Ink::flatten      → strokes become pen-marked points
//       │
//       ▼
//   normalizer        → time repair, rescale, downsample
//       │
//       ▼
//   delta             → point-to-point differences
//
// Every step reads and writes the tensor text format, so each
// one can be run, inspected and re-run on its own.
//
// Reference: Rust Book §13 (Iterators and Closures)

/// Loads the segmented-writer (ONDB) corpus layout
pub mod ondb_loader;

/// Loads the trace-graph (InkML) corpus layout
pub mod inkml_loader;

/// Cleans transcription punctuation and quoting
pub mod preprocessor;

/// Sample filtering and the point-sequence audit
pub mod validator;

/// Time repair, rescaling, downsampling
pub mod normalizer;

/// Delta encoding of point sequences
pub mod delta;

/// Train/validation partitioning and jitter augmentation
pub mod augmenter;

/// The tab-separated tensor text format
pub mod tensor_codec;
