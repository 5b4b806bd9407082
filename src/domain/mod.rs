// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types that define what the pipeline works on:
// points, strokes, ink, samples, the character vocabulary,
// and the errors that can arise.
//
// Rules for this layer:
//   - NO file I/O
//   - NO XML or text-format parsing
//   - Only plain structs, enums, traits and pure functions
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Point, Stroke and Ink in their stroke and flattened shapes
pub mod ink;

// A transcription paired with its ink
pub mod sample;

// The fixed character vocabulary and its class indices
pub mod charset;

// Typed errors shared across layers
pub mod error;

// Core abstractions (traits) that other layers implement
pub mod traits;
