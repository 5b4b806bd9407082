// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates the other layers to accomplish one
// user-facing goal each.
//
// Rules for this layer:
//   - No parsing or transform logic here (that's Layer 4 and 5)
//   - No printing here (that's Layer 1)
//   - Only workflow coordination
//
// Think of this layer as the "director": it tells other layers
// what to do but doesn't do the work itself.
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Tunables shared by every workflow
pub mod config;

// Raw corpus → filtered tensor text file
pub mod convert_use_case;

// Augment / flatten / normalize / delta / audit
pub mod prepare_use_case;

// Decode recogniser output and score it
pub mod evaluate_use_case;
