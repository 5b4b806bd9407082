// ============================================================
// Layer 3 — Domain Errors
// ============================================================
// Typed errors for the failures callers need to tell apart.
// Everything else travels as anyhow::Error with context.
//
//   CodecError      → a character outside the vocabulary
//   CorpusError     → a source file could not be turned into samples
//   NormalizeError  → a sample cannot be normalised
//
// CorpusError::UnknownTraceRef is the odd one out: it means the
// corpus contradicts itself, so loaders abort on it instead of
// logging and moving to the next file.
//
// Reference: thiserror crate documentation
//            Rust Book §9 (Recoverable Errors with Result)

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("unknown character {ch:?} in `{text}`")]
    UnknownCharacter { ch: char, text: String },
}

#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    #[error("cannot read '{path}': {source}")]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed XML in '{path}': {source}")]
    Xml {
        path:   PathBuf,
        #[source]
        source: roxmltree::Error,
    },

    #[error("'{path}' has no <{element}> element")]
    MissingElement { path: PathBuf, element: String },

    #[error("<{element}> in '{path}' is missing attribute '{attribute}'")]
    MissingAttribute {
        path:      PathBuf,
        element:   String,
        attribute: String,
    },

    #[error("invalid number '{value}' in '{path}'")]
    InvalidNumber { path: PathBuf, value: String },

    #[error("affine matrix in '{path}' is not at least 3x3: '{text}'")]
    InvalidMatrix { path: PathBuf, text: String },

    #[error("unsupported mapping type '{kind}' in '{path}'")]
    UnsupportedMapping { path: PathBuf, kind: String },

    #[error("transcript '{path}' has no CSR: marker")]
    MissingCsrMarker { path: PathBuf },

    #[error("'{path}' references unknown trace '{id}'")]
    UnknownTraceRef { path: PathBuf, id: String },
}

impl CorpusError {
    /// True for errors that mean the corpus itself is inconsistent.
    pub fn is_integrity(&self) -> bool {
        matches!(self, CorpusError::UnknownTraceRef { .. })
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NormalizeError {
    #[error("no points to normalise")]
    Empty,

    #[error("zero vertical extent")]
    DegenerateExtent,
}
