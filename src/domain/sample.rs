// ============================================================
// Layer 3 — Sample Domain Type
// ============================================================
// A sample is one transcribed line of handwriting:
//   - the text the writer was asked to write
//   - the ink they produced for it
//
// The ink side changes shape as the pipeline runs, so Sample
// is generic over it:
//
//   StrokeSample = Sample<Ink>         (after loading / augmenting)
//   PointSample  = Sample<Vec<Point>>  (after flattening)
//
// Every stage takes a sample by value and hands back a new one;
// no two stages ever share a sample.
//
// Reference: Rust Book §10 (Generic Data Types)

use serde::{Deserialize, Serialize};

use crate::domain::ink::{Ink, Point};

/// A transcription paired with its ink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample<I> {
    /// The transcribed line, drawn from the fixed vocabulary
    pub text: String,

    /// The pen trajectory for this line
    pub ink: I,
}

impl<I> Sample<I> {
    pub fn new(text: impl Into<String>, ink: I) -> Self {
        Self {
            text: text.into(),
            ink,
        }
    }

    /// Replace the ink, keeping the transcription.
    pub fn map_ink<J>(self, f: impl FnOnce(I) -> J) -> Sample<J> {
        Sample {
            text: self.text,
            ink:  f(self.ink),
        }
    }
}

/// A sample whose ink is still segmented into strokes
pub type StrokeSample = Sample<Ink>;

/// A sample whose ink is a flat, pen-annotated point sequence
pub type PointSample = Sample<Vec<Point>>;

impl StrokeSample {
    /// Flatten the strokes into a pen-annotated point sequence.
    pub fn flatten(self) -> PointSample {
        self.map_ink(|ink| ink.flatten())
    }
}
