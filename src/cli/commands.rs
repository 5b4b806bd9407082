// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines every subcommand and its flags. Each one reads and/or
// writes the tensor text format, so they chain through files:
//
//   ondb-to-text / docdb-to-text → augment → flatten → normalize
//     → validate → to-delta → [external training] → evaluate
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, PathBuf, enums)
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::data::inkml_loader::Granularity;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert a segmented-writer (ONDB) corpus to ragged text
    OndbToText(OndbArgs),

    /// Convert a trace-graph (InkML) corpus to ragged text
    DocdbToText(DocdbArgs),

    /// Select a partition and optionally oversample it
    Augment(AugmentArgs),

    /// Turn strokes into pen-marked point rows
    Flatten(TransformArgs),

    /// Repair time, rescale and downsample point rows
    Normalize(TransformArgs),

    /// Replace absolute coordinates with differences
    ToDelta(TransformArgs),

    /// Report normalised samples that look wrong
    Validate(ValidateArgs),

    /// Decode recogniser output and report the character error rate
    Evaluate(EvaluateArgs),

    /// Write the default pipeline config as JSON
    InitConfig(InitConfigArgs),
}

#[derive(Args, Debug)]
pub struct OndbArgs {
    /// Corpus root directory
    pub root: PathBuf,

    /// Output file
    pub out: PathBuf,

    /// Manifest name without extension (trainset, testset_v, ...)
    #[arg(long, default_value = "trainset")]
    pub subset: String,
}

#[derive(Args, Debug)]
pub struct DocdbArgs {
    /// Corpus root directory
    pub root: PathBuf,

    /// Output file
    pub out: PathBuf,

    /// Manifest file listing the documents
    #[arg(long, default_value = "0.txt")]
    pub subset: String,

    /// Which annotation level becomes one sample
    #[arg(long, value_enum, default_value_t = DataType::Lines)]
    pub data_type: DataType,
}

/// CLI spelling of the extraction granularity
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataType {
    Lines,
    Words,
    Table,
}

/// The data layer never sees clap types.
impl From<DataType> for Granularity {
    fn from(d: DataType) -> Self {
        match d {
            DataType::Lines => Granularity::Lines,
            DataType::Words => Granularity::Words,
            DataType::Table => Granularity::Table,
        }
    }
}

#[derive(Args, Debug)]
pub struct AugmentArgs {
    /// Ragged input file
    pub from: PathBuf,

    /// Ragged output file
    pub to: PathBuf,

    /// trainset or validset; anything else keeps every sample
    #[arg(long)]
    pub subset: Option<String>,

    /// Oversample (or truncate) to exactly this many samples
    #[arg(long)]
    pub target_size: Option<usize>,
}

#[derive(Args, Debug)]
pub struct TransformArgs {
    /// Input file
    pub from: PathBuf,

    /// Output file
    pub to: PathBuf,
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Normalised (padded) file to audit
    pub path: PathBuf,
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Predictions: ground truth TAB per-timestep class probabilities
    pub predictions: PathBuf,

    /// 1 decodes greedily; larger values run a prefix beam search
    #[arg(long, default_value_t = 1)]
    pub beam_width: usize,

    /// Restrict beam search to these characters
    #[arg(long)]
    pub allowed_chars: Option<String>,

    /// Also write a per-line CSV report here
    #[arg(long)]
    pub report: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct InitConfigArgs {
    /// Where to write the config
    #[arg(default_value = "pipeline.json")]
    pub path: PathBuf,
}
