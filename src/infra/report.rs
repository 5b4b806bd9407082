// ============================================================
// Layer 6 — Evaluation Report
// ============================================================
// Records one row per evaluated line to a CSV file.
//
// Why a CSV?
//   The console shows the mean error rate; the report keeps the
//   per-line detail so the worst lines can be sorted out and
//   inspected in a spreadsheet afterwards.
//
// Columns:
//   - index:  position of the line in the predictions file
//   - cer:    character error rate of the line
//   - truth:  ground-truth transcription
//   - pred:   decoded text
//
// Example CSV output:
//   index,cer,truth,pred
//   0,0.000000,"hello","hello"
//   1,0.200000,"world","wrld"
//
// Text fields are always quoted, with inner quotes doubled, since
// transcriptions routinely contain commas and quotes.
//
// Reference: RFC 4180 (Common Format for CSV Files)
//            Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

/// The outcome of decoding one line.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationRow {
    pub index: usize,
    pub truth: String,
    pub pred:  String,
    pub cer:   f64,
}

impl EvaluationRow {
    pub fn new(index: usize, truth: impl Into<String>, pred: impl Into<String>, cer: f64) -> Self {
        Self { index, truth: truth.into(), pred: pred.into(), cer }
    }

    /// True if the decode matched the truth exactly.
    pub fn is_exact(&self) -> bool {
        self.cer == 0.0
    }
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Writes evaluation rows to a CSV file.
pub struct ReportWriter {
    path: PathBuf,
    out:  BufWriter<File>,
}

impl ReportWriter {
    /// Create (or truncate) the report and write the header row.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Cannot create report '{}'", path.display()))?;
        let mut out = BufWriter::new(file);
        writeln!(out, "index,cer,truth,pred")?;

        tracing::debug!("Created evaluation report: '{}'", path.display());
        Ok(Self { path: path.to_path_buf(), out })
    }

    /// Append one row.
    pub fn log(&mut self, row: &EvaluationRow) -> Result<()> {
        writeln!(
            self.out,
            "{},{:.6},{},{}",
            row.index,
            row.cer,
            quote(&row.truth),
            quote(&row.pred),
        )?;
        Ok(())
    }

    /// Flush everything written so far to disk.
    pub fn finish(mut self) -> Result<PathBuf> {
        self.out
            .flush()
            .with_context(|| format!("Cannot write report '{}'", self.path.display()))?;
        Ok(self.path)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_is_exact() {
        assert!(EvaluationRow::new(0, "a", "a", 0.0).is_exact());
        assert!(!EvaluationRow::new(0, "a", "b", 1.0).is_exact());
    }

    #[test]
    fn test_report_layout() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");

        let mut report = ReportWriter::create(&path).unwrap();
        report.log(&EvaluationRow::new(0, "hello", "hello", 0.0)).unwrap();
        report.log(&EvaluationRow::new(1, "say \"hi\", ok", "say hi", 0.25)).unwrap();
        assert_eq!(report.finish().unwrap(), path);

        let csv = fs::read_to_string(&path).unwrap();
        assert_eq!(
            csv,
            "index,cer,truth,pred\n\
             0,0.000000,\"hello\",\"hello\"\n\
             1,0.250000,\"say \"\"hi\"\", ok\",\"say hi\"\n"
        );
    }
}
