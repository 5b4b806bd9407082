// ============================================================
// Layer 4 — Tensor Text Codec
// ============================================================
// The on-disk interchange format shared by every subcommand.
// One sample per line:
//
//   <transcription> TAB <ink>
//
// The ink field has two encodings.
//
// Ragged (stroke samples, 3 channels per point):
//   strokes  separated by ';'
//   points   separated by ','
//   channels separated by ' '
//     hello\t0.000 0.000 0.000,1.000 0.500 0.010;2.000 0.000 0.300
//
// Padded (flattened samples, one row per point):
//   rows     separated by ';'
//   channels separated by ','
//     hello\t0.000,0.000,0.000,1.000;2.000,1.000,2.000,-1.000
//
// Values are written with 3 decimal places.
//
// Reading padded files also accepts the legacy layout where rows
// are separated by ',' and channels by ' '. The rule: a field with
// ';' or without any ' ' is the current layout, otherwise legacy.
// A one-row current field ("x,y,t,pen") therefore stays one row.
//
// An empty stroke field in the ragged layout reads as an empty
// stroke, which Ink::new drops.
//
// A line that does not parse is fatal for the whole file: the
// file is a pipeline artefact, not noisy source data.
//
// Reference: Rust Book §9 (Error Handling), §12 (I/O)

use anyhow::{bail, Context, Result};
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::Path,
};

use crate::domain::ink::{Ink, Point, Stroke, StrokePoint, POINT_CHANNELS};
use crate::domain::sample::{PointSample, Sample, StrokeSample};

/// A sample whose ink is an arbitrary-width row matrix
pub type MatrixSample = Sample<Vec<Vec<f32>>>;

fn format_value(v: f32) -> String {
    format!("{v:.3}")
}

fn parse_value(s: &str) -> Result<f32> {
    s.trim()
        .parse::<f32>()
        .with_context(|| format!("'{s}' is not a number"))
}

// ─── Ragged encoding ──────────────────────────────────────────────────────────

/// Encode stroke ink in the ragged layout.
pub fn format_ink(ink: &Ink) -> String {
    ink.strokes
        .iter()
        .map(|stroke| {
            stroke
                .points
                .iter()
                .map(|p| {
                    p.channels()
                        .iter()
                        .map(|&v| format_value(v))
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect::<Vec<_>>()
        .join(";")
}

/// Decode the ragged layout back into strokes.
pub fn parse_ink(field: &str) -> Result<Ink> {
    let mut strokes = Vec::new();
    for stroke in field.split(';') {
        if stroke.trim().is_empty() {
            continue;
        }
        let mut points = Vec::new();
        for point in stroke.split(',') {
            let values = point
                .split_whitespace()
                .map(parse_value)
                .collect::<Result<Vec<f32>>>()?;
            match values[..] {
                [x, y, t] => points.push(StrokePoint::new(x, y, t)),
                _ => bail!("expected 3 channels per point, found {} in '{point}'", values.len()),
            }
        }
        strokes.push(Stroke::new(points));
    }
    Ok(Ink::new(strokes))
}

// ─── Padded encoding ──────────────────────────────────────────────────────────

/// Encode a row matrix in the padded layout.
pub fn format_rows<R: AsRef<[f32]>>(rows: &[R]) -> String {
    rows.iter()
        .map(|row| {
            row.as_ref()
                .iter()
                .map(|&v| format_value(v))
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect::<Vec<_>>()
        .join(";")
}

/// Decode a row matrix, detecting current vs. legacy separators.
pub fn parse_rows(field: &str) -> Result<Vec<Vec<f32>>> {
    let current = field.contains(';') || !field.contains(' ');
    let (row_sep, value_sep) = if current { (';', ',') } else { (',', ' ') };

    field
        .split(row_sep)
        .map(|row| {
            row.split(value_sep)
                .filter(|v| !v.trim().is_empty())
                .map(parse_value)
                .collect::<Result<Vec<f32>>>()
        })
        .collect()
}

fn rows_to_points(rows: Vec<Vec<f32>>) -> Result<Vec<Point>> {
    rows.iter()
        .map(|row| {
            Point::from_row(row).with_context(|| {
                format!("expected {POINT_CHANNELS} channels per row, found {}", row.len())
            })
        })
        .collect()
}

// ─── Line level ───────────────────────────────────────────────────────────────

fn split_line(line: &str) -> Result<(&str, &str)> {
    let mut fields = line.split('\t');
    match (fields.next(), fields.next(), fields.next()) {
        (Some(text), Some(ink), None) => Ok((text, ink.trim())),
        _ => bail!("expected exactly one tab-separated ink field"),
    }
}

fn read_lines<T>(path: &Path, parse: impl Fn(&str, &str) -> Result<T>) -> Result<Vec<T>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Cannot read '{}'", path.display()))?;

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            split_line(line)
                .and_then(|(text, ink)| parse(text, ink))
                .with_context(|| format!("{}:{}: malformed sample", path.display(), i + 1))
        })
        .collect()
}

fn write_lines<'a>(path: &Path, lines: impl Iterator<Item = (&'a str, String)>) -> Result<usize> {
    let file = File::create(path)
        .with_context(|| format!("Cannot create '{}'", path.display()))?;
    let mut out   = BufWriter::new(file);
    let mut count = 0usize;

    for (text, ink) in lines {
        writeln!(out, "{text}\t{ink}")?;
        count += 1;
    }
    out.flush()?;

    tracing::info!("Wrote {} samples to '{}'", count, path.display());
    Ok(count)
}

/// Save stroke samples in the ragged layout.
pub fn save_inks(path: &Path, samples: &[StrokeSample]) -> Result<usize> {
    write_lines(path, samples.iter().map(|s| (s.text.as_str(), format_ink(&s.ink))))
}

/// Load stroke samples from the ragged layout.
pub fn load_inks(path: &Path) -> Result<Vec<StrokeSample>> {
    read_lines(path, |text, ink| Ok(Sample::new(text, parse_ink(ink)?)))
}

/// Save flattened samples in the padded layout.
pub fn save_tensors(path: &Path, samples: &[PointSample]) -> Result<usize> {
    write_lines(
        path,
        samples.iter().map(|s| {
            let rows: Vec<[f32; POINT_CHANNELS]> = s.ink.iter().map(Point::channels).collect();
            (s.text.as_str(), format_rows(&rows))
        }),
    )
}

/// Load flattened 4-channel samples (either padded layout).
pub fn load_tensors(path: &Path) -> Result<Vec<PointSample>> {
    read_lines(path, |text, ink| {
        Ok(Sample::new(text, rows_to_points(parse_rows(ink)?)?))
    })
}

/// Load samples whose rows may have any width, e.g. model outputs.
pub fn load_matrices(path: &Path) -> Result<Vec<MatrixSample>> {
    read_lines(path, |text, ink| Ok(Sample::new(text, parse_rows(ink)?)))
}
