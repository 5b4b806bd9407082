// ============================================================
// Layer 4 — Segmented-Writer Corpus Loader (ONDB layout)
// ============================================================
// Reads a line-based online handwriting corpus laid out as:
//
//   <root>/
//     trainset.txt                       ← manifest: one session id per line
//     ascii/a01/a01-000/a01-000u.txt     ← transcript for the session
//     lineStrokes/a01/a01-000/
//       a01-000u-01.xml                  ← strokes for transcript line 1
//       a01-000u-02.xml                  ← strokes for transcript line 2
//
// Transcript files carry free text, then a "CSR:" marker line and
// a blank line, then one transcription per line.
//
// Stroke files look like:
//   <WhiteboardCaptureSession>
//     <StrokeSet>
//       <Stroke>
//         <Point x="1073" y="1058" time="1163.28"/>
//
// Timestamps are wall-clock seconds with many significant digits,
// so they are parsed as f64 and only narrowed to f32 after the
// line's earliest timestamp has been subtracted.
//
// A transcript or stroke file that cannot be read is logged and
// skipped; the rest of the corpus still loads.
//
// Reference: roxmltree crate documentation
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::data::preprocessor::Preprocessor;
use crate::domain::error::CorpusError;
use crate::domain::ink::{Ink, Stroke, StrokePoint};
use crate::domain::sample::StrokeSample;
use crate::domain::traits::CorpusLoader;

/// Sessions whose transcripts do not match their ink.
const BAD_SESSIONS: &[&str] = &[
    "l07-851z", // missing or extra words
    "p06-804z",
    "g09-310z",
    "a01-004w",
    "h02-037",
    "a04-077",
    "m01-059z",
    "k10-058z",
    "l05-588z",
    "g06-179z",
    "g07-213z",
    "l06-637z",
    "d09-674z",
    "p09-110z",
    "c04-198z",
    "a08-551z", // a page of % signs
];

const CSR_MARKER: &str = "CSR:";

/// Loads one named subset of a segmented-writer corpus.
pub struct OndbLoader {
    /// Corpus root directory
    root: PathBuf,

    /// Manifest name without extension, e.g. "trainset"
    subset: String,

    preprocessor: Preprocessor,
}

impl OndbLoader {
    pub fn new(root: impl Into<PathBuf>, subset: impl Into<String>) -> Self {
        Self {
            root:         root.into(),
            subset:       subset.into(),
            preprocessor: Preprocessor::new(),
        }
    }

    /// "a01-000u" → a01/a01-000
    fn relative_dir(session: &str) -> PathBuf {
        let writer = session.get(..3).unwrap_or(session);
        let form   = session.get(..7).unwrap_or(session);
        Path::new(writer).join(form)
    }

    /// Load every line of one session.
    fn load_session(&self, session: &str) -> Result<Vec<StrokeSample>, CorpusError> {
        let relative    = Self::relative_dir(session);
        let ascii_path  = self.root.join("ascii").join(&relative).join(format!("{session}.txt"));
        let transcripts = read_transcript(&ascii_path)?;

        let stroke_dir = self.root.join("lineStrokes").join(&relative);
        let mut samples = Vec::with_capacity(transcripts.len());

        for (i, line) in transcripts.iter().enumerate() {
            if line.is_empty() {
                continue;
            }

            let xml_path = stroke_dir.join(format!("{session}-{:02}.xml", i + 1));
            match read_stroke_file(&xml_path) {
                Ok(ink) => samples.push(StrokeSample::new(self.preprocessor.clean(line), ink)),
                Err(e) => tracing::warn!("Skipping line {} of {}: {}", i + 1, session, e),
            }
        }

        Ok(samples)
    }
}

impl CorpusLoader for OndbLoader {
    fn load_all(&self) -> Result<Vec<StrokeSample>> {
        let manifest = self.root.join(format!("{}.txt", self.subset));
        let sessions = fs::read_to_string(&manifest)
            .with_context(|| format!("Cannot read manifest '{}'", manifest.display()))?;

        let mut samples = Vec::new();
        for session in sessions.lines().map(str::trim).filter(|s| !s.is_empty()) {
            if BAD_SESSIONS.contains(&session) {
                tracing::info!("Discarding: {}", session);
                continue;
            }

            match self.load_session(session) {
                Ok(lines) => {
                    tracing::debug!("Loaded session {} ({} lines)", session, lines.len());
                    samples.extend(lines);
                }
                Err(e) => tracing::warn!("Skipping session '{}': {}", session, e),
            }
        }

        tracing::info!("Loaded {} lines from subset '{}'", samples.len(), self.subset);
        Ok(samples)
    }
}

/// Read the transcription lines that follow the CSR marker.
fn read_transcript(path: &Path) -> Result<Vec<String>, CorpusError> {
    let text = fs::read_to_string(path).map_err(|source| CorpusError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let marker = lines
        .iter()
        .position(|l| *l == CSR_MARKER)
        .ok_or_else(|| CorpusError::MissingCsrMarker { path: path.to_path_buf() })?;

    // skip the marker and the blank line after it
    Ok(lines
        .iter()
        .skip(marker + 2)
        .map(|l| l.to_string())
        .collect())
}

/// Parse one line's stroke file into zero-based ink.
fn read_stroke_file(path: &Path) -> Result<Ink, CorpusError> {
    let text = fs::read_to_string(path).map_err(|source| CorpusError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let doc = roxmltree::Document::parse(&text).map_err(|source| CorpusError::Xml {
        path: path.to_path_buf(),
        source,
    })?;

    let stroke_set = doc
        .root_element()
        .children()
        .find(|n| n.has_tag_name("StrokeSet"))
        .ok_or_else(|| CorpusError::MissingElement {
            path:    path.to_path_buf(),
            element: "StrokeSet".to_string(),
        })?;

    // (x, y, absolute time) per point, per stroke
    let mut raw: Vec<Vec<(f32, f32, f64)>> = Vec::new();
    for stroke in stroke_set.children().filter(|n| n.has_tag_name("Stroke")) {
        let points = stroke
            .children()
            .filter(|n| n.has_tag_name("Point"))
            .map(|point| {
                let x = attribute(path, point, "x")?.parse::<f32>();
                let y = attribute(path, point, "y")?.parse::<f32>();
                let time = attribute(path, point, "time")?;
                match (x, y, time.parse::<f64>()) {
                    (Ok(x), Ok(y), Ok(t)) => Ok((x, y, t)),
                    _ => Err(CorpusError::InvalidNumber {
                        path:  path.to_path_buf(),
                        value: format!("x={:?} y={:?} time={time}",
                            point.attribute("x"), point.attribute("y")),
                    }),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        raw.push(points);
    }

    let origin = raw
        .iter()
        .flatten()
        .map(|&(_, _, t)| t)
        .fold(f64::INFINITY, f64::min);

    Ok(Ink::new(
        raw.into_iter()
            .map(|points| {
                Stroke::new(
                    points
                        .into_iter()
                        .map(|(x, y, t)| StrokePoint::new(x, y, (t - origin) as f32))
                        .collect(),
                )
            })
            .collect(),
    ))
}

fn attribute<'a>(
    path: &Path,
    node: roxmltree::Node<'a, '_>,
    name: &str,
) -> Result<&'a str, CorpusError> {
    node.attribute(name).ok_or_else(|| CorpusError::MissingAttribute {
        path:      path.to_path_buf(),
        element:   node.tag_name().name().to_string(),
        attribute: name.to_string(),
    })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    const TRANSCRIPT: &str = "\
SEGMENTED TEXT
OCR:

ignored
CSR:

Hello , world
second line
";

    fn stroke_xml(points: &[(f32, f32, &str)]) -> String {
        let points: String = points
            .iter()
            .map(|(x, y, t)| format!("<Point x=\"{x}\" y=\"{y}\" time=\"{t}\"/>"))
            .collect();
        format!(
            "<WhiteboardCaptureSession><StrokeSet><Stroke>{points}</Stroke>\
             <Stroke/>\
             <Stroke><Point x=\"9\" y=\"9\" time=\"1163280001.75\"/></Stroke>\
             </StrokeSet></WhiteboardCaptureSession>"
        )
    }

    /// Write a session's transcript and a stroke file for each of `lines`.
    fn write_session(root: &Path, session: &str, transcript: &str, lines: &[usize]) {
        let relative = OndbLoader::relative_dir(session);

        let ascii = root.join("ascii").join(&relative);
        fs::create_dir_all(&ascii).unwrap();
        fs::write(ascii.join(format!("{session}.txt")), transcript).unwrap();

        let strokes = root.join("lineStrokes").join(&relative);
        fs::create_dir_all(&strokes).unwrap();
        for line in lines {
            fs::write(
                strokes.join(format!("{session}-{line:02}.xml")),
                stroke_xml(&[(1.0, 2.0, "1163280000.25"), (3.0, 4.0, "1163280000.50")]),
            )
            .unwrap();
        }
    }

    fn write_corpus(root: &Path) {
        fs::write(root.join("trainset.txt"), "a01-000u\n  l07-851z  \n\n").unwrap();

        // line 2 has no stroke file and must be skipped
        write_session(root, "a01-000u", TRANSCRIPT, &[1]);

        // complete and loadable, but on the denylist
        write_session(root, "l07-851z", "CSR:\n\nDenied line\n", &[1]);
    }

    #[test]
    fn test_relative_dir() {
        assert_eq!(OndbLoader::relative_dir("a01-000u"), Path::new("a01/a01-000"));
    }

    #[test]
    fn test_loads_clean_zero_based_lines() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path());

        let samples = OndbLoader::new(dir.path(), "trainset").load_all().unwrap();
        assert_eq!(samples.len(), 1);

        let sample = &samples[0];
        assert_eq!(sample.text, "Hello, world");
        assert_eq!(sample.ink.strokes.len(), 2);

        let times: Vec<f32> = sample.ink.points().map(|p| p.t).collect();
        assert_eq!(times, vec![0.0, 0.25, 1.5]);
        assert_eq!(sample.ink.strokes[0].points[1], StrokePoint::new(3.0, 4.0, 0.25));
    }

    #[test]
    fn test_denylisted_session_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path());

        let loader = OndbLoader::new(dir.path(), "trainset");
        assert_eq!(loader.load_session("l07-851z").unwrap().len(), 1);

        let samples = loader.load_all().unwrap();
        assert_eq!(samples.len(), 1);
        assert!(samples.iter().all(|s| s.text != "Denied line"));
    }

    #[test]
    fn test_empty_stroke_element_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path());

        let samples = OndbLoader::new(dir.path(), "trainset").load_all().unwrap();
        assert!(samples[0].ink.strokes.iter().all(|s| !s.points.is_empty()));
    }

    #[test]
    fn test_missing_manifest_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(OndbLoader::new(dir.path(), "nope").load_all().is_err());
    }

    #[test]
    fn test_transcript_without_marker() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.txt");
        fs::write(&path, "no marker here\n").unwrap();
        assert!(matches!(
            read_transcript(&path),
            Err(CorpusError::MissingCsrMarker { .. })
        ));
    }

    #[test]
    fn test_malformed_stroke_file() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.xml");

        fs::write(&path, "<StrokeSet><Stroke>").unwrap();
        assert!(matches!(read_stroke_file(&path), Err(CorpusError::Xml { .. })));

        fs::write(&path, "<Session/>").unwrap();
        assert!(matches!(
            read_stroke_file(&path),
            Err(CorpusError::MissingElement { .. })
        ));

        fs::write(&path, "<S><StrokeSet><Stroke><Point x=\"1\" y=\"2\"/></Stroke></StrokeSet></S>")
            .unwrap();
        assert!(matches!(
            read_stroke_file(&path),
            Err(CorpusError::MissingAttribute { .. })
        ));
    }
}
