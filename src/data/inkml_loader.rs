// ============================================================
// Layer 4 — Trace-Graph Corpus Loader (InkML layout)
// ============================================================
// Reads documents where ink and its interpretation are separate
// graphs inside one XML file:
//
//   <ink>
//     ... <mapping type="identity"/> or
//         <mapping type="affine"><matrix>a b c,d e f,g h i,</matrix></mapping>
//     <trace xml:id="t1">10 20 0, '1 '2 '1, "0 "1 "0</trace>
//     <traceView>
//       <annotation type="type">Textblock</annotation>
//       <traceView>
//         <annotation type="type">Textline</annotation>
//         <annotation type="transcription">Hello</annotation>
//         <traceView traceDataRef="#t1"/>
//
// Trace decoding:
//   The first comma-group is an absolute position. The second is a
//   velocity; every group after that is an acceleration. Positions
//   are rebuilt by integrating in order:
//     velocity += acceleration;  position += velocity
//   Only the first three numbers of a group (x, y, t) are used, and
//   sigil characters are ignored.
//
// Coordinate transform:
//   The matrix is row-major; only its leading 3x3 block is used and
//   it is applied to every (x, y, t) as a column vector.
//
// Lines:
//   Container traceViews are classified by their type annotation.
//   The requested granularity picks (container, line) types, e.g.
//   lines → (Textblock, Textline). Each line's ink is the traces it
//   references, in document order, zero-based on its first point.
//
// Failure policy:
//   - unreadable/malformed document, unknown mapping → log, skip doc
//   - a reference to a trace that does not exist    → abort the load
//
// Reference: roxmltree crate documentation, regex crate documentation

use anyhow::{Context, Result};
use regex::Regex;
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use crate::data::preprocessor::Preprocessor;
use crate::domain::charset;
use crate::domain::error::CorpusError;
use crate::domain::ink::{Ink, Stroke, StrokePoint};
use crate::domain::sample::StrokeSample;
use crate::domain::traits::CorpusLoader;

/// Documents never loaded: the first is listed but absent, the
/// other two hold vertical text.
const SKIPPED_DOCUMENTS: &[&str] = &["856a.inkml", "024.inkml", "227.inkml"];

/// Transcriptions that are nothing but one of these characters.
const PUNCTUATION_ONLY: &str = " .,-'\"";

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Which container/line annotation pair to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Lines,
    Words,
    Table,
}

impl Granularity {
    /// (container type, line type)
    fn node_types(self) -> (&'static str, &'static str) {
        match self {
            Granularity::Lines => ("Textblock", "Textline"),
            Granularity::Words => ("Textblock", "Word"),
            Granularity::Table => ("Table", "Textline"),
        }
    }
}

/// A 3x3 transform applied to (x, y, t) column vectors.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Affine([[f64; 3]; 3]);

impl Affine {
    fn identity() -> Self {
        Affine([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]])
    }

    fn apply(&self, p: [f64; 3]) -> [f64; 3] {
        let m = &self.0;
        [
            m[0][0] * p[0] + m[0][1] * p[1] + m[0][2] * p[2],
            m[1][0] * p[0] + m[1][1] * p[1] + m[1][2] * p[2],
            m[2][0] * p[0] + m[2][1] * p[1] + m[2][2] * p[2],
        ]
    }
}

/// Loads the documents listed in one manifest of a trace-graph corpus.
pub struct InkmlLoader {
    root:         PathBuf,
    manifest:     String,
    granularity:  Granularity,
    preprocessor: Preprocessor,
}

impl InkmlLoader {
    pub fn new(root: impl Into<PathBuf>, manifest: impl Into<String>, granularity: Granularity) -> Self {
        Self {
            root:         root.into(),
            manifest:     manifest.into(),
            granularity,
            preprocessor: Preprocessor::new(),
        }
    }

    fn load_document(&self, path: &Path) -> Result<Vec<StrokeSample>, CorpusError> {
        let text = fs::read_to_string(path).map_err(|source| CorpusError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let doc = roxmltree::Document::parse(&text).map_err(|source| CorpusError::Xml {
            path: path.to_path_buf(),
            source,
        })?;

        let transform = read_transform(path, &doc)?;
        let traces    = read_traces(path, &doc, &transform)?;

        let (container_type, line_type) = self.granularity.node_types();
        let mut samples = Vec::new();

        for container in nodes_of_type(doc.root_element(), container_type) {
            for line in nodes_of_type(container, line_type) {
                if let Some(sample) = self.extract_line(path, line, &traces)? {
                    samples.push(sample);
                }
            }
        }

        Ok(samples)
    }

    /// Build one sample from a line node, or None if it is unusable.
    fn extract_line(
        &self,
        path:   &Path,
        line:   roxmltree::Node,
        traces: &HashMap<String, Vec<[f64; 3]>>,
    ) -> Result<Option<StrokeSample>, CorpusError> {
        let Some(raw) = transcription(line) else {
            return Ok(None);
        };

        let text = raw.trim().replace('\u{b4}', "'");
        if text.is_empty() || text.contains("<Symbol/>") || PUNCTUATION_ONLY.contains(text.as_str()) {
            return Ok(None);
        }

        if charset::first_unknown(&text).is_some() {
            tracing::info!("Invalid character in `{}`", text);
            return Ok(None);
        }

        let mut strokes: Vec<&Vec<[f64; 3]>> = Vec::new();
        for view in line.descendants().filter(|n| is_element(n, "traceView")) {
            let Some(reference) = view.attribute("traceDataRef") else {
                continue;
            };
            let id = reference.get(1..).unwrap_or("");
            let trace = traces.get(id).ok_or_else(|| CorpusError::UnknownTraceRef {
                path: path.to_path_buf(),
                id:   id.to_string(),
            })?;
            strokes.push(trace);
        }

        let Some(origin) = strokes.iter().flat_map(|s| s.iter()).map(|p| p[2]).next() else {
            return Ok(None);
        };

        let ink = Ink::new(
            strokes
                .into_iter()
                .map(|points| {
                    Stroke::new(
                        points
                            .iter()
                            .map(|p| StrokePoint::new(p[0] as f32, p[1] as f32, (p[2] - origin) as f32))
                            .collect(),
                    )
                })
                .collect(),
        );

        Ok(Some(StrokeSample::new(self.preprocessor.clean(&text), ink)))
    }
}

impl CorpusLoader for InkmlLoader {
    fn load_all(&self) -> Result<Vec<StrokeSample>> {
        let manifest = self.root.join(&self.manifest);
        let files = fs::read_to_string(&manifest)
            .with_context(|| format!("Cannot read manifest '{}'", manifest.display()))?;

        let mut samples = Vec::new();
        for file in files.lines().map(str::trim).filter(|f| !f.is_empty()) {
            if SKIPPED_DOCUMENTS.contains(&file) {
                continue;
            }

            let path = self.root.join(file);
            match self.load_document(&path) {
                Ok(lines) => {
                    tracing::debug!("Loaded {} ({} samples)", file, lines.len());
                    samples.extend(lines);
                }
                Err(e) if e.is_integrity() => {
                    return Err(e).context("trace graph is inconsistent");
                }
                Err(e) => tracing::warn!("Skipping document '{}': {}", file, e),
            }
        }

        tracing::info!("Loaded {} samples from '{}'", samples.len(), self.manifest);
        Ok(samples)
    }
}

fn is_element(node: &roxmltree::Node, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name
}

/// Read the document's coordinate mapping.
fn read_transform(path: &Path, doc: &roxmltree::Document) -> Result<Affine, CorpusError> {
    let mapping = doc
        .descendants()
        .find(|n| is_element(n, "mapping"))
        .ok_or_else(|| CorpusError::MissingElement {
            path:    path.to_path_buf(),
            element: "mapping".to_string(),
        })?;

    let kind = mapping.attribute("type").ok_or_else(|| CorpusError::MissingAttribute {
        path:      path.to_path_buf(),
        element:   "mapping".to_string(),
        attribute: "type".to_string(),
    })?;

    match kind {
        "identity" => Ok(Affine::identity()),
        "affine" => {
            let text = mapping
                .descendants()
                .find(|n| is_element(n, "matrix"))
                .and_then(|n| n.text())
                .ok_or_else(|| CorpusError::MissingElement {
                    path:    path.to_path_buf(),
                    element: "matrix".to_string(),
                })?;
            parse_matrix(text).ok_or_else(|| CorpusError::InvalidMatrix {
                path: path.to_path_buf(),
                text: text.to_string(),
            })
        }
        other => Err(CorpusError::UnsupportedMapping {
            path: path.to_path_buf(),
            kind: other.to_string(),
        }),
    }
}

/// Parse "a b c,d e f,g h i," keeping the leading 3x3 block.
fn parse_matrix(text: &str) -> Option<Affine> {
    let rows: Vec<Vec<f64>> = text
        .split(',')
        .map(str::trim)
        .filter(|row| !row.is_empty())
        .map(|row| row.split_whitespace().map(|v| v.parse::<f64>().ok()).collect())
        .collect::<Option<_>>()?;

    if rows.len() < 3 || rows.iter().take(3).any(|r| r.len() < 3) {
        return None;
    }

    let mut m = [[0.0; 3]; 3];
    for (i, row) in rows.iter().take(3).enumerate() {
        m[i].copy_from_slice(&row[..3]);
    }
    Some(Affine(m))
}

/// Decode every top-level trace, keyed by its xml:id.
fn read_traces(
    path:      &Path,
    doc:       &roxmltree::Document,
    transform: &Affine,
) -> Result<HashMap<String, Vec<[f64; 3]>>, CorpusError> {
    let mut traces = HashMap::new();
    for trace in doc.root_element().children().filter(|n| is_element(n, "trace")) {
        let id = trace
            .attribute((XML_NAMESPACE, "id"))
            .ok_or_else(|| CorpusError::MissingAttribute {
                path:      path.to_path_buf(),
                element:   "trace".to_string(),
                attribute: "xml:id".to_string(),
            })?;
        let points = decode_trace(trace.text().unwrap_or(""))
            .map_err(|value| CorpusError::InvalidNumber { path: path.to_path_buf(), value })?;
        traces.insert(id.to_string(), points.into_iter().map(|p| transform.apply(p)).collect());
    }
    Ok(traces)
}

fn number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"-?(?:[0-9]+\.?[0-9]*|\.[0-9]+)").expect("number pattern is valid")
    })
}

/// Integrate a position/velocity/acceleration chain into positions.
/// On failure returns the offending group.
fn decode_trace(text: &str) -> Result<Vec<[f64; 3]>, String> {
    let mut groups = Vec::new();
    for group in text.split(',').filter(|g| !g.trim().is_empty()) {
        let numbers: Vec<f64> = number_pattern()
            .find_iter(group)
            .take(3)
            .map(|m| m.as_str().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|_| group.trim().to_string())?;
        match numbers[..] {
            [x, y, t] => groups.push([x, y, t]),
            _ => return Err(group.trim().to_string()),
        }
    }

    let mut groups = groups.into_iter();
    let Some(mut position) = groups.next() else {
        return Ok(Vec::new());
    };
    let mut points = vec![position];

    if let Some(mut velocity) = groups.next() {
        add(&mut position, &velocity);
        points.push(position);
        for acceleration in groups {
            add(&mut velocity, &acceleration);
            add(&mut position, &velocity);
            points.push(position);
        }
    }
    Ok(points)
}

fn add(acc: &mut [f64; 3], delta: &[f64; 3]) {
    for (a, d) in acc.iter_mut().zip(delta) {
        *a += d;
    }
}

/// Every traceView below `root` whose type annotation equals `kind`.
fn nodes_of_type<'a, 'input>(
    root: roxmltree::Node<'a, 'input>,
    kind: &str,
) -> Vec<roxmltree::Node<'a, 'input>> {
    root.descendants()
        .filter(|n| *n != root && is_element(n, "traceView"))
        .filter(|view| {
            view.children()
                .find(|c| is_element(c, "annotation"))
                .and_then(|a| a.text())
                .map(str::trim)
                == Some(kind)
        })
        .collect()
}

/// The transcription annotation of a line node. Untyped files put it
/// second, right after the type annotation.
fn transcription<'a>(line: roxmltree::Node<'a, '_>) -> Option<&'a str> {
    line.children()
        .find(|c| is_element(c, "annotation") && c.attribute("type") == Some("transcription"))
        .or_else(|| line.children().filter(|c| c.is_element()).nth(1))
        .and_then(|a| a.text())
}
