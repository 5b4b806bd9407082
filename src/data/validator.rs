// ============================================================
// Layer 4 — Sample Validator
// ============================================================
// Two independent passes over a corpus:
//
//   1. filter_valid  (after loading, on stroke samples)
//      Drops samples that would poison training:
//        - no ink at all
//        - timestamps that run backwards
//        - a gap between consecutive points longer than max_gap
//          (a capture glitch, not a writer pausing)
//        - a quote isolated by spaces ( " or ' ), which the
//          transcribers used to mark unresolved text
//        - '#', the transcribers' "could not read this" marker
//        - characters outside the vocabulary
//      Every drop is logged with its reason and the text.
//
//   2. audit  (after normalisation, on point samples)
//      Diagnostic only — reports samples that look wrong but
//      keeps them:
//        - too few points for the length of the text
//        - coordinates outside the range normalisation produces
//        - first/last point without the expected pen marks
//
// Reference: Rust Book §6 (Enums and Pattern Matching)

use serde::{Deserialize, Serialize};

use crate::domain::charset;
use crate::domain::error::CodecError;
use crate::domain::ink::Ink;
use crate::domain::sample::{PointSample, StrokeSample};

/// Marker the transcribers used for an unreadable word.
const ERROR_MARKER: char = '#';

// ─── Post-load filter ─────────────────────────────────────────────────────────

/// Thresholds for the post-load filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Longest plausible gap between two consecutive points
    pub max_gap: f32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self { max_gap: 8.0 }
    }
}

/// Why a sample was dropped by the post-load filter.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Rejection {
    #[error("Empty ink")]
    EmptyInk,

    #[error("Time goes backwards! {from} -> {to}")]
    TimeReversal { from: f32, to: f32 },

    #[error("Implausibly long wait between samples! {from} -> {to}")]
    LongPause { from: f32, to: f32 },

    #[error("Suspiciously spaced quote in text: `{text}`")]
    SpacedQuote { text: String },

    #[error("Discarding text containing # (used to represent a transcription error): `{text}`")]
    ErrorMarker { text: String },

    #[error("Invalid character {ch:?} in `{text}`")]
    UnknownCharacter { ch: char, text: String },
}

/// Return the first reason this sample should be dropped, if any.
pub fn check(sample: &StrokeSample, cfg: &FilterConfig) -> Option<Rejection> {
    if sample.ink.is_empty() {
        return Some(Rejection::EmptyInk);
    }

    if let Some(rejection) = check_timing(&sample.ink, cfg.max_gap) {
        return Some(rejection);
    }

    let text = &sample.text;
    if text.contains(" \" ") || text.contains(" ' ") {
        return Some(Rejection::SpacedQuote { text: text.clone() });
    }

    if text.contains(ERROR_MARKER) {
        return Some(Rejection::ErrorMarker { text: text.clone() });
    }

    match charset::encode(text) {
        Err(CodecError::UnknownCharacter { ch, text }) => Some(Rejection::UnknownCharacter { ch, text }),
        Ok(_) => None,
    }
}

fn check_timing(ink: &Ink, max_gap: f32) -> Option<Rejection> {
    let mut points = ink.points();
    let mut last   = points.next()?.t;

    for point in points {
        let t = point.t;
        if t < last {
            return Some(Rejection::TimeReversal { from: last, to: t });
        }
        if t > last + max_gap {
            return Some(Rejection::LongPause { from: last, to: t });
        }
        last = t;
    }
    None
}

/// Keep only samples that pass `check`, logging each rejection.
pub fn filter_valid(samples: Vec<StrokeSample>, cfg: &FilterConfig) -> Vec<StrokeSample> {
    let total = samples.len();
    let valid: Vec<StrokeSample> = samples
        .into_iter()
        .filter(|sample| match check(sample, cfg) {
            Some(reason) => {
                tracing::info!("{}", reason);
                false
            }
            None => true,
        })
        .collect();

    tracing::info!("Kept {} of {} samples after filtering", valid.len(), total);
    valid
}

// ─── Post-normalisation audit ─────────────────────────────────────────────────

/// Bounds for the post-normalisation audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// A sample needs more than this many points per character
    pub min_points_per_char: usize,
    pub max_abs_x:           f32,
    pub max_abs_y:           f32,
    pub max_abs_t:           f32,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            min_points_per_char: 2,
            max_abs_x:           30.0,
            max_abs_y:           2.0,
            max_abs_t:           30.0,
        }
    }
}

/// Something suspicious about a normalised sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finding {
    TooShort { chars: usize, points: usize },
    XOutOfRange,
    YOutOfRange,
    TOutOfRange,
    MissingPenMarks,
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Finding::TooShort { chars, points } => write!(f, "too short [{chars} -> {points}]"),
            Finding::XOutOfRange     => write!(f, "x out of range"),
            Finding::YOutOfRange     => write!(f, "y out of range"),
            Finding::TOutOfRange     => write!(f, "t out of range"),
            Finding::MissingPenMarks => write!(f, "missing pen marks"),
        }
    }
}

/// Everything suspicious about one sample (empty when it looks fine).
pub fn inspect(sample: &PointSample, cfg: &AuditConfig) -> Vec<Finding> {
    let points = &sample.ink;
    let chars  = sample.text.chars().count();
    let mut findings = Vec::new();

    if chars * cfg.min_points_per_char >= points.len() {
        findings.push(Finding::TooShort { chars, points: points.len() });
    }

    if points.iter().any(|p| p.x.abs() > cfg.max_abs_x) {
        findings.push(Finding::XOutOfRange);
    }
    if points.iter().any(|p| p.y.abs() > cfg.max_abs_y) {
        findings.push(Finding::YOutOfRange);
    }
    if points.iter().any(|p| p.t.abs() > cfg.max_abs_t) {
        findings.push(Finding::TOutOfRange);
    }

    let pen_marked = match (points.first(), points.last()) {
        (Some(first), Some(last)) => first.pen >= 0.5 && last.pen <= -0.5,
        _ => false,
    };
    if !pen_marked {
        findings.push(Finding::MissingPenMarks);
    }

    findings
}

/// Audit a whole corpus. Returns (sample index, findings) for every
/// flagged sample; reporting them is left to the caller.
pub fn audit(samples: &[PointSample], cfg: &AuditConfig) -> Vec<(usize, Vec<Finding>)> {
    samples
        .iter()
        .enumerate()
        .map(|(i, sample)| (i, inspect(sample, cfg)))
        .filter(|(_, findings)| !findings.is_empty())
        .collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ink::{Point, Stroke, StrokePoint, PEN_DOWN, PEN_UP};
    use crate::domain::sample::Sample;

    fn stroke_sample(text: &str, times: &[f32]) -> StrokeSample {
        let points = times
            .iter()
            .enumerate()
            .map(|(i, &t)| StrokePoint::new(i as f32, i as f32, t))
            .collect();
        Sample::new(text, Ink::new(vec![Stroke::new(points)]))
    }

    #[test]
    fn test_accepts_clean_sample() {
        let sample = stroke_sample("hello", &[0.0, 0.1, 0.2]);
        assert_eq!(check(&sample, &FilterConfig::default()), None);
    }

    #[test]
    fn test_rejects_empty_ink() {
        let sample = Sample::new("hello", Ink::default());
        assert_eq!(check(&sample, &FilterConfig::default()), Some(Rejection::EmptyInk));
    }

    #[test]
    fn test_rejects_time_reversal() {
        let sample = stroke_sample("hello", &[0.0, 0.5, 0.4]);
        assert!(matches!(
            check(&sample, &FilterConfig::default()),
            Some(Rejection::TimeReversal { .. })
        ));
    }

    #[test]
    fn test_rejects_long_pause() {
        let sample = stroke_sample("hello", &[0.0, 8.5]);
        assert!(matches!(
            check(&sample, &FilterConfig::default()),
            Some(Rejection::LongPause { .. })
        ));
        // exactly max_gap is still plausible
        let sample = stroke_sample("hello", &[0.0, 8.0]);
        assert_eq!(check(&sample, &FilterConfig::default()), None);
    }

    #[test]
    fn test_rejects_text_artefacts() {
        let cfg = FilterConfig::default();
        assert!(matches!(
            check(&stroke_sample("he said \" hi", &[0.0]), &cfg),
            Some(Rejection::SpacedQuote { .. })
        ));
        assert!(matches!(
            check(&stroke_sample("a ' b", &[0.0]), &cfg),
            Some(Rejection::SpacedQuote { .. })
        ));
        assert!(matches!(
            check(&stroke_sample("the #", &[0.0]), &cfg),
            Some(Rejection::ErrorMarker { .. })
        ));
        assert!(matches!(
            check(&stroke_sample("na\u{ef}ve", &[0.0]), &cfg),
            Some(Rejection::UnknownCharacter { ch: '\u{ef}', .. })
        ));
    }

    #[test]
    fn test_filter_keeps_order() {
        let samples = vec![
            stroke_sample("one", &[0.0, 0.1]),
            stroke_sample("two #", &[0.0, 0.1]),
            stroke_sample("three", &[0.0, 0.1]),
        ];
        let kept = filter_valid(samples, &FilterConfig::default());
        let texts: Vec<&str> = kept.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "three"]);
    }

    fn point_sample(text: &str, n: usize) -> PointSample {
        let mut points: Vec<Point> = (0..n)
            .map(|i| Point::new(i as f32 * 0.1, 0.5, i as f32 * 0.1, PEN_DOWN))
            .collect();
        if let Some(last) = points.last_mut() {
            last.pen = PEN_UP;
        }
        Sample::new(text, points)
    }

    #[test]
    fn test_audit_passes_good_sample() {
        let sample = point_sample("ab", 5);
        assert!(inspect(&sample, &AuditConfig::default()).is_empty());
    }

    #[test]
    fn test_audit_flags_short_sample() {
        let sample = point_sample("abc", 6);
        assert_eq!(
            inspect(&sample, &AuditConfig::default()),
            vec![Finding::TooShort { chars: 3, points: 6 }]
        );
    }

    #[test]
    fn test_audit_flags_range_and_pen_marks() {
        let mut sample = point_sample("a", 5);
        sample.ink[2].y = 3.0;
        sample.ink[4].pen = PEN_DOWN;
        let findings = inspect(&sample, &AuditConfig::default());
        assert!(findings.contains(&Finding::YOutOfRange));
        assert!(findings.contains(&Finding::MissingPenMarks));
        assert!(!findings.contains(&Finding::XOutOfRange));
    }

    #[test]
    fn test_audit_reports_indices() {
        let samples = vec![point_sample("ab", 5), point_sample("abcdef", 5)];
        let flagged = audit(&samples, &AuditConfig::default());
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].0, 1);
    }
}
