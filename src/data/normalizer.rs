// ============================================================
// Layer 4 — Ink Normaliser
// ============================================================
// Brings every flattened sample into one canonical frame so the
// model learns letter shapes, not tablets or writing speeds.
//
// Three steps, in order:
//
//   1. Time repair
//      Timestamps must never run backwards: a point earlier than
//      its predecessor is clamped up to it. A gap longer than
//      pause_threshold is the writer resting, not writing, so the
//      excess is banked as "pause" and subtracted from every later
//      point.
//
//   2. Scale
//      y spans exactly [0, 1]. x uses the same factor (aspect ratio
//      kept), anchored at 0. Time is rescaled so the total duration
//      equals the normalised x-extent, tying time to distance
//      travelled instead of to the tablet clock.
//
//   3. Downsample
//      Points closer than sqrt(min_distance_sq) to the last kept
//      point are dropped. The first point, the last point, and every
//      pen lift are always kept so stroke topology survives.
//
// Reference: Rust Book §13 (Iterators: fold)

use serde::{Deserialize, Serialize};

use crate::domain::error::NormalizeError;
use crate::domain::ink::Point;
use crate::domain::sample::PointSample;

/// Tunables for normalisation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Longest gap kept as writing time; anything beyond is a pause
    pub pause_threshold: f32,

    /// Squared distance below which a point duplicates the last kept one
    pub min_distance_sq: f32,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            pause_threshold: 0.5,
            min_distance_sq: 0.0025,
        }
    }
}

/// Running state of the time-repair fold.
#[derive(Debug, Clone, Copy)]
struct TimeState {
    last_time: f32,
    paused:    f32,
}

/// Step 1: make time monotonic and squeeze out pauses.
pub fn repair_time(points: &[Point], pause_threshold: f32) -> Vec<Point> {
    let Some(first) = points.first() else {
        return Vec::new();
    };

    let start = TimeState { last_time: first.t, paused: 0.0 };
    let (repaired, _) = points.iter().fold(
        (Vec::with_capacity(points.len()), start),
        |(mut out, state), point| {
            let mut t     = (point.t - state.paused).max(state.last_time);
            let mut paused = state.paused;

            let latest = state.last_time + pause_threshold;
            if t > latest {
                paused += t - latest;
                t = latest;
            }

            out.push(Point { t, ..*point });
            (out, TimeState { last_time: t, paused })
        },
    );
    repaired
}

/// Step 2: anchor at the origin, unit height, time tied to x-extent.
pub fn rescale(points: &[Point]) -> Result<Vec<Point>, NormalizeError> {
    let (first, last) = match (points.first(), points.last()) {
        (Some(f), Some(l)) => (f, l),
        _ => return Err(NormalizeError::Empty),
    };

    let (min_x, max_x) = extent(points.iter().map(|p| p.x));
    let (min_y, max_y) = extent(points.iter().map(|p| p.y));

    if max_y == min_y {
        return Err(NormalizeError::DegenerateExtent);
    }

    let scale    = 1.0 / (max_y - min_y);
    let min_t    = first.t;
    let duration = last.t - min_t;

    // A sample drawn in zero time collapses onto t = 0.
    let time_scale = if duration > 0.0 {
        scale * (max_x - min_x) / duration
    } else {
        0.0
    };

    Ok(points
        .iter()
        .map(|p| Point {
            x:   (p.x - min_x) * scale,
            y:   (p.y - min_y) * scale,
            t:   (p.t - min_t) * time_scale,
            pen: p.pen,
        })
        .collect())
}

fn extent(values: impl Iterator<Item = f32>) -> (f32, f32) {
    values.fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

/// Step 3: drop near-duplicate points, never boundaries.
pub fn downsample(points: &[Point], min_distance_sq: f32) -> Vec<Point> {
    let Some((&first, rest)) = points.split_first() else {
        return Vec::new();
    };

    let mut kept = vec![first];
    for (i, point) in rest.iter().enumerate() {
        let is_last = i + 1 == rest.len();
        let last_kept = kept[kept.len() - 1];
        if is_last || point.is_boundary() || point.distance2(&last_kept) > min_distance_sq {
            kept.push(*point);
        }
    }
    kept
}

/// Run all three steps on one point sequence.
pub fn normalize_points(points: &[Point], cfg: &NormalizeConfig) -> Result<Vec<Point>, NormalizeError> {
    let repaired = repair_time(points, cfg.pause_threshold);
    let scaled   = rescale(&repaired)?;
    Ok(downsample(&scaled, cfg.min_distance_sq))
}

/// Normalise a corpus, skipping (and logging) samples that cannot be.
pub fn normalize(samples: Vec<PointSample>, cfg: &NormalizeConfig) -> Vec<PointSample> {
    let total = samples.len();
    let normalized: Vec<PointSample> = samples
        .into_iter()
        .filter_map(|sample| match normalize_points(&sample.ink, cfg) {
            Ok(points) => Some(sample.map_ink(|_| points)),
            Err(e) => {
                tracing::info!("Skipping ({}): {}", e, sample.text);
                None
            }
        })
        .collect();

    tracing::info!("Normalised {} of {} samples", normalized.len(), total);
    normalized
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ink::{PEN_DOWN, PEN_UP};
    use crate::domain::sample::Sample;

    const EPS: f32 = 1e-5;

    fn p(x: f32, y: f32, t: f32, pen: f32) -> Point {
        Point::new(x, y, t, pen)
    }

    fn times(points: &[Point]) -> Vec<f32> {
        points.iter().map(|p| p.t).collect()
    }

    #[test]
    fn test_repair_clamps_reversals() {
        let points = vec![
            p(0.0, 0.0, 1.0, PEN_DOWN),
            p(0.0, 0.0, 1.2, PEN_DOWN),
            p(0.0, 0.0, 1.1, PEN_DOWN),
            p(0.0, 0.0, 1.3, PEN_UP),
        ];
        let repaired = repair_time(&points, 0.5);
        assert_eq!(times(&repaired), vec![1.0, 1.2, 1.2, 1.3]);
    }

    #[test]
    fn test_repair_removes_pauses() {
        let points = vec![
            p(0.0, 0.0, 0.0, PEN_DOWN),
            p(0.0, 0.0, 0.25, PEN_UP),
            p(0.0, 0.0, 3.0, PEN_DOWN),
            p(0.0, 0.0, 3.25, PEN_UP),
        ];
        let repaired = repair_time(&points, 0.5);
        // 3.0 - 0.25 = 2.75 gap, 2.25 of it banked as pause
        let expected = [0.0, 0.25, 0.75, 1.0];
        for (got, want) in times(&repaired).iter().zip(expected) {
            assert!((got - want).abs() < EPS, "{got} != {want}");
        }
    }

    #[test]
    fn test_rescale_unit_height() {
        let points = vec![
            p(3.0, 2.0, 0.0, PEN_DOWN),
            p(7.0, 6.0, 0.2, PEN_DOWN),
            p(11.0, 4.0, 0.4, PEN_UP),
        ];
        let scaled = rescale(&points).unwrap();
        let (min_x, _)     = extent(scaled.iter().map(|p| p.x));
        let (min_y, max_y) = extent(scaled.iter().map(|p| p.y));
        assert!(min_x.abs() < EPS);
        assert!(min_y.abs() < EPS);
        assert!((max_y - 1.0).abs() < EPS);
        // total time = normalised x-extent = 8 / 4
        assert!((scaled[2].t - 2.0).abs() < EPS);
    }

    #[test]
    fn test_rescale_rejects_flat_sample() {
        let points = vec![p(0.0, 1.0, 0.0, PEN_DOWN), p(5.0, 1.0, 0.1, PEN_UP)];
        assert_eq!(rescale(&points), Err(NormalizeError::DegenerateExtent));
        assert_eq!(rescale(&[]), Err(NormalizeError::Empty));
    }

    #[test]
    fn test_rescale_zero_duration() {
        let points = vec![p(0.0, 0.0, 2.0, PEN_DOWN), p(1.0, 1.0, 2.0, PEN_UP)];
        let scaled = rescale(&points).unwrap();
        assert_eq!(times(&scaled), vec![0.0, 0.0]);
    }

    #[test]
    fn test_downsample_keeps_first_last_and_lifts() {
        let points = vec![
            p(0.0, 0.0, 0.0, PEN_DOWN),
            p(0.01, 0.0, 0.0, PEN_DOWN),
            p(0.02, 0.0, 0.0, PEN_UP),
            p(0.03, 0.0, 0.0, PEN_DOWN),
            p(0.5, 0.0, 0.0, PEN_DOWN),
            p(0.51, 0.0, 0.0, PEN_DOWN),
        ];
        let kept = downsample(&points, 0.0025);
        let xs: Vec<f32> = kept.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 0.02, 0.5, 0.51]);
    }

    #[test]
    fn test_two_point_line() {
        let points = vec![p(0.0, 0.0, 0.0, PEN_DOWN), p(10.0, 5.0, 2.0, PEN_UP)];
        let out = normalize_points(&points, &NormalizeConfig::default()).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], p(0.0, 0.0, 0.0, PEN_DOWN));
        assert!((out[1].x - 2.0).abs() < EPS);
        assert!((out[1].y - 1.0).abs() < EPS);
        // the 2s gap shrinks to 0.5s, then stretches to the x-extent
        assert!((out[1].t - 2.0).abs() < EPS);
        assert_eq!(out[1].pen, PEN_UP);
    }

    #[test]
    fn test_normalize_invariants() {
        let points: Vec<Point> = (0..40)
            .map(|i| {
                let f = i as f32;
                let pen = if i % 10 == 9 { PEN_UP } else { PEN_DOWN };
                p(100.0 + f * 3.0, 50.0 + (f * 0.7).sin() * 20.0, 1000.0 + f * 0.03, pen)
            })
            .collect();
        let out = normalize_points(&points, &NormalizeConfig::default()).unwrap();

        let (min_x, _)     = extent(out.iter().map(|p| p.x));
        let (min_y, max_y) = extent(out.iter().map(|p| p.y));
        assert!(min_x.abs() < EPS);
        assert!(min_y.abs() < EPS);
        assert!((max_y - min_y - 1.0).abs() < 1e-4);
        assert!(out.windows(2).all(|w| w[0].t <= w[1].t));
        assert_eq!(out.iter().filter(|p| p.is_boundary()).count(), 4);
    }

    #[test]
    fn test_normalize_skips_degenerate_samples() {
        let samples = vec![
            Sample::new("flat", vec![p(0.0, 1.0, 0.0, PEN_DOWN), p(1.0, 1.0, 0.1, PEN_UP)]),
            Sample::new("ok", vec![p(0.0, 0.0, 0.0, PEN_DOWN), p(1.0, 1.0, 0.1, PEN_UP)]),
        ];
        let out = normalize(samples, &NormalizeConfig::default());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].text, "ok");
    }
}
