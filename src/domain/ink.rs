// ============================================================
// Layer 3 — Ink Domain Types
// ============================================================
// The pen trajectory for one transcribed line, in its two shapes:
//
//   Ink (strokes)            → what the corpus loaders produce
//     └── Stroke             → one continuous pen-down segment
//           └── StrokePoint  → (x, y, t)
//
//   Vec<Point> (flattened)   → what normalisation and training consume
//     └── Point              → (x, y, t, pen)
//
// Once strokes are flattened the stroke container disappears:
// a boundary is carried in-band by the sign of `pen`
// (negative = the pen lifts after this point).
//
// Reference: Rust Book §5 (Structs), §8 (Vectors)

use serde::{Deserialize, Serialize};

/// Pen-state for a point in the middle of a stroke.
pub const PEN_DOWN: f32 = 1.0;

/// Pen-state for the last point of a stroke.
pub const PEN_UP: f32 = -1.0;

/// Channels per flattened point: x, y, t, pen.
pub const POINT_CHANNELS: usize = 4;

/// A raw point as read from a corpus file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokePoint {
    pub x: f32,
    pub y: f32,
    pub t: f32,
}

impl StrokePoint {
    pub fn new(x: f32, y: f32, t: f32) -> Self {
        Self { x, y, t }
    }

    /// Channel values in persisted order.
    pub fn channels(&self) -> [f32; 3] {
        [self.x, self.y, self.t]
    }
}

/// An ordered run of points drawn without lifting the pen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub points: Vec<StrokePoint>,
}

impl Stroke {
    pub fn new(points: Vec<StrokePoint>) -> Self {
        Self { points }
    }
}

/// Stroke-segmented ink, as produced by the corpus loaders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ink {
    pub strokes: Vec<Stroke>,
}

impl Ink {
    /// Strokes without points are dropped; they carry no pen movement
    /// and cannot be written in the ragged layout.
    pub fn new(strokes: Vec<Stroke>) -> Self {
        let strokes = strokes.into_iter().filter(|s| !s.points.is_empty()).collect();
        Self { strokes }
    }

    /// True when there is not a single point in any stroke
    pub fn is_empty(&self) -> bool {
        self.strokes.iter().all(|s| s.points.is_empty())
    }

    /// Total number of points across all strokes
    pub fn point_count(&self) -> usize {
        self.strokes.iter().map(|s| s.points.len()).sum()
    }

    /// Iterate every point in temporal order, ignoring stroke boundaries
    pub fn points(&self) -> impl Iterator<Item = &StrokePoint> {
        self.strokes.iter().flat_map(|s| s.points.iter())
    }

    /// Flatten strokes into one point sequence with the pen channel set.
    ///
    /// Every point is pen-down except the final point of each stroke,
    /// which is marked as a lift. Empty strokes contribute nothing.
    pub fn flatten(&self) -> Vec<Point> {
        let mut flat = Vec::with_capacity(self.point_count());
        for stroke in &self.strokes {
            let last = stroke.points.len().saturating_sub(1);
            for (i, p) in stroke.points.iter().enumerate() {
                let pen = if i == last { PEN_UP } else { PEN_DOWN };
                flat.push(Point::new(p.x, p.y, p.t, pen));
            }
        }
        flat
    }
}

/// A flattened, tensor-ready point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x:   f32,
    pub y:   f32,
    pub t:   f32,
    pub pen: f32,
}

impl Point {
    pub fn new(x: f32, y: f32, t: f32, pen: f32) -> Self {
        Self { x, y, t, pen }
    }

    /// Build a point from one row of a persisted tensor.
    /// Returns None unless the row has exactly four channels.
    pub fn from_row(row: &[f32]) -> Option<Self> {
        match *row {
            [x, y, t, pen] => Some(Self { x, y, t, pen }),
            _ => None,
        }
    }

    /// Channel values in persisted order.
    pub fn channels(&self) -> [f32; POINT_CHANNELS] {
        [self.x, self.y, self.t, self.pen]
    }

    /// True when the pen lifts after this point
    pub fn is_boundary(&self) -> bool {
        self.pen < 0.0
    }

    /// Squared planar distance to another point
    pub fn distance2(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn two_strokes() -> Ink {
        Ink::new(vec![
            Stroke::new(vec![
                StrokePoint::new(0.0, 0.0, 0.0),
                StrokePoint::new(1.0, 1.0, 0.1),
            ]),
            Stroke::new(vec![StrokePoint::new(2.0, 0.0, 0.3)]),
        ])
    }

    #[test]
    fn test_flatten_marks_stroke_ends() {
        let flat = two_strokes().flatten();
        let pens: Vec<f32> = flat.iter().map(|p| p.pen).collect();
        assert_eq!(pens, vec![PEN_DOWN, PEN_UP, PEN_UP]);
    }

    #[test]
    fn test_flatten_skips_empty_strokes() {
        let mut ink = two_strokes();
        ink.strokes.insert(1, Stroke::default());
        assert_eq!(ink.flatten().len(), 3);
    }

    #[test]
    fn test_empty_ink() {
        let ink = Ink::new(vec![Stroke::default()]);
        assert!(ink.is_empty());
        assert!(ink.strokes.is_empty());
        assert_eq!(ink.point_count(), 0);
    }

    #[test]
    fn test_new_drops_empty_strokes() {
        let ink = Ink::new(vec![
            Stroke::default(),
            Stroke::new(vec![StrokePoint::new(0.0, 0.0, 0.0)]),
            Stroke::default(),
        ]);
        assert_eq!(ink.strokes.len(), 1);
        assert_eq!(ink.point_count(), 1);
    }

    #[test]
    fn test_point_from_row() {
        assert_eq!(
            Point::from_row(&[1.0, 2.0, 3.0, -1.0]),
            Some(Point::new(1.0, 2.0, 3.0, -1.0))
        );
        assert_eq!(Point::from_row(&[1.0, 2.0, 3.0]), None);
    }
}
