// ============================================================
// Layer 4 — Delta Encoder
// ============================================================
// Replaces absolute x, y, t with the change since the previous
// point. The first point has no predecessor, so its deltas are 0.
//
// pen is left alone: it is a category (down / lift), and a
// difference of two categories means nothing.
//
//   absolute: (0,0,0, 1) (2,1,3, 1) (5,1,4,-1)
//   deltas:   (0,0,0, 1) (2,1,3, 1) (3,0,1,-1)

use crate::domain::ink::Point;
use crate::domain::sample::PointSample;

/// Convert absolute points to first differences.
pub fn to_deltas(points: &[Point]) -> Vec<Point> {
    let mut previous: Option<Point> = None;
    points
        .iter()
        .map(|&point| {
            let delta = match previous {
                Some(prev) => Point {
                    x:   point.x - prev.x,
                    y:   point.y - prev.y,
                    t:   point.t - prev.t,
                    pen: point.pen,
                },
                None => Point { x: 0.0, y: 0.0, t: 0.0, pen: point.pen },
            };
            previous = Some(point);
            delta
        })
        .collect()
}

/// Delta-encode every sample in a corpus.
pub fn encode_corpus(samples: Vec<PointSample>) -> Vec<PointSample> {
    samples
        .into_iter()
        .map(|sample| sample.map_ink(|points| to_deltas(&points)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f32, y: f32, t: f32, pen: f32) -> Point {
        Point::new(x, y, t, pen)
    }

    /// Undo `to_deltas` by cumulative summation from `origin`.
    fn from_deltas(deltas: &[Point], origin: Point) -> Vec<Point> {
        deltas
            .iter()
            .scan(None::<Point>, |acc, d| {
                let next = match *acc {
                    Some(prev) => Point {
                        x:   prev.x + d.x,
                        y:   prev.y + d.y,
                        t:   prev.t + d.t,
                        pen: d.pen,
                    },
                    None => Point { pen: d.pen, ..origin },
                };
                *acc = Some(next);
                Some(next)
            })
            .collect()
    }

    #[test]
    fn test_first_point_is_zeroed() {
        let deltas = to_deltas(&[p(4.0, 5.0, 6.0, 1.0)]);
        assert_eq!(deltas, vec![p(0.0, 0.0, 0.0, 1.0)]);
    }

    #[test]
    fn test_pen_stays_absolute() {
        let points = vec![p(0.0, 0.0, 0.0, 1.0), p(2.0, 1.0, 3.0, 1.0), p(5.0, 1.0, 4.0, -1.0)];
        let deltas = to_deltas(&points);
        assert_eq!(
            deltas,
            vec![p(0.0, 0.0, 0.0, 1.0), p(2.0, 1.0, 3.0, 1.0), p(3.0, 0.0, 1.0, -1.0)]
        );
    }

    #[test]
    fn test_reversible() {
        let points = vec![
            p(1.5, 0.25, 0.0, 1.0),
            p(2.0, 0.5, 0.5, 1.0),
            p(1.0, 0.75, 1.25, -1.0),
            p(4.0, 0.0, 2.0, -1.0),
        ];
        let restored = from_deltas(&to_deltas(&points), points[0]);
        assert_eq!(restored, points);
    }

    #[test]
    fn test_empty() {
        assert!(to_deltas(&[]).is_empty());
        assert!(from_deltas(&[], p(0.0, 0.0, 0.0, 0.0)).is_empty());
    }
}
