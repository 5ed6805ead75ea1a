use geo::Coord;

use super::TOLERANCE;

/// Computes the signed area of a ring (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise. The ring may or may
/// not repeat its first point at the end.
#[must_use]
pub fn signed_ring_area(ring: &[Coord<f64>]) -> f64 {
    let n = ring.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += ring[i].x * ring[j].y - ring[j].x * ring[i].y;
    }
    sum * 0.5
}

/// Returns `true` if the ring winds counter-clockwise.
#[must_use]
pub fn is_ccw(ring: &[Coord<f64>]) -> bool {
    signed_ring_area(ring) > 0.0
}

/// Counts the distinct points of a ring, ignoring the closing repeat.
#[must_use]
pub fn distinct_point_count(ring: &[Coord<f64>]) -> usize {
    let mut distinct: Vec<Coord<f64>> = Vec::with_capacity(ring.len());
    for c in ring {
        let seen = distinct
            .iter()
            .any(|d| (d.x - c.x).abs() < TOLERANCE && (d.y - c.y).abs() < TOLERANCE);
        if !seen {
            distinct.push(*c);
        }
    }
    distinct.len()
}

/// Returns the component-wise minimum over all coordinates, or `None` if empty.
#[must_use]
pub fn min_corner<'a>(coords: impl IntoIterator<Item = &'a Coord<f64>>) -> Option<Coord<f64>> {
    coords.into_iter().fold(None, |acc, c| match acc {
        None => Some(*c),
        Some(m) => Some(Coord {
            x: m.x.min(c.x),
            y: m.y.min(c.y),
        }),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn c(x: f64, y: f64) -> Coord<f64> {
        Coord { x, y }
    }

    #[test]
    fn signed_area_ccw_square() {
        let ring = [c(0.0, 0.0), c(1.0, 0.0), c(1.0, 1.0), c(0.0, 1.0)];
        assert!((signed_ring_area(&ring) - 1.0).abs() < TOLERANCE);
        assert!(is_ccw(&ring));
    }

    #[test]
    fn signed_area_cw_closed_square() {
        let ring = [
            c(0.0, 0.0),
            c(0.0, 1.0),
            c(1.0, 1.0),
            c(1.0, 0.0),
            c(0.0, 0.0),
        ];
        assert!((signed_ring_area(&ring) + 1.0).abs() < TOLERANCE);
        assert!(!is_ccw(&ring));
    }

    #[test]
    fn distinct_ignores_closing_point() {
        let ring = [c(0.0, 0.0), c(1.0, 0.0), c(1.0, 1.0), c(0.0, 0.0)];
        assert_eq!(distinct_point_count(&ring), 3);
    }

    #[test]
    fn distinct_detects_collapsed_ring() {
        let ring = [c(2.0, 2.0), c(3.0, 2.0), c(2.0, 2.0), c(3.0, 2.0)];
        assert_eq!(distinct_point_count(&ring), 2);
    }

    #[test]
    fn min_corner_over_coords() {
        let coords = [c(5.0, -1.0), c(-2.0, 4.0), c(3.0, 3.0)];
        let m = min_corner(&coords).unwrap();
        assert!((m.x + 2.0).abs() < TOLERANCE);
        assert!((m.y + 1.0).abs() < TOLERANCE);
        assert!(min_corner(&[] as &[Coord<f64>]).is_none());
    }
}
