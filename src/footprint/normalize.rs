use geo::{Coord, LineString, Polygon};

use crate::error::GeometryError;
use crate::math::polygon_2d::{distinct_point_count, is_ccw};

/// Converts the raw rings of one polygon part into a canonical footprint.
///
/// The result has a clockwise outer ring and counter-clockwise holes,
/// whatever the input winding. With an origin set, every coordinate is
/// translated by minus the origin first.
pub struct NormalizeFootprint<'a> {
    rings: &'a [Vec<Coord<f64>>],
    origin: Option<Coord<f64>>,
    source: (usize, usize),
}

impl<'a> NormalizeFootprint<'a> {
    /// `source` is the `(feature, part)` the rings came from.
    #[must_use]
    pub fn new(rings: &'a [Vec<Coord<f64>>], source: (usize, usize)) -> Self {
        Self {
            rings,
            origin: None,
            source,
        }
    }

    /// Translates the footprint so `origin` maps to `(0, 0)`.
    #[must_use]
    pub fn with_origin(mut self, origin: Option<Coord<f64>>) -> Self {
        self.origin = origin;
        self
    }

    /// Executes the normalisation.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::MissingOuterRing`] for a part without rings and
    /// [`GeometryError::DegenerateRing`] for a ring with fewer than 3 distinct
    /// points.
    pub fn execute(&self) -> Result<Polygon<f64>, GeometryError> {
        let (feature, part) = self.source;
        let Some((outer, holes)) = self.rings.split_first() else {
            return Err(GeometryError::MissingOuterRing { feature, part });
        };

        let mut outer = self.prepare(outer, 0)?;
        if is_ccw(&outer) {
            outer.reverse();
        }

        let mut interiors = Vec::with_capacity(holes.len());
        for (i, hole) in holes.iter().enumerate() {
            let mut hole = self.prepare(hole, i + 1)?;
            if !is_ccw(&hole) {
                hole.reverse();
            }
            interiors.push(LineString::from(hole));
        }

        Ok(Polygon::new(LineString::from(outer), interiors))
    }

    fn prepare(&self, ring: &[Coord<f64>], index: usize) -> Result<Vec<Coord<f64>>, GeometryError> {
        let distinct = distinct_point_count(ring);
        if distinct < 3 {
            let (feature, part) = self.source;
            return Err(GeometryError::DegenerateRing {
                feature,
                part,
                ring: index,
                distinct,
            });
        }
        Ok(match self.origin {
            Some(o) => ring.iter().map(|c| *c - o).collect(),
            None => ring.to_vec(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use geo::Winding;

    fn c(x: f64, y: f64) -> Coord<f64> {
        Coord { x, y }
    }

    fn square(x0: f64, y0: f64, size: f64, ccw: bool) -> Vec<Coord<f64>> {
        let mut ring = vec![
            c(x0, y0),
            c(x0 + size, y0),
            c(x0 + size, y0 + size),
            c(x0, y0 + size),
            c(x0, y0),
        ];
        if !ccw {
            ring.reverse();
        }
        ring
    }

    #[test]
    fn winding_is_canonical_for_every_input_orientation() {
        for outer_ccw in [true, false] {
            for hole_ccw in [true, false] {
                let rings = vec![square(0.0, 0.0, 10.0, outer_ccw), square(2.0, 2.0, 3.0, hole_ccw)];
                let polygon = NormalizeFootprint::new(&rings, (0, 0)).execute().unwrap();
                assert!(polygon.exterior().is_cw());
                assert!(polygon.interiors()[0].is_ccw());
            }
        }
    }

    #[test]
    fn origin_is_subtracted() {
        let rings = vec![square(100.0, 200.0, 1.0, true)];
        let polygon = NormalizeFootprint::new(&rings, (0, 0))
            .with_origin(Some(c(100.0, 200.0)))
            .execute()
            .unwrap();
        let min_x = polygon.exterior().coords().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let min_y = polygon.exterior().coords().map(|p| p.y).fold(f64::INFINITY, f64::min);
        assert!(min_x.abs() < 1e-12);
        assert!(min_y.abs() < 1e-12);
    }

    #[test]
    fn degenerate_ring_is_reported_with_location() {
        let rings = vec![vec![c(0.0, 0.0), c(1.0, 1.0), c(0.0, 0.0)]];
        let err = NormalizeFootprint::new(&rings, (4, 1)).execute().unwrap_err();
        match err {
            GeometryError::DegenerateRing {
                feature,
                part,
                ring,
                distinct,
            } => {
                assert_eq!((feature, part, ring, distinct), (4, 1, 0, 2));
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn degenerate_hole_names_its_ring() {
        let rings = vec![square(0.0, 0.0, 10.0, true), vec![c(1.0, 1.0), c(1.0, 1.0)]];
        let err = NormalizeFootprint::new(&rings, (0, 0)).execute().unwrap_err();
        assert!(matches!(err, GeometryError::DegenerateRing { ring: 1, .. }));
    }

    #[test]
    fn part_without_rings_is_rejected() {
        let err = NormalizeFootprint::new(&[], (2, 0)).execute().unwrap_err();
        assert!(matches!(err, GeometryError::MissingOuterRing { feature: 2, part: 0 }));
    }
}
