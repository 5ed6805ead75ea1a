use std::collections::HashMap;

use geo::{Area, LineString, Polygon};
use spade::Triangulation;

use crate::error::MeshError;
use crate::math::{Point3, TOLERANCE};

use super::cdt::{classify_interior_faces, insert_constraint_loop, Cdt};
use super::TriangleMesh;

/// Extrudes a polygon with holes into a closed prism between `z = 0` and
/// `z = height`.
///
/// The caps come from a constrained Delaunay triangulation of all rings; the
/// side walls follow every constraint edge that separates interior from
/// exterior, so the result is watertight by construction. Ring orientation
/// does not matter.
pub struct ExtrudePolygon<'a> {
    polygon: &'a Polygon<f64>,
    height: f64,
}

impl<'a> ExtrudePolygon<'a> {
    #[must_use]
    pub fn new(polygon: &'a Polygon<f64>, height: f64) -> Self {
        Self { polygon, height }
    }

    /// Executes the extrusion.
    ///
    /// Returns `Ok(None)` for a non-positive height or a polygon without area.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::Triangulation`] if rings cross each other.
    #[allow(clippy::cast_possible_truncation)]
    pub fn execute(&self) -> Result<Option<TriangleMesh>, MeshError> {
        if !self.height.is_finite() || self.height <= 0.0 {
            return Ok(None);
        }
        if self.polygon.unsigned_area() < TOLERANCE {
            return Ok(None);
        }

        let mut cdt = Cdt::new();
        insert_ring(&mut cdt, self.polygon.exterior())?;
        for hole in self.polygon.interiors() {
            insert_ring(&mut cdt, hole)?;
        }

        let interior = classify_interior_faces(&cdt);
        if interior.is_empty() {
            return Ok(None);
        }

        let mut mesh = TriangleMesh::default();
        // CDT vertex index -> bottom index; the top copy follows at +1
        let mut vertex_map: HashMap<usize, u32> = HashMap::new();
        let mut level = |cdt_index: usize, x: f64, y: f64, mesh: &mut TriangleMesh| -> u32 {
            *vertex_map.entry(cdt_index).or_insert_with(|| {
                let idx = mesh.vertices.len() as u32;
                mesh.vertices.push(Point3::new(x, y, 0.0));
                mesh.vertices.push(Point3::new(x, y, self.height));
                idx
            })
        };

        for face in cdt.inner_faces() {
            if !interior.contains(&face.fix().index()) {
                continue;
            }
            let [v0, v1, v2] = face.vertices().map(|v| {
                let pos = v.position();
                level(v.fix().index(), pos.x, pos.y, &mut mesh)
            });
            mesh.indices.push([v0 + 1, v1 + 1, v2 + 1]);
            mesh.indices.push([v0, v2, v1]);
        }

        for edge in cdt.directed_edges() {
            let inside_left = edge
                .face()
                .as_inner()
                .is_some_and(|f| interior.contains(&f.fix().index()));
            let inside_right = edge
                .rev()
                .face()
                .as_inner()
                .is_some_and(|f| interior.contains(&f.fix().index()));
            if !inside_left || inside_right {
                continue;
            }
            let from = edge.from();
            let to = edge.to();
            let (fp, tp) = (from.position(), to.position());
            let bf = level(from.fix().index(), fp.x, fp.y, &mut mesh);
            let bt = level(to.fix().index(), tp.x, tp.y, &mut mesh);
            mesh.indices.push([bf, bt, bt + 1]);
            mesh.indices.push([bf, bt + 1, bf + 1]);
        }

        Ok(Some(mesh))
    }
}

/// Inserts a ring without its closing repeat.
fn insert_ring(cdt: &mut Cdt, ring: &LineString<f64>) -> Result<(), MeshError> {
    let mut points: Vec<(f64, f64)> = ring.coords().map(|c| (c.x, c.y)).collect();
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    insert_constraint_loop(cdt, &points)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mesh::is_volume;
    use approx::assert_relative_eq;
    use geo::polygon;

    #[test]
    fn square_prism_is_closed() {
        let square = polygon![(x: 0.0, y: 0.0), (x: 2.0, y: 0.0), (x: 2.0, y: 2.0), (x: 0.0, y: 2.0)];
        let mesh = ExtrudePolygon::new(&square, 10.0).execute().unwrap().unwrap();
        assert_eq!(mesh.vertices.len(), 8);
        assert_eq!(mesh.indices.len(), 12);
        assert_relative_eq!(mesh.volume(), 40.0, epsilon = 1e-9);
        assert!(is_volume(&mesh));
    }

    #[test]
    fn clockwise_ring_still_faces_outward() {
        let square = polygon![(x: 0.0, y: 0.0), (x: 0.0, y: 3.0), (x: 3.0, y: 3.0), (x: 3.0, y: 0.0)];
        let mesh = ExtrudePolygon::new(&square, 1.0).execute().unwrap().unwrap();
        assert_relative_eq!(mesh.volume(), 9.0, epsilon = 1e-9);
    }

    #[test]
    fn hole_is_subtracted() {
        let ring = polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 0.0, y: 4.0), (x: 4.0, y: 4.0), (x: 4.0, y: 0.0)],
            interiors: [[(x: 1.0, y: 1.0), (x: 3.0, y: 1.0), (x: 3.0, y: 3.0), (x: 1.0, y: 3.0)]],
        );
        let mesh = ExtrudePolygon::new(&ring, 2.0).execute().unwrap().unwrap();
        assert_relative_eq!(mesh.volume(), 24.0, epsilon = 1e-9);
        assert!(is_volume(&mesh));
    }

    #[test]
    fn concave_outline_keeps_notch_open() {
        let l_shape = polygon![
            (x: 0.0, y: 0.0), (x: 3.0, y: 0.0), (x: 3.0, y: 1.0),
            (x: 1.0, y: 1.0), (x: 1.0, y: 3.0), (x: 0.0, y: 3.0),
        ];
        let mesh = ExtrudePolygon::new(&l_shape, 1.0).execute().unwrap().unwrap();
        assert_relative_eq!(mesh.volume(), 5.0, epsilon = 1e-9);
        assert!(is_volume(&mesh));
    }

    #[test]
    fn zero_height_yields_nothing() {
        let square = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)];
        assert!(ExtrudePolygon::new(&square, 0.0).execute().unwrap().is_none());
        assert!(ExtrudePolygon::new(&square, f64::NAN).execute().unwrap().is_none());
    }

    #[test]
    fn collapsed_polygon_yields_nothing() {
        let flat = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 2.0, y: 0.0)];
        assert!(ExtrudePolygon::new(&flat, 5.0).execute().unwrap().is_none());
    }

    #[test]
    fn self_crossing_ring_is_an_error() {
        let bow_tie = polygon![(x: 0.0, y: 0.0), (x: 4.0, y: 4.0), (x: 4.0, y: 0.0), (x: 0.0, y: 2.0)];
        assert!(ExtrudePolygon::new(&bow_tie, 1.0).execute().is_err());
    }
}
