use crate::math::intersect_3d::{ray_triangle, RayHit};
use crate::math::triangle::{Aabb, Triangle};
use crate::math::{Point3, Vector3, PLANE_TOLERANCE};

use super::super::TriangleMesh;

/// Position of a fragment relative to a closed mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentClass {
    Inside,
    Outside,
    /// The fragment lies on a face of the mesh.
    OnBoundary {
        /// Whether the fragment and the face it lies on point the same way.
        same_orientation: bool,
    },
}

/// Ray directions tried in order; none is parallel to a coordinate plane, so
/// axis-aligned walls and caps never run along the ray.
const RAY_DIRECTIONS: [[f64; 3]; 4] = [
    [0.5773, 0.5774, 0.5775],
    [-0.3127, 0.8466, 0.4307],
    [0.7071, -0.1243, -0.6961],
    [-0.2213, -0.6612, 0.7168],
];

/// Parallel threshold on the dot product of unit normals.
const COPLANAR_NORMAL_DOT: f64 = 1.0 - 1e-6;

/// Classifies points and fragments against a closed triangle mesh.
pub struct MeshClassifier {
    triangles: Vec<Triangle>,
    aabb: Option<Aabb>,
}

impl MeshClassifier {
    #[must_use]
    pub fn new(mesh: &TriangleMesh) -> Self {
        Self {
            triangles: mesh.triangles().map(|(_, t)| t).collect(),
            aabb: mesh.aabb(),
        }
    }

    /// Classifies a fragment by its centroid and normal.
    ///
    /// A fragment coplanar with a face of the mesh and overlapping it is on the
    /// boundary; otherwise the centroid is classified by ray casting.
    #[must_use]
    pub fn classify_fragment(&self, fragment: &Triangle) -> FragmentClass {
        let centroid = fragment.centroid();
        let Some(aabb) = &self.aabb else {
            return FragmentClass::Outside;
        };
        if !aabb.contains(&centroid, PLANE_TOLERANCE) {
            return FragmentClass::Outside;
        }

        for tri in &self.triangles {
            let dot = tri.normal.dot(&fragment.normal);
            if dot.abs() < COPLANAR_NORMAL_DOT {
                continue;
            }
            if tri.contains_coplanar(&centroid, PLANE_TOLERANCE) {
                return FragmentClass::OnBoundary {
                    same_orientation: dot > 0.0,
                };
            }
        }

        self.classify_point(&centroid)
    }

    /// Classifies a point that does not lie on the mesh surface.
    ///
    /// Counts crossings along several rays, moving on to the next direction
    /// whenever a ray grazes an edge or vertex. If every direction is
    /// degenerate the point is treated as outside.
    #[must_use]
    pub fn classify_point(&self, point: &Point3) -> FragmentClass {
        for dir in RAY_DIRECTIONS {
            let dir = Vector3::new(dir[0], dir[1], dir[2]).normalize();
            if let Some(inside) = self.ray_parity(point, &dir) {
                return if inside {
                    FragmentClass::Inside
                } else {
                    FragmentClass::Outside
                };
            }
        }
        FragmentClass::Outside
    }

    fn ray_parity(&self, origin: &Point3, dir: &Vector3) -> Option<bool> {
        let mut crossings = 0u32;
        for tri in &self.triangles {
            match ray_triangle(origin, dir, tri) {
                RayHit::Miss => {}
                RayHit::Hit { .. } => crossings += 1,
                RayHit::Degenerate => return None,
            }
        }
        Some(crossings % 2 == 1)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mesh::test_support::cube;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn point_inside_and_outside_cube() {
        let classifier = MeshClassifier::new(&cube([0.0, 0.0, 0.0], [2.0, 2.0, 2.0]));
        assert_eq!(classifier.classify_point(&p(1.0, 1.0, 1.0)), FragmentClass::Inside);
        assert_eq!(classifier.classify_point(&p(3.0, 1.0, 1.0)), FragmentClass::Outside);
        assert_eq!(classifier.classify_point(&p(1.0, 1.0, -0.5)), FragmentClass::Outside);
    }

    #[test]
    fn coplanar_fragment_on_boundary() {
        let classifier = MeshClassifier::new(&cube([0.0, 0.0, 0.0], [2.0, 2.0, 2.0]));
        let up = Triangle::new(p(0.5, 0.5, 2.0), p(1.0, 0.5, 2.0), p(0.5, 1.0, 2.0)).unwrap();
        assert_eq!(
            classifier.classify_fragment(&up),
            FragmentClass::OnBoundary {
                same_orientation: true
            }
        );
        let down = Triangle::new(p(0.5, 0.5, 2.0), p(0.5, 1.0, 2.0), p(1.0, 0.5, 2.0)).unwrap();
        assert_eq!(
            classifier.classify_fragment(&down),
            FragmentClass::OnBoundary {
                same_orientation: false
            }
        );
    }

    #[test]
    fn coplanar_fragment_beside_face_is_outside() {
        let classifier = MeshClassifier::new(&cube([0.0, 0.0, 0.0], [2.0, 2.0, 2.0]));
        let beside = Triangle::new(p(2.5, 0.5, 2.0), p(3.0, 0.5, 2.0), p(2.5, 1.0, 2.0)).unwrap();
        assert_eq!(classifier.classify_fragment(&beside), FragmentClass::Outside);
    }
}
