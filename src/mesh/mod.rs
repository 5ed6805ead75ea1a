//! Closed triangle meshes and the 3D mesh engine used to build and fuse prisms.

mod boolean;
mod cdt;
mod extrude;
mod normals;
mod validate;

pub use boolean::MeshUnion;
pub use extrude::ExtrudePolygon;
pub use validate::is_volume;

use geo::Polygon;

use crate::error::MeshError;
use crate::math::triangle::{Aabb, Triangle};
use crate::math::{Point3, Vector3};

/// An indexed triangle mesh.
///
/// Triangles are wound counter-clockwise when seen from outside the enclosed
/// volume.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleMesh {
    /// Vertex positions.
    pub vertices: Vec<Point3>,
    /// Triangle indices (each triple defines a triangle).
    pub indices: Vec<[u32; 3]>,
}

impl TriangleMesh {
    #[must_use]
    pub fn new(vertices: Vec<Point3>, indices: Vec<[u32; 3]>) -> Self {
        Self { vertices, indices }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Moves every vertex by `offset`.
    pub fn translate(&mut self, offset: &Vector3) {
        for v in &mut self.vertices {
            *v += offset;
        }
    }

    /// Returns a moved copy of the mesh.
    #[must_use]
    pub fn translated(&self, offset: &Vector3) -> Self {
        let mut moved = self.clone();
        moved.translate(offset);
        moved
    }

    /// Appends another mesh without sharing any vertices.
    #[allow(clippy::cast_possible_truncation)]
    pub fn merge(&mut self, other: &Self) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.indices
            .extend(other.indices.iter().map(|t| t.map(|i| i + base)));
    }

    /// Bounding box of all vertices.
    #[must_use]
    pub fn aabb(&self) -> Option<Aabb> {
        Aabb::from_points(&self.vertices)
    }

    /// Corner positions of triangle `i`.
    #[must_use]
    pub fn corners(&self, i: usize) -> [Point3; 3] {
        self.indices[i].map(|v| self.vertices[v as usize])
    }

    /// Non-degenerate triangles paired with their index in the mesh.
    pub fn triangles(&self) -> impl Iterator<Item = (usize, Triangle)> + '_ {
        (0..self.indices.len()).filter_map(|i| {
            let [a, b, c] = self.corners(i);
            Triangle::new(a, b, c).map(|t| (i, t))
        })
    }

    /// Enclosed volume via the divergence theorem.
    ///
    /// Sums signed tetrahedra against the origin; negative for inside-out meshes.
    #[must_use]
    pub fn volume(&self) -> f64 {
        let total: f64 = (0..self.indices.len())
            .map(|i| {
                let [a, b, c] = self.corners(i);
                a.coords.dot(&b.coords.cross(&c.coords))
            })
            .sum();
        total / 6.0
    }

    /// Flips every triangle.
    pub fn invert(&mut self) {
        for t in &mut self.indices {
            t.swap(1, 2);
        }
    }

    /// Makes winding consistent across each connected shell and turns every
    /// shell outward.
    pub fn fix_normals(&mut self) {
        normals::fix_normals(self);
    }
}

/// The 3D mesh capabilities the pipeline depends on.
///
/// Implementations must be usable from several threads at once; clusters are
/// unified concurrently.
pub trait MeshKernel: Sync {
    /// Extrudes a polygon with holes from `z = 0` up to `z = height`.
    ///
    /// Returns `Ok(None)` when the polygon encloses no area or the height is
    /// not positive.
    ///
    /// # Errors
    ///
    /// Returns an error if the polygon cannot be triangulated.
    fn extrude(&self, polygon: &Polygon<f64>, height: f64) -> Result<Option<TriangleMesh>, MeshError>;

    /// Boolean union of two closed meshes.
    ///
    /// # Errors
    ///
    /// Returns an error if the cut cannot be computed.
    fn union(&self, a: &TriangleMesh, b: &TriangleMesh) -> Result<TriangleMesh, MeshError>;

    /// Returns `true` if the mesh bounds a single valid volume.
    fn is_volume(&self, mesh: &TriangleMesh) -> bool;
}

/// Mesh kernel implemented in this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeKernel;

impl MeshKernel for NativeKernel {
    fn extrude(&self, polygon: &Polygon<f64>, height: f64) -> Result<Option<TriangleMesh>, MeshError> {
        ExtrudePolygon::new(polygon, height).execute()
    }

    fn union(&self, a: &TriangleMesh, b: &TriangleMesh) -> Result<TriangleMesh, MeshError> {
        MeshUnion::new(a, b).execute()
    }

    fn is_volume(&self, mesh: &TriangleMesh) -> bool {
        is_volume(mesh)
    }
}
