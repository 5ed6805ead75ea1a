//! Boolean union of closed triangle meshes.
//!
//! Pipeline: AABB early-out, triangle–triangle intersection, re-triangulation
//! of every cut triangle, classification of the fragments against the other
//! operand, selection through the union keep-table, and vertex welding.
//!
//! Cut endpoints from both operands are snapped to one shared point pool
//! before splitting, so contact points computed by different triangle pairs
//! coincide exactly.

mod assemble;
mod classify;
mod select;
mod split;

use std::collections::HashMap;

use tracing::debug;

use crate::error::MeshError;
use crate::math::intersect_3d::{intersect_triangles, TriangleIntersection};
use crate::math::triangle::{Aabb, Triangle};
use crate::math::{Point3, PLANE_TOLERANCE};

use super::TriangleMesh;

use assemble::{assemble_fragments, PointPool};
use classify::MeshClassifier;
use select::{keep_in_union, MeshSource};
use split::{edge_of, snap_to_triangle, split_triangle};

type Cuts = HashMap<usize, Vec<(Point3, Point3)>>;

/// Computes the boolean union of two closed meshes.
///
/// The result is not validated; callers decide whether it is an acceptable
/// volume.
pub struct MeshUnion<'a> {
    a: &'a TriangleMesh,
    b: &'a TriangleMesh,
}

impl<'a> MeshUnion<'a> {
    #[must_use]
    pub fn new(a: &'a TriangleMesh, b: &'a TriangleMesh) -> Self {
        Self { a, b }
    }

    /// Executes the union.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::Boolean`] if cut segments cross inside a triangle
    /// or nothing survives selection.
    pub fn execute(&self) -> Result<TriangleMesh, MeshError> {
        if self.a.is_empty() {
            return Ok(self.b.clone());
        }
        if self.b.is_empty() {
            return Ok(self.a.clone());
        }
        let (Some(aabb_a), Some(aabb_b)) = (self.a.aabb(), self.b.aabb()) else {
            return Err(MeshError::Degenerate("mesh has faces but no vertices".into()));
        };

        if !aabb_a.overlaps(&aabb_b, 0.0) {
            let mut joined = self.a.clone();
            joined.merge(self.b);
            return Ok(joined);
        }

        let tris_a: Vec<(usize, Triangle)> = self.a.triangles().collect();
        let tris_b: Vec<(usize, Triangle)> = self.b.triangles().collect();
        let (mut cuts_a, mut cuts_b) = collect_cuts(&tris_a, &tris_b, &aabb_b);
        let mut pool = PointPool::new(self.a.vertices.iter().chain(&self.b.vertices).copied());
        snap_cuts(&mut cuts_a, &mut pool);
        snap_cuts(&mut cuts_b, &mut pool);
        debug!(
            cut_a = cuts_a.len(),
            cut_b = cuts_b.len(),
            "intersected mesh operands"
        );

        let fragments_a = split_mesh(self.a, &tris_a, &cuts_a)?;
        let fragments_b = split_mesh(self.b, &tris_b, &cuts_b)?;

        let mut kept = Vec::with_capacity(fragments_a.len() + fragments_b.len());
        select_fragments(&fragments_a, &MeshClassifier::new(self.b), MeshSource::A, &mut kept);
        select_fragments(&fragments_b, &MeshClassifier::new(self.a), MeshSource::B, &mut kept);

        let result = assemble_fragments(&kept);
        if result.is_empty() {
            return Err(MeshError::Boolean("union produced no faces".into()));
        }
        Ok(result)
    }
}

/// Intersects every pair of triangles whose boxes overlap and records the
/// contact segments on both triangles.
fn collect_cuts(tris_a: &[(usize, Triangle)], tris_b: &[(usize, Triangle)], aabb_b: &Aabb) -> (Cuts, Cuts) {
    let boxes_b: Vec<Aabb> = tris_b.iter().map(|(_, t)| t.aabb()).collect();
    let mut cuts_a: Cuts = HashMap::new();
    let mut cuts_b: Cuts = HashMap::new();

    for (ia, ta) in tris_a {
        let box_a = ta.aabb();
        if !box_a.overlaps(aabb_b, PLANE_TOLERANCE) {
            continue;
        }
        for ((ib, tb), box_b) in tris_b.iter().zip(&boxes_b) {
            if !box_a.overlaps(box_b, PLANE_TOLERANCE) {
                continue;
            }
            match intersect_triangles(ta, tb) {
                TriangleIntersection::None => {}
                TriangleIntersection::Segment { start, end } => {
                    cuts_a.entry(*ia).or_default().push((start, end));
                    cuts_b.entry(*ib).or_default().push((start, end));
                }
                TriangleIntersection::Coplanar {
                    on_first,
                    on_second,
                } => {
                    if !on_first.is_empty() {
                        cuts_a.entry(*ia).or_default().extend(on_first);
                    }
                    if !on_second.is_empty() {
                        cuts_b.entry(*ib).or_default().extend(on_second);
                    }
                }
            }
        }
    }
    (cuts_a, cuts_b)
}

/// Replaces every cut endpoint by its pooled position, dropping cuts that
/// shrink to a point. Triangles are visited in index order.
fn snap_cuts(cuts: &mut Cuts, pool: &mut PointPool) {
    let mut keys: Vec<usize> = cuts.keys().copied().collect();
    keys.sort_unstable();
    for key in keys {
        let Some(segments) = cuts.get_mut(&key) else {
            continue;
        };
        for (start, end) in segments.iter_mut() {
            *start = pool.canonical(start);
            *end = pool.canonical(end);
        }
        segments.retain(|(start, end)| start != end);
    }
}

/// Splits every triangle of a mesh along its cuts.
///
/// Cut endpoints landing on a mesh edge are inserted into both triangles
/// sharing that edge, so the fragments meet without T-junctions.
fn split_mesh(mesh: &TriangleMesh, tris: &[(usize, Triangle)], cuts: &Cuts) -> Result<Vec<[Point3; 3]>, MeshError> {
    let mut edge_points: HashMap<(u32, u32), Vec<Point3>> = HashMap::new();
    for (i, tri) in tris {
        let Some(segments) = cuts.get(i) else {
            continue;
        };
        let idx = mesh.indices[*i];
        for (start, end) in segments {
            for p in [start, end] {
                let q = snap_to_triangle(tri, p);
                if let Some((c0, c1)) = edge_of(tri, &q) {
                    edge_points.entry(edge_key(idx[c0], idx[c1])).or_default().push(q);
                }
            }
        }
    }

    let mut fragments = Vec::with_capacity(tris.len());
    for (i, tri) in tris {
        let idx = mesh.indices[*i];
        let segments = cuts.get(i).map_or(&[][..], Vec::as_slice);
        let points: Vec<Point3> = (0..3)
            .filter_map(|k| edge_points.get(&edge_key(idx[k], idx[(k + 1) % 3])))
            .flatten()
            .copied()
            .collect();
        fragments.extend(split_triangle(tri, segments, &points)?);
    }
    Ok(fragments)
}

fn edge_key(a: u32, b: u32) -> (u32, u32) {
    (a.min(b), a.max(b))
}

fn select_fragments(
    fragments: &[[Point3; 3]],
    other: &MeshClassifier,
    source: MeshSource,
    kept: &mut Vec<[Point3; 3]>,
) {
    for fragment in fragments {
        let Some(tri) = Triangle::new(fragment[0], fragment[1], fragment[2]) else {
            continue;
        };
        if keep_in_union(source, other.classify_fragment(&tri)) {
            kept.push(*fragment);
        }
    }
}
