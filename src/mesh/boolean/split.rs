use std::collections::HashMap;

use spade::handles::FixedVertexHandle;
use spade::Triangulation;

use crate::error::MeshError;
use crate::math::triangle::{project, Triangle};
use crate::math::{Point3, SNAP_TOLERANCE, WELD_TOLERANCE};

use super::super::cdt::{add_constraint, insert_point, Cdt};

/// Snaps a point lying on a triangle onto it.
///
/// Barycentric weights whose distance contribution is below
/// [`SNAP_TOLERANCE`] are zeroed, so points near an edge land exactly on it
/// and points near a corner become that corner.
#[must_use]
pub fn snap_to_triangle(tri: &Triangle, p: &Point3) -> Point3 {
    let mut w = tri.barycentric(p, tri.dominant_axis());
    for (i, weight) in w.iter_mut().enumerate() {
        if *weight < 0.0 || *weight * tri.altitude(i) < SNAP_TOLERANCE {
            *weight = 0.0;
        }
    }
    let sum: f64 = w.iter().sum();
    if sum <= 0.0 {
        return *p;
    }
    if let Some(corner) = (0..3).find(|&i| w[i] > 0.0 && w.iter().filter(|x| **x > 0.0).count() == 1) {
        return tri.corners[corner];
    }
    tri.point_at(w.map(|x| x / sum))
}

/// Index of the edge a snapped point lies on, as the pair of corner indices.
///
/// Returns `None` for interior points and corners.
#[must_use]
pub fn edge_of(tri: &Triangle, p: &Point3) -> Option<(usize, usize)> {
    let w = tri.barycentric(p, tri.dominant_axis());
    let zero: Vec<usize> = (0..3)
        .filter(|&i| w[i] * tri.altitude(i) < SNAP_TOLERANCE)
        .collect();
    match zero.as_slice() {
        [i] => Some(((i + 1) % 3, (i + 2) % 3)),
        _ => None,
    }
}

/// Re-triangulates a triangle so every cut segment and extra point becomes
/// part of the fragment boundaries.
///
/// Points closer than [`SNAP_TOLERANCE`] share one triangulation vertex.
/// Fragments keep the parent's orientation. Slivers thinner than
/// [`WELD_TOLERANCE`] are dropped; they collapse when vertices are welded.
///
/// # Errors
///
/// Returns [`MeshError::Boolean`] if two cuts cross inside the triangle.
pub fn split_triangle(
    parent: &Triangle,
    cuts: &[(Point3, Point3)],
    points: &[Point3],
) -> Result<Vec<[Point3; 3]>, MeshError> {
    if cuts.is_empty() && points.is_empty() {
        return Ok(vec![parent.corners]);
    }

    let axis = parent.dominant_axis();
    let mut cdt = Cdt::new();
    let mut placed: Vec<(FixedVertexHandle, Point3)> = Vec::new();
    let mut place = |cdt: &mut Cdt, p: Point3| -> Result<FixedVertexHandle, MeshError> {
        if let Some((h, _)) = placed
            .iter()
            .find(|(_, q)| (p - q).norm() < SNAP_TOLERANCE)
        {
            return Ok(*h);
        }
        let q = project(&p, axis);
        let h = insert_point(cdt, q.x, q.y)?;
        if !placed.iter().any(|(existing, _)| *existing == h) {
            placed.push((h, p));
        }
        Ok(h)
    };

    for corner in parent.corners {
        place(&mut cdt, corner)?;
    }
    for p in points {
        place(&mut cdt, snap_to_triangle(parent, p))?;
    }
    for (start, end) in cuts {
        let h0 = place(&mut cdt, snap_to_triangle(parent, start))?;
        let h1 = place(&mut cdt, snap_to_triangle(parent, end))?;
        add_constraint(&mut cdt, h0, h1).map_err(|e| MeshError::Boolean(e.to_string()))?;
    }

    let positions: HashMap<usize, Point3> = placed.iter().map(|(h, p)| (h.index(), *p)).collect();
    let mut fragments = Vec::with_capacity(cdt.num_inner_faces());
    for face in cdt.inner_faces() {
        let mut corners = [Point3::origin(); 3];
        for (slot, v) in corners.iter_mut().zip(face.vertices()) {
            let Some(p) = positions.get(&v.fix().index()) else {
                return Err(MeshError::Boolean("triangulation vertex without position".into()));
            };
            *slot = *p;
        }
        let Some(tri) = Triangle::new(corners[0], corners[1], corners[2]) else {
            continue;
        };
        if is_sliver(&tri) {
            continue;
        }
        if tri.normal.dot(&parent.normal) < 0.0 {
            corners.swap(1, 2);
        }
        fragments.push(corners);
    }
    Ok(fragments)
}

/// A triangle whose smallest altitude is below the weld tolerance.
fn is_sliver(tri: &Triangle) -> bool {
    (0..3).any(|i| tri.altitude(i) < WELD_TOLERANCE)
}
