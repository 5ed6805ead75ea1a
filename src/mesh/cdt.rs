use std::collections::{HashMap, HashSet, VecDeque};

use spade::handles::{FixedFaceHandle, FixedVertexHandle, InnerTag};
use spade::{ConstrainedDelaunayTriangulation, Point2 as SpadePoint2, Triangulation};

use crate::error::MeshError;

pub(crate) type Cdt = ConstrainedDelaunayTriangulation<SpadePoint2<f64>>;

/// Inserts a point, mapping spade's rejection of non-finite input to an error.
pub(crate) fn insert_point(cdt: &mut Cdt, x: f64, y: f64) -> Result<FixedVertexHandle, MeshError> {
    cdt.insert(SpadePoint2::new(x, y))
        .map_err(|e| MeshError::Triangulation(format!("CDT insert: {e:?}")))
}

/// Adds a constraint edge unless it would cross an existing one.
///
/// Coincident endpoints and already constrained edges are ignored.
pub(crate) fn add_constraint(
    cdt: &mut Cdt,
    from: FixedVertexHandle,
    to: FixedVertexHandle,
) -> Result<(), MeshError> {
    if from == to {
        return Ok(());
    }
    if let Some(edge) = cdt.get_edge_from_neighbors(from, to) {
        if cdt.is_constraint_edge(edge.as_undirected().fix()) {
            return Ok(());
        }
    }
    if !cdt.can_add_constraint(from, to) {
        return Err(MeshError::Triangulation(
            "constraint edges cross each other".into(),
        ));
    }
    cdt.add_constraint(from, to);
    Ok(())
}

/// Inserts a closed ring of points and constrains its edges.
pub(crate) fn insert_constraint_loop(cdt: &mut Cdt, points: &[(f64, f64)]) -> Result<(), MeshError> {
    if points.len() < 3 {
        return Err(MeshError::Triangulation(
            "constraint loop needs at least 3 points".into(),
        ));
    }

    let mut handles = Vec::with_capacity(points.len());
    for &(x, y) in points {
        handles.push(insert_point(cdt, x, y)?);
    }

    for i in 0..handles.len() {
        add_constraint(cdt, handles[i], handles[(i + 1) % handles.len()])?;
    }
    Ok(())
}

/// Classifies which inner faces of the CDT are inside the constrained rings.
///
/// Flood-fills from the faces touching the convex hull at depth 0; crossing a
/// constraint edge increments the depth. Odd depth = interior.
pub(crate) fn classify_interior_faces(cdt: &Cdt) -> HashSet<usize> {
    let mut interior = HashSet::new();
    let mut depth_map: HashMap<usize, u32> = HashMap::new();
    let mut queue: VecDeque<(FixedFaceHandle<InnerTag>, u32)> = VecDeque::new();

    let outer_fix = cdt.outer_face().fix();

    for edge in cdt.directed_edges() {
        if edge.face().fix() != outer_fix {
            continue;
        }
        if let Some(inner) = edge.rev().face().as_inner() {
            let idx = inner.fix().index();
            if depth_map.contains_key(&idx) {
                continue;
            }
            let depth = u32::from(cdt.is_constraint_edge(edge.as_undirected().fix()));
            depth_map.insert(idx, depth);
            if depth % 2 == 1 {
                interior.insert(idx);
            }
            queue.push_back((inner.fix(), depth));
        }
    }

    while let Some((face_fix, depth)) = queue.pop_front() {
        let face = cdt.face(face_fix);
        for edge in face.adjacent_edges() {
            let Some(neighbor) = edge.rev().face().as_inner() else {
                continue;
            };
            let n_idx = neighbor.fix().index();
            if depth_map.contains_key(&n_idx) {
                continue;
            }
            let new_depth = if cdt.is_constraint_edge(edge.as_undirected().fix()) {
                depth + 1
            } else {
                depth
            };
            depth_map.insert(n_idx, new_depth);
            if new_depth % 2 == 1 {
                interior.insert(n_idx);
            }
            queue.push_back((neighbor.fix(), new_depth));
        }
    }

    interior
}
