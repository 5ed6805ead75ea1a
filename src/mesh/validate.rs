use std::collections::HashMap;

use crate::math::TOLERANCE;

use super::TriangleMesh;

/// Returns `true` if the mesh is a closed, consistently wound, outward-facing
/// surface.
///
/// Every directed edge must occur exactly once and be matched by exactly one
/// reversed twin, no triangle may repeat a vertex, and the enclosed volume
/// must be positive.
#[must_use]
pub fn is_volume(mesh: &TriangleMesh) -> bool {
    if mesh.indices.is_empty() {
        return false;
    }
    let vertex_count = mesh.vertices.len();
    let mut directed: HashMap<(u32, u32), u32> = HashMap::with_capacity(mesh.indices.len() * 3);

    for tri in &mesh.indices {
        if tri.iter().any(|&i| i as usize >= vertex_count) {
            return false;
        }
        if tri[0] == tri[1] || tri[1] == tri[2] || tri[0] == tri[2] {
            return false;
        }
        for k in 0..3 {
            *directed.entry((tri[k], tri[(k + 1) % 3])).or_insert(0) += 1;
        }
    }

    let closed = directed
        .iter()
        .all(|(&(a, b), &count)| count == 1 && directed.get(&(b, a)) == Some(&1));
    closed && mesh.volume() > TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::test_support::cube;

    #[test]
    fn cube_is_volume() {
        assert!(is_volume(&cube([0.0, 0.0, 0.0], [1.0, 1.0, 1.0])));
    }

    #[test]
    fn open_mesh_is_not_volume() {
        let mut mesh = cube([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        mesh.indices.pop();
        assert!(!is_volume(&mesh));
    }

    #[test]
    fn inside_out_mesh_is_not_volume() {
        let mut mesh = cube([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        mesh.invert();
        assert!(!is_volume(&mesh));
    }

    #[test]
    fn flipped_triangle_breaks_orientation() {
        let mut mesh = cube([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        mesh.indices[3].swap(1, 2);
        assert!(!is_volume(&mesh));
    }

    #[test]
    fn duplicated_shell_is_not_volume() {
        let mut mesh = cube([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        let copy = mesh.indices.clone();
        mesh.indices.extend(copy);
        assert!(!is_volume(&mesh));
    }

    #[test]
    fn empty_mesh_is_not_volume() {
        assert!(!is_volume(&TriangleMesh::default()));
    }
}
