use std::collections::{HashMap, VecDeque};

use super::TriangleMesh;

/// Repairs triangle winding in place.
///
/// Walks each edge-connected shell breadth-first, flipping neighbours so
/// shared edges run in opposite directions, then flips the whole shell if it
/// encloses negative volume.
pub(super) fn fix_normals(mesh: &mut TriangleMesh) {
    let n = mesh.indices.len();
    let mut edge_faces: HashMap<(u32, u32), Vec<usize>> = HashMap::new();
    for (t, tri) in mesh.indices.iter().enumerate() {
        for k in 0..3 {
            let (a, b) = (tri[k], tri[(k + 1) % 3]);
            edge_faces.entry((a.min(b), a.max(b))).or_default().push(t);
        }
    }

    let mut visited = vec![false; n];
    for seed in 0..n {
        if visited[seed] {
            continue;
        }
        visited[seed] = true;
        let mut component = vec![seed];
        let mut queue = VecDeque::from([seed]);

        while let Some(t) = queue.pop_front() {
            let tri = mesh.indices[t];
            for k in 0..3 {
                let (a, b) = (tri[k], tri[(k + 1) % 3]);
                let Some(neighbours) = edge_faces.get(&(a.min(b), a.max(b))) else {
                    continue;
                };
                for &m in neighbours {
                    if visited[m] {
                        continue;
                    }
                    visited[m] = true;
                    if has_directed_edge(&mesh.indices[m], a, b) {
                        mesh.indices[m].swap(1, 2);
                    }
                    component.push(m);
                    queue.push_back(m);
                }
            }
        }

        if signed_volume(mesh, &component) < 0.0 {
            for &t in &component {
                mesh.indices[t].swap(1, 2);
            }
        }
    }
}

fn has_directed_edge(tri: &[u32; 3], a: u32, b: u32) -> bool {
    (0..3).any(|k| tri[k] == a && tri[(k + 1) % 3] == b)
}

fn signed_volume(mesh: &TriangleMesh, faces: &[usize]) -> f64 {
    faces
        .iter()
        .map(|&t| {
            let [a, b, c] = mesh.corners(t);
            a.coords.dot(&b.coords.cross(&c.coords))
        })
        .sum::<f64>()
        / 6.0
}
