use std::collections::{HashMap, HashSet};

use crate::math::{Point3, SNAP_TOLERANCE};

use super::super::TriangleMesh;

/// Upper bound on T-junction repair passes over one mesh.
const MAX_REPAIR_PASSES: usize = 64;

/// Builds an indexed mesh from loose triangles, welding coincident corners.
///
/// Triangles that collapse when their corners are welded are dropped. Open
/// edges that pass through a vertex of another fragment are then split at
/// that vertex.
#[must_use]
pub fn assemble_fragments(fragments: &[[Point3; 3]]) -> TriangleMesh {
    let mut welder = VertexWelder::new(SNAP_TOLERANCE);
    let mut mesh = TriangleMesh::default();

    for fragment in fragments {
        let tri = fragment.map(|p| welder.get_or_create(&mut mesh.vertices, &p));
        if tri[0] == tri[1] || tri[1] == tri[2] || tri[0] == tri[2] {
            continue;
        }
        mesh.indices.push(tri);
    }
    close_t_junctions(&mut mesh);
    mesh
}

/// Canonical positions shared by every cut of one union.
///
/// Seeded with the operands' vertices, so a cut endpoint next to an existing
/// corner becomes that corner.
pub struct PointPool {
    welder: VertexWelder,
    points: Vec<Point3>,
}

impl PointPool {
    pub fn new(seeds: impl IntoIterator<Item = Point3>) -> Self {
        let mut pool = Self {
            welder: VertexWelder::new(SNAP_TOLERANCE),
            points: Vec::new(),
        };
        for seed in seeds {
            pool.welder.get_or_create(&mut pool.points, &seed);
        }
        pool
    }

    /// The pooled point within [`SNAP_TOLERANCE`] of `p`, or `p` itself.
    pub fn canonical(&mut self, p: &Point3) -> Point3 {
        let idx = self.welder.get_or_create(&mut self.points, p);
        self.points[idx as usize]
    }
}

/// Directed edges without a reversed twin, as `(face, slot)` pairs where the
/// edge runs from corner `slot` to corner `slot + 1`.
fn open_edges(indices: &[[u32; 3]]) -> Vec<(usize, usize)> {
    let directed: HashSet<(u32, u32)> = indices
        .iter()
        .flat_map(|t| (0..3).map(move |k| (t[k], t[(k + 1) % 3])))
        .collect();
    indices
        .iter()
        .enumerate()
        .flat_map(|(face, t)| (0..3).map(move |k| (face, k, t[k], t[(k + 1) % 3])))
        .filter(|&(_, _, u, v)| !directed.contains(&(v, u)))
        .map(|(face, k, _, _)| (face, k))
        .collect()
}

/// Splits faces whose open edge runs through another open-edge vertex.
fn close_t_junctions(mesh: &mut TriangleMesh) {
    for _ in 0..MAX_REPAIR_PASSES {
        let open = open_edges(&mesh.indices);
        if open.is_empty() {
            return;
        }
        let mut candidates: Vec<u32> = open
            .iter()
            .flat_map(|&(face, k)| {
                let t = mesh.indices[face];
                [t[k], t[(k + 1) % 3]]
            })
            .collect();
        candidates.sort_unstable();
        candidates.dedup();

        let mut touched = HashSet::new();
        let mut added = Vec::new();
        for (face, k) in open {
            if touched.contains(&face) {
                continue;
            }
            let t = mesh.indices[face];
            let (u, v, x) = (t[k], t[(k + 1) % 3], t[(k + 2) % 3]);
            let Some(w) = first_vertex_on_edge(&mesh.vertices, u, v, &candidates) else {
                continue;
            };
            mesh.indices[face] = [u, w, x];
            added.push([w, v, x]);
            touched.insert(face);
        }
        if added.is_empty() {
            return;
        }
        mesh.indices.extend(added);
    }
}

/// The candidate closest to `u` lying strictly inside segment `u`–`v`.
fn first_vertex_on_edge(vertices: &[Point3], u: u32, v: u32, candidates: &[u32]) -> Option<u32> {
    let (a, b) = (vertices[u as usize], vertices[v as usize]);
    let dir = b - a;
    let len = dir.norm();
    if len < 2.0 * SNAP_TOLERANCE {
        return None;
    }
    candidates
        .iter()
        .filter(|&&w| w != u && w != v)
        .filter_map(|&w| {
            let offset = vertices[w as usize] - a;
            let along = offset.dot(&dir) / len;
            if along <= SNAP_TOLERANCE || along >= len - SNAP_TOLERANCE {
                return None;
            }
            let off_line = (offset - dir * (along / len)).norm();
            (off_line < SNAP_TOLERANCE).then_some((along, w))
        })
        .min_by(|x, y| x.0.total_cmp(&y.0))
        .map(|(_, w)| w)
}

/// Spatial hash merging points closer than the cell size.
struct VertexWelder {
    cell_size: f64,
    map: HashMap<(i64, i64, i64), Vec<(u32, Point3)>>,
}

impl VertexWelder {
    fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            map: HashMap::new(),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn cell_key(&self, p: &Point3) -> (i64, i64, i64) {
        let inv = 1.0 / self.cell_size;
        (
            (p.x * inv).floor() as i64,
            (p.y * inv).floor() as i64,
            (p.z * inv).floor() as i64,
        )
    }

    #[allow(clippy::cast_possible_truncation)]
    fn get_or_create(&mut self, vertices: &mut Vec<Point3>, point: &Point3) -> u32 {
        let key = self.cell_key(point);

        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let neighbor = (key.0 + dx, key.1 + dy, key.2 + dz);
                    if let Some(entries) = self.map.get(&neighbor) {
                        for &(idx, ref existing) in entries {
                            if (point - existing).norm() < self.cell_size {
                                return idx;
                            }
                        }
                    }
                }
            }
        }

        let idx = vertices.len() as u32;
        vertices.push(*point);
        self.map.entry(key).or_default().push((idx, *point));
        idx
    }
}
