use std::collections::{HashMap, VecDeque};

use crate::error::TopologyError;
use crate::math::triangle::Triangle;
use crate::mesh::TriangleMesh;

use super::{
    EdgeData, EdgeId, FaceData, FacePlane, OrientedEdge, ShellData, SolidData, SolidId,
    TopologyStore, VertexData, VertexId, WireData,
};

/// Builds a faceted B-rep solid from a triangle mesh.
///
/// Every triangle becomes a planar face with a three-edge loop. Triangles
/// sharing an edge in opposite directions share one edge entity; each
/// edge-connected group of triangles becomes a shell.
pub struct BuildBrep<'a> {
    mesh: &'a TriangleMesh,
}

impl<'a> BuildBrep<'a> {
    #[must_use]
    pub fn new(mesh: &'a TriangleMesh) -> Self {
        Self { mesh }
    }

    /// Executes the build, creating the solid in the topology store.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::InvalidTopology`] if the mesh has no
    /// non-degenerate triangle.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<SolidId, TopologyError> {
        let planes: Vec<Option<FacePlane>> = (0..self.mesh.indices.len())
            .map(|i| {
                let [a, b, c] = self.mesh.corners(i);
                Triangle::new(a, b, c).map(|t| FacePlane {
                    origin: a,
                    normal: t.normal,
                })
            })
            .collect();
        if planes.iter().all(Option::is_none) {
            return Err(TopologyError::InvalidTopology(
                "mesh has no non-degenerate triangles".into(),
            ));
        }

        let mut vertex_ids: HashMap<u32, VertexId> = HashMap::new();
        let mut shells = Vec::new();
        for component in self.components(&planes) {
            // Undirected key -> (edge, start vertex index, use count)
            let mut edges: HashMap<(u32, u32), Vec<(EdgeId, u32, u8)>> = HashMap::new();
            let mut faces = Vec::with_capacity(component.len());

            for t in component {
                let Some(plane) = planes[t] else {
                    continue;
                };
                let tri = self.mesh.indices[t];
                let mut loop_edges = Vec::with_capacity(3);
                for k in 0..3 {
                    let (a, b) = (tri[k], tri[(k + 1) % 3]);
                    let uses = edges.entry((a.min(b), a.max(b))).or_default();
                    if let Some(slot) = uses.iter_mut().find(|(_, start, count)| *count == 1 && *start == b) {
                        slot.2 = 2;
                        loop_edges.push(OrientedEdge::new(slot.0, false));
                        continue;
                    }
                    let start = self.vertex(store, &mut vertex_ids, a);
                    let end = self.vertex(store, &mut vertex_ids, b);
                    let edge = store.add_edge(EdgeData { start, end });
                    uses.push((edge, a, 1));
                    loop_edges.push(OrientedEdge::new(edge, true));
                }
                let wire = store.add_wire(WireData { edges: loop_edges });
                faces.push(store.add_face(FaceData {
                    plane,
                    outer_wire: wire,
                }));
            }

            let is_closed = edges.values().flatten().all(|(_, _, count)| *count == 2);
            shells.push(store.add_shell(ShellData { faces, is_closed }));
        }

        Ok(store.add_solid(SolidData { shells }))
    }

    fn vertex(&self, store: &mut TopologyStore, ids: &mut HashMap<u32, VertexId>, index: u32) -> VertexId {
        *ids.entry(index)
            .or_insert_with(|| store.add_vertex(VertexData::new(self.mesh.vertices[index as usize])))
    }

    /// Groups non-degenerate triangles connected through shared edges.
    fn components(&self, planes: &[Option<FacePlane>]) -> Vec<Vec<usize>> {
        let mut edge_faces: HashMap<(u32, u32), Vec<usize>> = HashMap::new();
        for (t, tri) in self.mesh.indices.iter().enumerate() {
            if planes[t].is_none() {
                continue;
            }
            for k in 0..3 {
                let (a, b) = (tri[k], tri[(k + 1) % 3]);
                edge_faces.entry((a.min(b), a.max(b))).or_default().push(t);
            }
        }

        let mut seen = vec![false; self.mesh.indices.len()];
        let mut components = Vec::new();
        for seed in 0..self.mesh.indices.len() {
            if seen[seed] || planes[seed].is_none() {
                continue;
            }
            seen[seed] = true;
            let mut component = vec![seed];
            let mut queue = VecDeque::from([seed]);
            while let Some(t) = queue.pop_front() {
                let tri = self.mesh.indices[t];
                for k in 0..3 {
                    let (a, b) = (tri[k], tri[(k + 1) % 3]);
                    for &n in edge_faces.get(&(a.min(b), a.max(b))).into_iter().flatten() {
                        if !seen[n] {
                            seen[n] = true;
                            component.push(n);
                            queue.push_back(n);
                        }
                    }
                }
            }
            components.push(component);
        }
        components
    }
}
