//! ACIS SAT (version 700) text for faceted solids.
//!
//! Records are numbered in the order they are allocated; pointers are
//! written as `$index`, `$-1` for none. Every record carries an empty
//! attribute pointer and a `-1` history id.

use std::collections::HashMap;

use crate::error::TopologyError;
use crate::math::{Point3, Vector3};
use crate::topology::{EdgeId, SolidId, TopologyStore, VertexId};

/// Longest line a DXF group value may hold.
pub const MAX_LINE: usize = 255;

const NONE: &str = "$-1";

fn ptr(index: usize) -> String {
    format!("${index}")
}

fn opt_ptr(index: Option<usize>) -> String {
    index.map_or_else(|| NONE.to_string(), ptr)
}

fn vec3(v: &Vector3) -> String {
    format!("{} {} {}", v.x, v.y, v.z)
}

fn point3(p: &Point3) -> String {
    format!("{} {} {}", p.x, p.y, p.z)
}

/// Any unit vector perpendicular to `n`.
fn perpendicular(n: &Vector3) -> Vector3 {
    let helper = if n.x.abs() < 0.9 { Vector3::x() } else { Vector3::y() };
    n.cross(&helper).normalize()
}

struct FaceSlots {
    face: usize,
    wire: usize,
    surface: usize,
    coedges: Vec<usize>,
}

/// Serialises one solid of a topology store as SAT records.
pub struct WriteSat<'a> {
    store: &'a TopologyStore,
    solid: SolidId,
}

impl<'a> WriteSat<'a> {
    #[must_use]
    pub fn new(store: &'a TopologyStore, solid: SolidId) -> Self {
        Self { store, solid }
    }

    /// Returns the SAT text as lines: three header lines, one line per
    /// record, and the end marker.
    ///
    /// # Errors
    ///
    /// Returns an error if the solid references an entity missing from the store.
    pub fn execute(&self) -> Result<Vec<String>, TopologyError> {
        let solid = self.store.solid(self.solid)?;

        let mut next = 0usize;
        let mut alloc = || {
            next += 1;
            next - 1
        };

        let body = alloc();
        let mut lumps = Vec::with_capacity(solid.shells.len());
        let mut shells = Vec::with_capacity(solid.shells.len());
        for _ in &solid.shells {
            lumps.push(alloc());
            shells.push(alloc());
        }

        let mut faces: Vec<Vec<FaceSlots>> = Vec::with_capacity(solid.shells.len());
        let mut edges: Vec<(EdgeId, usize, usize)> = Vec::new();
        let mut edge_slot: HashMap<EdgeId, usize> = HashMap::new();
        let mut vertices: Vec<(VertexId, usize, usize)> = Vec::new();
        let mut vertex_slot: HashMap<VertexId, usize> = HashMap::new();
        let mut edge_coedges: HashMap<EdgeId, Vec<usize>> = HashMap::new();

        for &shell_id in &solid.shells {
            let shell = self.store.shell(shell_id)?;
            let mut shell_faces = Vec::with_capacity(shell.faces.len());
            for &face_id in &shell.faces {
                let face = self.store.face(face_id)?;
                let wire = self.store.wire(face.outer_wire)?;
                let slots = FaceSlots {
                    face: alloc(),
                    wire: alloc(),
                    surface: alloc(),
                    coedges: wire.edges.iter().map(|_| alloc()).collect(),
                };
                for (oe, &coedge) in wire.edges.iter().zip(&slots.coedges) {
                    edge_coedges.entry(oe.edge).or_default().push(coedge);
                    if !edge_slot.contains_key(&oe.edge) {
                        edge_slot.insert(oe.edge, edges.len());
                        edges.push((oe.edge, alloc(), alloc()));
                    }
                }
                shell_faces.push(slots);
            }
            faces.push(shell_faces);
        }
        let mut vertex_edge: HashMap<VertexId, usize> = HashMap::new();
        for &(edge_id, edge_index, _) in &edges {
            let edge = self.store.edge(edge_id)?;
            for v in [edge.start, edge.end] {
                vertex_edge.entry(v).or_insert(edge_index);
                if !vertex_slot.contains_key(&v) {
                    vertex_slot.insert(v, vertices.len());
                    vertices.push((v, alloc(), alloc()));
                }
            }
        }
        let total = next;

        let mut records: Vec<String> = vec![String::new(); total];
        records[body] = format!("body $-1 -1 $-1 {} $-1 $-1 #", opt_ptr(lumps.first().copied()));

        for (i, &shell_id) in solid.shells.iter().enumerate() {
            let shell = self.store.shell(shell_id)?;
            records[lumps[i]] = format!(
                "lump $-1 -1 $-1 {} {} {} #",
                opt_ptr(lumps.get(i + 1).copied()),
                ptr(shells[i]),
                ptr(body)
            );
            records[shells[i]] = format!(
                "shell $-1 -1 $-1 $-1 $-1 {} $-1 {} #",
                opt_ptr(faces[i].first().map(|f| f.face)),
                ptr(lumps[i])
            );

            for (j, (&face_id, slots)) in shell.faces.iter().zip(&faces[i]).enumerate() {
                let face = self.store.face(face_id)?;
                let wire = self.store.wire(face.outer_wire)?;
                records[slots.face] = format!(
                    "face $-1 -1 $-1 {} {} {} $-1 {} forward single #",
                    opt_ptr(faces[i].get(j + 1).map(|f| f.face)),
                    ptr(slots.wire),
                    ptr(shells[i]),
                    ptr(slots.surface)
                );
                records[slots.wire] = format!(
                    "loop $-1 -1 $-1 $-1 {} {} #",
                    opt_ptr(slots.coedges.first().copied()),
                    ptr(slots.face)
                );
                let normal = face.plane.normal;
                records[slots.surface] = format!(
                    "plane-surface $-1 -1 $-1 {} {} {} forward_v I I I I #",
                    point3(&face.plane.origin),
                    vec3(&normal),
                    vec3(&perpendicular(&normal))
                );

                let n = slots.coedges.len();
                for (k, oe) in wire.edges.iter().enumerate() {
                    let coedge = slots.coedges[k];
                    let partner = edge_coedges
                        .get(&oe.edge)
                        .and_then(|uses| uses.iter().copied().find(|&c| c != coedge));
                    let edge = edges[edge_slot[&oe.edge]].1;
                    records[coedge] = format!(
                        "coedge $-1 -1 $-1 {} {} {} {} {} {} $-1 #",
                        ptr(slots.coedges[(k + 1) % n]),
                        ptr(slots.coedges[(k + n - 1) % n]),
                        opt_ptr(partner),
                        ptr(edge),
                        if oe.forward { "forward" } else { "reversed" },
                        ptr(slots.wire)
                    );
                }
            }
        }

        for &(edge_id, edge_index, curve_index) in &edges {
            let edge = self.store.edge(edge_id)?;
            let start = self.store.vertex(edge.start)?.point;
            let end = self.store.vertex(edge.end)?.point;
            let length = (end - start).norm();
            if length <= 0.0 {
                return Err(TopologyError::InvalidTopology("zero-length edge".into()));
            }
            let first_use = edge_coedges.get(&edge_id).and_then(|uses| uses.first().copied());
            records[edge_index] = format!(
                "edge $-1 -1 $-1 {} 0 {} {} {} {} forward @7 unknown #",
                ptr(vertices[vertex_slot[&edge.start]].1),
                ptr(vertices[vertex_slot[&edge.end]].1),
                length,
                opt_ptr(first_use),
                ptr(curve_index)
            );
            records[curve_index] = format!(
                "straight-curve $-1 -1 $-1 {} {} I I #",
                point3(&start),
                vec3(&((end - start) / length))
            );
        }

        for &(vertex_id, vertex_index, point_index) in &vertices {
            let point = self.store.vertex(vertex_id)?.point;
            let edge = vertex_edge.get(&vertex_id).copied();
            records[vertex_index] = format!("vertex $-1 -1 $-1 {} {} #", opt_ptr(edge), ptr(point_index));
            records[point_index] = format!("point $-1 -1 $-1 {} #", point3(&point));
        }

        let mut lines = header(total);
        lines.extend(records);
        lines.push("End-of-ACIS-data".to_string());
        Ok(lines)
    }
}

fn header(records: usize) -> Vec<String> {
    let product = format!("geosolid {}", env!("CARGO_PKG_VERSION"));
    let acis = "ACIS 7.0 NT";
    let date = "Thu Jan 01 00:00:00 1970";
    vec![
        format!("700 {records} 1 0"),
        format!(
            "@{} {product} @{} {acis} @{} {date}",
            product.len(),
            acis.len(),
            date.len()
        ),
        "1 9.9999999999999995e-007 1e-010".to_string(),
    ]
}

/// Applies the DXF R2000 ACIS cipher: every character other than a space
/// is replaced by `159 - c`.
#[must_use]
pub fn encode_line(line: &str) -> String {
    line.chars()
        .map(|c| match u32::from(c) {
            32 => ' ',
            code @ 33..=126 => char::from_u32(159 - code).unwrap_or(c),
            _ => c,
        })
        .collect()
}

/// Breaks a record into lines of at most [`MAX_LINE`] characters at token
/// boundaries. SAT treats line breaks between tokens as spaces.
#[must_use]
pub fn split_line(line: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    for token in line.split(' ') {
        if !current.is_empty() && current.len() + 1 + token.len() > MAX_LINE {
            out.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(token);
    }
    out.push(current);
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mesh::test_support::cube;
    use crate::topology::BuildBrep;

    fn cube_sat() -> Vec<String> {
        let mesh = cube([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        let mut store = TopologyStore::new();
        let solid = BuildBrep::new(&mesh).execute(&mut store).unwrap();
        WriteSat::new(&store, solid).execute().unwrap()
    }

    fn count(lines: &[String], kind: &str) -> usize {
        lines.iter().filter(|l| l.starts_with(&format!("{kind} "))).count()
    }

    #[test]
    fn cube_record_counts() {
        let lines = cube_sat();
        assert_eq!(lines[0], format!("700 {} 1 0", lines.len() - 4));
        assert_eq!(lines.last().unwrap(), "End-of-ACIS-data");
        assert_eq!(count(&lines, "body"), 1);
        assert_eq!(count(&lines, "lump"), 1);
        assert_eq!(count(&lines, "shell"), 1);
        assert_eq!(count(&lines, "face"), 12);
        assert_eq!(count(&lines, "loop"), 12);
        assert_eq!(count(&lines, "plane-surface"), 12);
        assert_eq!(count(&lines, "coedge"), 36);
        assert_eq!(count(&lines, "edge"), 18);
        assert_eq!(count(&lines, "straight-curve"), 18);
        assert_eq!(count(&lines, "vertex"), 8);
        assert_eq!(count(&lines, "point"), 8);
    }

    #[test]
    fn every_coedge_has_a_partner() {
        let lines = cube_sat();
        for line in lines.iter().filter(|l| l.starts_with("coedge ")) {
            let tokens: Vec<&str> = line.split(' ').collect();
            // coedge $-1 -1 $-1 next prev partner ...
            assert_ne!(tokens[6], "$-1", "{line}");
        }
    }

    #[test]
    fn records_end_with_terminator() {
        let lines = cube_sat();
        assert!(lines[3..lines.len() - 1].iter().all(|l| l.ends_with(" #")));
    }

    #[test]
    fn cipher_maps_printable_characters() {
        assert_eq!(encode_line("a b"), format!("{} {}", char::from(159 - b'a'), char::from(159 - b'b')));
        assert_eq!(encode_line(&encode_line("body $-1 #")), "body $-1 #");
    }

    #[test]
    fn long_records_split_at_spaces() {
        let record = vec!["1.2345678901234567"; 40].join(" ");
        let parts = split_line(&record);
        assert!(parts.len() > 1);
        assert!(parts.iter().all(|p| p.len() <= MAX_LINE));
        assert_eq!(parts.join(" "), record);
    }
}
