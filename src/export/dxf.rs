use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use dxf::entities::{Entity, EntityType, Face3D, Polyline, Solid3D, Vertex};
use dxf::enums::AcadVersion;
use dxf::tables::Layer;
use dxf::{Color, Drawing};

use crate::error::ExportError;
use crate::math::Point3;
use crate::mesh::TriangleMesh;
use crate::topology::{BuildBrep, TopologyStore};

use super::sat::{encode_line, split_line, WriteSat};
use super::{CadDocument, EntityHandle, LayerStyle};

#[derive(Debug, Clone)]
enum Item {
    Mesh { layer: String, mesh: TriangleMesh },
    Solid { layer: String, sat: Vec<String> },
}

/// An R2000 DXF document.
///
/// Entities are held until [`CadDocument::save`] so they can still be
/// removed. A mesh is written as one polyface-mesh `POLYLINE`; a solid as a
/// `3DSOLID` carrying its encoded SAT body. Meshes with more vertices than a
/// polyface can index fall back to one `3DFACE` per triangle.
#[derive(Debug, Default)]
pub struct DxfDocument {
    layers: Vec<LayerStyle>,
    entities: BTreeMap<EntityHandle, Item>,
    next: usize,
}

impl DxfDocument {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, item: Item) -> EntityHandle {
        let handle = EntityHandle(self.next);
        self.next += 1;
        self.entities.insert(handle, item);
        handle
    }

    fn has_layer(&self, name: &str) -> bool {
        self.layers.iter().any(|l| l.name == name)
    }

    /// Builds the drawing that [`CadDocument::save`] writes.
    #[must_use]
    pub fn to_drawing(&self) -> Drawing {
        let mut drawing = Drawing::new();
        drawing.header.version = AcadVersion::R2000;
        for style in &self.layers {
            drawing.add_layer(Layer {
                name: style.name.to_string(),
                color: Color::from_index(style.color),
                ..Default::default()
            });
        }
        for item in self.entities.values() {
            match item {
                Item::Mesh { layer, mesh } if mesh.vertices.len() <= MAX_POLYFACE_VERTICES => {
                    add_polyface(&mut drawing, layer, mesh);
                }
                Item::Mesh { layer, mesh } => {
                    for i in 0..mesh.indices.len() {
                        let [a, b, c] = mesh.corners(i).map(|p| to_dxf_point(&p));
                        let face = Face3D::new(a, b, c.clone(), c);
                        let mut entity = Entity::new(EntityType::Face3D(face));
                        entity.common.layer.clone_from(layer);
                        drawing.add_entity(entity);
                    }
                }
                Item::Solid { layer, sat } => {
                    let mut solid = Solid3D::default();
                    solid.custom_data.clone_from(sat);
                    let mut entity = Entity::new(EntityType::Solid3D(solid));
                    entity.common.layer.clone_from(layer);
                    drawing.add_entity(entity);
                }
            }
        }
        drawing
    }
}

/// Polyface face records index vertices with 16-bit group codes.
const MAX_POLYFACE_VERTICES: usize = i16::MAX as usize;

fn to_dxf_point(p: &Point3) -> dxf::Point {
    dxf::Point::new(p.x, p.y, p.z)
}

/// Writes a mesh as one polyface `POLYLINE`: the vertex records first, then
/// one face record per triangle with 1-based vertex indices.
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn add_polyface(drawing: &mut Drawing, layer: &str, mesh: &TriangleMesh) {
    let mut polyline = Polyline::default();
    polyline.set_is_polyface_mesh(true);
    polyline.polygon_mesh_m_vertex_count = mesh.vertices.len() as i32;
    polyline.polygon_mesh_n_vertex_count = mesh.indices.len() as i32;

    for p in &mesh.vertices {
        let mut vertex = Vertex {
            location: to_dxf_point(p),
            ..Default::default()
        };
        vertex.set_is_polyface_mesh_vertex(true);
        polyline.add_vertex(drawing, vertex);
    }
    for [a, b, c] in &mesh.indices {
        let mut face = Vertex {
            polyface_mesh_vertex_index1: *a as i32 + 1,
            polyface_mesh_vertex_index2: *b as i32 + 1,
            polyface_mesh_vertex_index3: *c as i32 + 1,
            ..Default::default()
        };
        face.set_is_polyface_mesh_vertex(true);
        polyline.add_vertex(drawing, face);
    }

    let mut entity = Entity::new(EntityType::Polyline(polyline));
    entity.common.layer = layer.to_string();
    drawing.add_entity(entity);
}

impl CadDocument for DxfDocument {
    fn add_layer(&mut self, style: LayerStyle) {
        if !self.has_layer(style.name) {
            self.layers.push(style);
        }
    }

    fn add_mesh(&mut self, layer: &str, mesh: &TriangleMesh) -> Result<EntityHandle, ExportError> {
        if !self.has_layer(layer) {
            return Err(ExportError::UnknownLayer(layer.to_string()));
        }
        let vertices = mesh.vertices.len();
        for (face, tri) in mesh.indices.iter().enumerate() {
            if let Some(&index) = tri.iter().find(|&&i| i as usize >= vertices) {
                return Err(ExportError::FaceOutOfRange {
                    vertices,
                    face,
                    index,
                });
            }
        }
        Ok(self.insert(Item::Mesh {
            layer: layer.to_string(),
            mesh: mesh.clone(),
        }))
    }

    fn promote_to_solid(&mut self, mesh: EntityHandle) -> Result<EntityHandle, ExportError> {
        let (layer, mesh_data) = match self.entities.get(&mesh) {
            Some(Item::Mesh { layer, mesh }) => (layer.clone(), mesh),
            Some(Item::Solid { .. }) => return Err(ExportError::NotAMesh(mesh.0)),
            None => return Err(ExportError::UnknownEntity(mesh.0)),
        };
        let mut store = TopologyStore::new();
        let solid = BuildBrep::new(mesh_data).execute(&mut store)?;
        let sat = WriteSat::new(&store, solid)
            .execute()?
            .iter()
            .flat_map(|line| split_line(line))
            .map(|line| encode_line(&line))
            .collect();
        Ok(self.insert(Item::Solid { layer, sat }))
    }

    fn remove_entity(&mut self, handle: EntityHandle) -> Result<(), ExportError> {
        self.entities
            .remove(&handle)
            .map(|_| ())
            .ok_or(ExportError::UnknownEntity(handle.0))
    }

    fn save(&self, path: &Path) -> Result<(), ExportError> {
        let write_error = |message: String| ExportError::Write {
            path: path.to_path_buf(),
            message,
        };
        let file = File::create(path).map_err(|e| write_error(e.to_string()))?;
        let mut writer = BufWriter::new(file);
        self.to_drawing()
            .save(&mut writer)
            .map_err(|e| write_error(e.to_string()))
    }
}
