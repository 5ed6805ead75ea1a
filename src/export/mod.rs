//! Hands finished solids to a CAD document.

mod dxf;
pub mod sat;

pub use self::dxf::DxfDocument;

use std::path::Path;

use tracing::{debug, info};

use crate::config::OutputKind;
use crate::error::ExportError;
use crate::mesh::TriangleMesh;

/// Output layer a solid is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerTag {
    /// Fused solids.
    Main,
    /// Quarantined prisms.
    Error,
}

/// Name and colour of a document layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerStyle {
    pub name: &'static str,
    /// AutoCAD colour index.
    pub color: u8,
}

impl LayerTag {
    #[must_use]
    pub fn style(self) -> LayerStyle {
        match self {
            Self::Main => LayerStyle {
                name: "all",
                color: 252,
            },
            Self::Error => LayerStyle {
                name: "errors",
                color: 80,
            },
        }
    }
}

/// Handle of an entity in a [`CadDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityHandle(pub usize);

/// A CAD document that can hold mesh and solid entities on named layers.
pub trait CadDocument {
    /// Declares a layer. Declaring the same name twice is a no-op.
    fn add_layer(&mut self, style: LayerStyle);

    /// Adds a mesh entity on a declared layer.
    ///
    /// # Errors
    ///
    /// Returns an error if the layer is unknown or a face references a
    /// missing vertex.
    fn add_mesh(&mut self, layer: &str, mesh: &TriangleMesh) -> Result<EntityHandle, ExportError>;

    /// Adds a volumetric solid built from a mesh entity, on the mesh's layer.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is not a mesh or its body cannot be built.
    fn promote_to_solid(&mut self, mesh: EntityHandle) -> Result<EntityHandle, ExportError>;

    /// # Errors
    ///
    /// Returns an error if the handle does not exist.
    fn remove_entity(&mut self, handle: EntityHandle) -> Result<(), ExportError>;

    /// Writes the document to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Write`] if the file cannot be written.
    fn save(&self, path: &Path) -> Result<(), ExportError>;
}

/// Writes main and quarantined solids into a document.
///
/// Each mesh has its normals repaired first. For [`OutputKind::Solid`] the
/// mesh entity is promoted to a solid and then removed. The error layer is
/// only declared when there is something to put on it.
pub struct ExportSolids<'a> {
    main: &'a [TriangleMesh],
    errors: &'a [TriangleMesh],
    kind: OutputKind,
}

impl<'a> ExportSolids<'a> {
    #[must_use]
    pub fn new(main: &'a [TriangleMesh], errors: &'a [TriangleMesh], kind: OutputKind) -> Self {
        Self { main, errors, kind }
    }

    /// Executes the export, returning the handles of the final entities.
    ///
    /// # Errors
    ///
    /// Returns the first error reported by the document.
    pub fn execute(&self, document: &mut impl CadDocument) -> Result<Vec<EntityHandle>, ExportError> {
        document.add_layer(LayerTag::Main.style());
        if !self.errors.is_empty() {
            document.add_layer(LayerTag::Error.style());
        }

        let mut handles = Vec::with_capacity(self.main.len() + self.errors.len());
        for (tag, meshes) in [(LayerTag::Main, self.main), (LayerTag::Error, self.errors)] {
            for mesh in meshes {
                handles.push(self.write(document, tag, mesh)?);
            }
        }
        info!(
            main = self.main.len(),
            errors = self.errors.len(),
            kind = %self.kind,
            "exported solids"
        );
        Ok(handles)
    }

    fn write(&self, document: &mut impl CadDocument, tag: LayerTag, mesh: &TriangleMesh) -> Result<EntityHandle, ExportError> {
        let mut mesh = mesh.clone();
        mesh.fix_normals();
        let handle = document.add_mesh(tag.style().name, &mesh)?;
        match self.kind {
            OutputKind::Mesh => Ok(handle),
            OutputKind::Solid => {
                let solid = document.promote_to_solid(handle)?;
                document.remove_entity(handle)?;
                debug!(mesh = handle.0, solid = solid.0, "promoted mesh to solid");
                Ok(solid)
            }
        }
    }
}
