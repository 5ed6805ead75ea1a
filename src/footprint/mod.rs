//! Normalised footprints and their extrusion attributes.

mod attributes;
mod normalize;

pub use attributes::{FeatureRef, ResolveAttributes};
pub use normalize::NormalizeFootprint;

use geo::Polygon;
use tracing::info;

use crate::config::AttributeFields;
use crate::error::Result;
use crate::input::FeatureLayer;

/// Stable index of a footprint in its [`FootprintTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FootprintId(pub usize);

/// Extrusion parameters of one footprint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FootprintAttributes {
    /// Extrusion height, always positive.
    pub height: f64,
    /// Vertical offset of the prism base.
    pub z_offset: f64,
}

/// One normalised footprint part with its attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct FootprintEntry {
    pub id: FootprintId,
    pub polygon: Polygon<f64>,
    pub attributes: FootprintAttributes,
    /// `(feature, part)` the footprint was read from.
    pub source: (usize, usize),
}

/// Read-only table of every footprint of a layer, indexed by [`FootprintId`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FootprintTable {
    entries: Vec<FootprintEntry>,
}

impl FootprintTable {
    /// Builds a table, assigning ids in insertion order.
    #[must_use]
    pub fn from_parts(parts: Vec<(Polygon<f64>, FootprintAttributes, (usize, usize))>) -> Self {
        let entries = parts
            .into_iter()
            .enumerate()
            .map(|(i, (polygon, attributes, source))| FootprintEntry {
                id: FootprintId(i),
                polygon,
                attributes,
                source,
            })
            .collect();
        Self { entries }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: FootprintId) -> Option<&FootprintEntry> {
        self.entries.get(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FootprintEntry> {
        self.entries.iter()
    }

    /// All footprint polygons, in id order.
    pub fn polygons(&self) -> impl Iterator<Item = &Polygon<f64>> {
        self.entries.iter().map(|e| &e.polygon)
    }
}

/// Builds the footprint table of a layer.
///
/// Walks features in order, normalises every part and resolves attributes
/// once per feature; ids are consecutive in `(feature, part)` order.
pub struct BuildFootprintTable<'a> {
    layer: &'a FeatureLayer,
    fields: &'a AttributeFields,
    normalize: bool,
}

impl<'a> BuildFootprintTable<'a> {
    #[must_use]
    pub fn new(layer: &'a FeatureLayer, fields: &'a AttributeFields, normalize: bool) -> Self {
        Self {
            layer,
            fields,
            normalize,
        }
    }

    /// Executes the build.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty layer, a degenerate ring, or an
    /// attribute value that cannot be parsed.
    pub fn execute(&self) -> Result<FootprintTable> {
        let origin = self.layer.origin()?;
        let origin = self.normalize.then_some(origin);

        let mut parts = Vec::with_capacity(self.layer.part_count());
        for feature in &self.layer.features {
            let feature_ref = FeatureRef {
                path: &self.layer.path,
                index: feature.index,
            };
            let attributes = ResolveAttributes::new(&feature.properties, self.fields, feature_ref).execute()?;
            for (part, rings) in feature.parts.iter().enumerate() {
                let source = (feature.index, part);
                let polygon = NormalizeFootprint::new(rings, source)
                    .with_origin(origin)
                    .execute()?;
                parts.push((polygon, attributes, source));
            }
        }

        let table = FootprintTable::from_parts(parts);
        info!(footprints = table.len(), "built footprint table");
        Ok(table)
    }
}
