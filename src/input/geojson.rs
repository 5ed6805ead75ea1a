use std::path::{Path, PathBuf};

use geo::Coord;
use serde::de::Error as _;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::error::InputError;
use crate::math::polygon_2d::min_corner;

/// Rings of one polygon part: the outer ring first, then holes.
pub type RingSet = Vec<Vec<Coord<f64>>>;

/// One feature of the footprint layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Position of the feature in the source collection.
    pub index: usize,
    /// One ring set per polygon part.
    pub parts: Vec<RingSet>,
    /// Attribute values keyed by field name.
    pub properties: Map<String, Value>,
}

/// A parsed footprint layer.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureLayer {
    pub path: PathBuf,
    pub features: Vec<Feature>,
}

impl FeatureLayer {
    /// Minimum x and y over every coordinate of the layer.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::EmptyLayer`] if the layer holds no coordinates.
    pub fn origin(&self) -> Result<Coord<f64>, InputError> {
        min_corner(
            self.features
                .iter()
                .flat_map(|f| &f.parts)
                .flatten()
                .flatten(),
        )
        .ok_or_else(|| InputError::EmptyLayer {
            path: self.path.clone(),
        })
    }

    /// Total number of polygon parts.
    #[must_use]
    pub fn part_count(&self) -> usize {
        self.features.iter().map(|f| f.parts.len()).sum()
    }
}

#[derive(Debug, Deserialize)]
struct RawCollection {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    features: Vec<RawFeature>,
}

#[derive(Debug, Deserialize)]
struct RawFeature {
    #[serde(default)]
    geometry: Option<RawGeometry>,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct RawGeometry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    coordinates: Value,
}

/// Reads a GeoJSON feature collection of polygon footprints.
pub struct ReadLayer {
    path: PathBuf,
}

impl ReadLayer {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Reads and parses the file.
    ///
    /// # Errors
    ///
    /// Returns an [`InputError`] if the file cannot be read, is not a feature
    /// collection, or holds geometry other than polygons.
    pub fn execute(&self) -> Result<FeatureLayer, InputError> {
        let text = std::fs::read_to_string(&self.path).map_err(|source| InputError::Io {
            path: self.path.clone(),
            source,
        })?;
        let layer = parse_layer(&self.path, &text)?;
        info!(
            path = %self.path.display(),
            features = layer.features.len(),
            parts = layer.part_count(),
            "read footprint layer"
        );
        Ok(layer)
    }
}

/// Parses GeoJSON text; `path` is only used in error messages.
///
/// # Errors
///
/// See [`ReadLayer::execute`].
pub fn parse_layer(path: &Path, text: &str) -> Result<FeatureLayer, InputError> {
    let json_err = |source| InputError::Json {
        path: path.to_path_buf(),
        source,
    };
    let raw: RawCollection = serde_json::from_str(text).map_err(json_err)?;
    if raw.kind != "FeatureCollection" {
        return Err(json_err(serde_json::Error::custom(format!(
            "expected a FeatureCollection, found '{}'",
            raw.kind
        ))));
    }

    let mut features = Vec::with_capacity(raw.features.len());
    for (index, feature) in raw.features.into_iter().enumerate() {
        let Some(geometry) = feature.geometry else {
            warn!(feature = index, "skipping feature without geometry");
            continue;
        };
        let parts = match geometry.kind.as_str() {
            "Polygon" => vec![parse_rings(path, index, &geometry.coordinates)?],
            "MultiPolygon" => {
                let Value::Array(polygons) = &geometry.coordinates else {
                    return Err(malformed(path, index, "MultiPolygon coordinates must be an array"));
                };
                polygons
                    .iter()
                    .map(|p| parse_rings(path, index, p))
                    .collect::<Result<Vec<_>, _>>()?
            }
            other => {
                return Err(InputError::UnsupportedGeometry {
                    path: path.to_path_buf(),
                    feature: index,
                    kind: other.to_string(),
                })
            }
        };
        features.push(Feature {
            index,
            parts,
            properties: feature.properties.unwrap_or_default(),
        });
    }

    Ok(FeatureLayer {
        path: path.to_path_buf(),
        features,
    })
}

fn parse_rings(path: &Path, feature: usize, value: &Value) -> Result<RingSet, InputError> {
    let Value::Array(rings) = value else {
        return Err(malformed(path, feature, "polygon coordinates must be an array of rings"));
    };
    rings
        .iter()
        .map(|ring| {
            let Value::Array(positions) = ring else {
                return Err(malformed(path, feature, "ring must be an array of positions"));
            };
            positions
                .iter()
                .map(|pos| parse_position(path, feature, pos))
                .collect()
        })
        .collect()
}

/// Reads `[x, y]` or `[x, y, z]`; any further ordinates are ignored.
fn parse_position(path: &Path, feature: usize, value: &Value) -> Result<Coord<f64>, InputError> {
    let ordinates = value.as_array().map(|a| a.iter().map(Value::as_f64).collect::<Vec<_>>());
    match ordinates.as_deref() {
        Some([Some(x), Some(y), ..]) if x.is_finite() && y.is_finite() => Ok(Coord { x: *x, y: *y }),
        _ => Err(malformed(path, feature, &format!("invalid position {value}"))),
    }
}

fn malformed(path: &Path, feature: usize, message: &str) -> InputError {
    InputError::MalformedCoordinates {
        path: path.to_path_buf(),
        feature,
        message: message.to_string(),
    }
}
