use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the footprint-to-solid pipeline.
#[derive(Debug, Error)]
pub enum GeosolidError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Errors raised while reading the footprint layer or resolving its attributes.
///
/// These abort the whole run and carry enough context to find the offending row.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not a valid feature collection: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{}: feature {feature} has unsupported geometry type '{kind}'", path.display())]
    UnsupportedGeometry {
        path: PathBuf,
        feature: usize,
        kind: String,
    },

    #[error("{}: feature {feature} has malformed coordinates: {message}", path.display())]
    MalformedCoordinates {
        path: PathBuf,
        feature: usize,
        message: String,
    },

    #[error("{}: layer contains no coordinates", path.display())]
    EmptyLayer { path: PathBuf },

    #[error("{}: feature {feature}: height field '{field}' holds non-numeric value {value:?}", path.display())]
    InvalidHeight {
        path: PathBuf,
        feature: usize,
        field: String,
        value: String,
    },

    #[error("{}: feature {feature}: z-level field '{field}' holds non-numeric value {value:?}", path.display())]
    InvalidZLevel {
        path: PathBuf,
        feature: usize,
        field: String,
        value: String,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Errors related to 2D footprint geometry.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error(
        "feature {feature}, part {part}: ring {ring} has {distinct} distinct points, at least 3 are required"
    )]
    DegenerateRing {
        feature: usize,
        part: usize,
        ring: usize,
        distinct: usize,
    },

    #[error("feature {feature}, part {part}: polygon has no outer ring")]
    MissingOuterRing { feature: usize, part: usize },
}

/// Errors raised by the triangle-mesh kernel.
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("triangulation failed: {0}")]
    Triangulation(String),

    #[error("degenerate mesh: {0}")]
    Degenerate(String),

    #[error("boolean union failed: {0}")]
    Boolean(String),
}

/// Errors related to the boundary representation of exported solids.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("invalid topology: {0}")]
    InvalidTopology(String),
}

/// Errors raised while writing the CAD document.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("entity {0} does not exist in the document")]
    UnknownEntity(usize),

    #[error("entity {0} is not a mesh")]
    NotAMesh(usize),

    #[error("mesh has {vertices} vertices but face {face} references vertex {index}")]
    FaceOutOfRange {
        vertices: usize,
        face: usize,
        index: u32,
    },

    #[error("layer '{0}' was not declared before use")]
    UnknownLayer(String),

    #[error("cannot build solid body: {0}")]
    Brep(#[from] TopologyError),

    #[error("cannot write {}: {message}", path.display())]
    Write { path: PathBuf, message: String },
}

/// Convenience type alias for results using [`GeosolidError`].
pub type Result<T> = std::result::Result<T, GeosolidError>;
