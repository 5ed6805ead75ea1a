use std::fmt;
use std::str::FromStr;

use crate::error::InputError;
use crate::math::Vector3;

/// Height used when a footprint's height attribute is missing or unusable.
pub const DEFAULT_HEIGHT: f64 = 3.0;

/// Mitre limit for the square-cornered growth used by clustering.
pub const MITRE_LIMIT: f64 = 5.0;

/// Ordered translations tried on a prism whose union with the accumulator is invalid.
///
/// Steps are cumulative: attempt `k` moves the prism by the sum of the first
/// `k + 1` entries, visiting (0, 0), (0.1, 0), (0, 0.1), (-0.1, 0.1) and
/// finally back to (0, 0).
pub const NUDGES: [[f64; 3]; 5] = [
    [0.0, 0.0, 0.0],
    [0.1, 0.0, 0.0],
    [-0.1, 0.1, 0.0],
    [-0.1, 0.0, 0.0],
    [0.1, -0.1, 0.0],
];

/// Returns [`NUDGES`] as vectors.
#[must_use]
pub fn default_nudges() -> Vec<Vector3> {
    NUDGES
        .iter()
        .map(|[x, y, z]| Vector3::new(*x, *y, *z))
        .collect()
}

/// Kind of CAD entity written for each solid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputKind {
    /// Raw triangle meshes.
    #[default]
    Mesh,
    /// Volumetric solid entities promoted from the meshes.
    Solid,
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mesh => f.write_str("mesh"),
            Self::Solid => f.write_str("solid"),
        }
    }
}

impl FromStr for OutputKind {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mesh" => Ok(Self::Mesh),
            "solid" => Ok(Self::Solid),
            other => Err(InputError::InvalidConfig(format!(
                "output kind must be 'mesh' or 'solid', got '{other}'"
            ))),
        }
    }
}

/// Names of the feature properties holding extrusion height and vertical offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeFields {
    /// Property holding the extrusion height.
    pub height_field: String,
    /// Property holding the vertical offset, if the layer has one.
    pub z_level_field: Option<String>,
}

/// Parameters of the spatial clustering stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterParams {
    /// Distance the combined region is grown and then shrunk by.
    pub buffer_tolerance: f64,
}

/// Parameters of the prism building stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrismParams {
    /// Distance each footprint is grown by before extrusion.
    pub buffer_tolerance: f64,
    /// Maximum deviation allowed when simplifying the grown boundary.
    pub simplify_tolerance: f64,
}

/// Complete configuration of one conversion run.
///
/// Passed by value into each stage; nothing reads configuration from global state.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub height_field: String,
    pub z_level_field: Option<String>,
    pub buffer_tolerance: f64,
    pub simplify_tolerance: f64,
    pub output_kind: OutputKind,
    /// Translate the layer so its minimum x/y corner sits at the origin.
    pub normalize: bool,
    /// Unify independent clusters on the rayon thread pool.
    pub parallel: bool,
}

impl PipelineConfig {
    /// Creates a configuration with default tolerances for the given height field.
    #[must_use]
    pub fn new(height_field: impl Into<String>) -> Self {
        Self {
            height_field: height_field.into(),
            z_level_field: None,
            buffer_tolerance: 0.1,
            simplify_tolerance: 0.1,
            output_kind: OutputKind::Mesh,
            normalize: true,
            parallel: true,
        }
    }

    /// Sets the vertical offset field.
    #[must_use]
    pub fn with_z_level_field(mut self, field: impl Into<String>) -> Self {
        self.z_level_field = Some(field.into());
        self
    }

    /// Sets the growth/shrink tolerance.
    #[must_use]
    pub fn with_buffer_tolerance(mut self, tolerance: f64) -> Self {
        self.buffer_tolerance = tolerance;
        self
    }

    /// Sets the simplification tolerance.
    #[must_use]
    pub fn with_simplify_tolerance(mut self, tolerance: f64) -> Self {
        self.simplify_tolerance = tolerance;
        self
    }

    /// Sets the output entity kind.
    #[must_use]
    pub fn with_output_kind(mut self, kind: OutputKind) -> Self {
        self.output_kind = kind;
        self
    }

    /// Enables or disables translation to the layer origin.
    #[must_use]
    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    /// Enables or disables parallel cluster processing.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Checks that tolerances are usable and a height field is named.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::InvalidConfig`] describing the first problem found.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.height_field.trim().is_empty() {
            return Err(InputError::InvalidConfig(
                "height field name must not be empty".into(),
            ));
        }
        for (name, value) in [
            ("buffer tolerance", self.buffer_tolerance),
            ("simplify tolerance", self.simplify_tolerance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(InputError::InvalidConfig(format!(
                    "{name} must be a finite non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn attribute_fields(&self) -> AttributeFields {
        AttributeFields {
            height_field: self.height_field.clone(),
            z_level_field: self.z_level_field.clone(),
        }
    }

    #[must_use]
    pub fn cluster_params(&self) -> ClusterParams {
        ClusterParams {
            buffer_tolerance: self.buffer_tolerance,
        }
    }

    #[must_use]
    pub fn prism_params(&self) -> PrismParams {
        PrismParams {
            buffer_tolerance: self.buffer_tolerance,
            simplify_tolerance: self.simplify_tolerance,
        }
    }
}
