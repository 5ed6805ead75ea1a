//! Turns a layer of 2D building footprints into fused, watertight 3D solids.
//!
//! Footprints that touch or nearly touch are grouped into clusters, each
//! footprint is extruded to a prism, and the prisms of a cluster are unioned
//! into one solid. Unions that cannot be made valid are kept apart on an
//! error layer instead of failing the run.

pub mod config;
pub mod error;
pub mod export;
pub mod footprint;
pub mod input;
pub mod math;
pub mod mesh;
pub mod operations;
pub mod pipeline;
pub mod topology;

pub use error::{GeosolidError, Result};
