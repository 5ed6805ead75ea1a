//! Reading the footprint layer.

mod geojson;

pub use geojson::{parse_layer, Feature, FeatureLayer, ReadLayer, RingSet};
