use crate::math::{Point3, Vector3};

use super::wire::WireId;

slotmap::new_key_type! {
    /// Unique identifier for a face in the topology store.
    pub struct FaceId;
}

/// The supporting plane of a planar face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FacePlane {
    /// A point on the plane.
    pub origin: Point3,
    /// Unit normal pointing out of the body.
    pub normal: Vector3,
}

/// A planar face bounded by one loop.
#[derive(Debug, Clone)]
pub struct FaceData {
    pub plane: FacePlane,
    pub outer_wire: WireId,
}
