use super::edge::EdgeId;

slotmap::new_key_type! {
    /// Unique identifier for a wire in the topology store.
    pub struct WireId;
}

/// An edge used by a face loop, with its direction of travel.
///
/// Every edge of a closed shell is used exactly twice, once in each
/// direction; the two uses are partners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrientedEdge {
    pub edge: EdgeId,
    /// If `true`, the loop runs from the edge's start to its end.
    pub forward: bool,
}

impl OrientedEdge {
    #[must_use]
    pub fn new(edge: EdgeId, forward: bool) -> Self {
        Self { edge, forward }
    }
}

/// A closed loop of oriented edges bounding a face.
#[derive(Debug, Clone)]
pub struct WireData {
    /// Loop edges in counter-clockwise order seen from outside the body.
    pub edges: Vec<OrientedEdge>,
}
