use super::classify::FragmentClass;

/// Which operand a fragment originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshSource {
    A,
    B,
}

/// Decides whether a fragment survives the union.
///
/// | Fragment | vs other mesh              | Union   |
/// |----------|----------------------------|---------|
/// | from A   | OUTSIDE B                  | keep    |
/// | from A   | INSIDE B                   | discard |
/// | from A   | ON B, same orientation     | keep    |
/// | from A   | ON B, opposite orientation | discard |
/// | from B   | OUTSIDE A                  | keep    |
/// | from B   | INSIDE A                   | discard |
/// | from B   | ON A, any orientation      | discard |
///
/// Coincident faces facing the same way are kept once (from A); faces facing
/// each other are internal and vanish from both sides.
#[allow(clippy::match_same_arms)]
#[must_use]
pub fn keep_in_union(source: MeshSource, class: FragmentClass) -> bool {
    match (source, class) {
        (MeshSource::A, FragmentClass::Outside) => true,
        (MeshSource::A, FragmentClass::Inside) => false,
        (MeshSource::A, FragmentClass::OnBoundary { same_orientation }) => same_orientation,

        (MeshSource::B, FragmentClass::Outside) => true,
        (MeshSource::B, FragmentClass::Inside) => false,
        (MeshSource::B, FragmentClass::OnBoundary { .. }) => false,
    }
}
