use super::face::FaceId;

slotmap::new_key_type! {
    /// Unique identifier for a shell in the topology store.
    pub struct ShellId;
}

/// An edge-connected set of faces.
#[derive(Debug, Clone)]
pub struct ShellData {
    pub faces: Vec<FaceId>,
    /// Whether every edge of the shell is shared by exactly two faces.
    pub is_closed: bool,
}
