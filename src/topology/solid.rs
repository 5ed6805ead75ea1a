use super::shell::ShellId;

slotmap::new_key_type! {
    /// Unique identifier for a solid in the topology store.
    pub struct SolidId;
}

/// A body made of one or more disjoint shells.
///
/// Each shell becomes its own lump when written out.
#[derive(Debug, Clone)]
pub struct SolidData {
    pub shells: Vec<ShellId>,
}
