//! Stored records with a store-assigned identity.

/// A record the store identifies by key.
///
/// Two values with the same id describe the same record, whatever their
/// other fields say.
pub trait Entity {
    /// Key type; ordered so stores can keep records in id order.
    type Id: Copy + Eq + Ord + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;
}
