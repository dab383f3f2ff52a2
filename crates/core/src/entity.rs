//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Companies, warehouses, products and suppliers are entities: two records with
/// the same identifier are the same thing even if their attributes differ.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}
