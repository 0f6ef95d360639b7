//! Entity trait: identity that survives state changes.

/// Entity marker + minimal interface.
///
/// Two entities are the same entity when their ids match, whatever the rest
/// of their state looks like.
pub trait Entity {
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug + core::fmt::Display;

    fn id(&self) -> &Self::Id;
}
