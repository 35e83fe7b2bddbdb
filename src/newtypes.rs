//! Small newtype wrappers around the arena indices used throughout the
//! crate, in the same spirit as `tskit`'s `NodeId`/`EdgeId` row-id newtypes:
//! a transparent wrapper that behaves like an integer (ordering, display,
//! conversion) but cannot be confused with indices into a different arena.

macro_rules! impl_index_id {
    ($(#[$attr:meta])* $name: ident) => {
        $(#[$attr])*
        #[repr(transparent)]
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
        pub struct $name(u32);

        impl $name {
            pub(crate) fn new(index: usize) -> Self {
                Self(index as u32)
            }

            pub(crate) fn index(&self) -> usize {
                self.0 as usize
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

impl_index_id!(
    /// An index into a [`BlockTree`](crate::block_tree::BlockTree)'s node arena.
    BlockNodeId
);

impl_index_id!(
    /// A stable handle to a site on the [`SuperSequence`](crate::super_sequence::SuperSequence) spine.
    ///
    /// Handles are arena indices, never addresses: the spine is append-only
    /// (spec.md S9, "Shared super-sequence spine"), so a `SiteId` handed out
    /// to one [`SequenceView`](crate::sequence_view::SequenceView) remains
    /// valid for the lifetime of the simulation.
    SiteId
);
