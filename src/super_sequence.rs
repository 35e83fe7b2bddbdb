//! [`SuperSequence`]: the append-only arena backing every site that has ever
//! existed across the whole simulation run, linked into a single spine that
//! determines column order for the final alignment (spec.md S4.5).
//!
//! Grounded on `original_source/indelsim/classes/super_sequence.py`, which
//! uses `llist.sllist` (a Python singly linked list) for the same purpose;
//! here the spine is realized as explicit `next: Option<SiteId>` links over
//! an arena `Vec`, in the same arena-of-indices style as [`BlockTree`](crate::block_tree::BlockTree)
//! (spec.md S9).
//!
//! The reference's list head implicitly serves as an always-present anchor
//! before the first real column; this is made explicit here as `SiteId(0)`,
//! a dedicated anchor site at absolute position 0 that never holds a
//! residue, so insertions at the very start of a sequence always have a
//! real predecessor to splice after.
//!
//! A site existing on the spine does not by itself make it an MSA column:
//! `original_source/indelsim/classes/super_sequence.py`'s
//! `reference_position` only flips `is_column` true the first time a saved
//! [`SequenceView`](crate::sequence_view::SequenceView) actually reads a
//! site, and `insert_item_at_position` takes the new site's `is_column`
//! status directly from whether the inserting view is saved. A site that no
//! saved view ever reaches (e.g. inserted on an internal branch, then
//! deleted along every lineage before reaching a leaf) stays off the
//! alignment entirely, per spec.md S3 and testable property 5.

use crate::newtypes::SiteId;

struct SiteRecord {
    next: Option<SiteId>,
    is_column: bool,
    absolute_position: Option<u64>,
}

/// The shared spine of sites. `root_length` initial sites are created at
/// construction (one per column of the root sequence); every later
/// insertion event across every node in the tree appends further sites via
/// [`SuperSequence::insert_after`].
pub struct SuperSequence {
    sites: Vec<SiteRecord>,
    anchor: SiteId,
    root_length: u64,
    num_columns: u64,
}

impl SuperSequence {
    pub fn new(root_length: u64) -> Self {
        let mut sites = Vec::with_capacity(root_length as usize + 1);
        sites.push(SiteRecord {
            next: None,
            is_column: false,
            absolute_position: None,
        });
        let anchor = SiteId::new(0);
        let mut previous = anchor;
        for _ in 0..root_length {
            let id = SiteId::new(sites.len());
            sites.push(SiteRecord {
                next: None,
                is_column: false,
                absolute_position: None,
            });
            sites[previous.index()].next = Some(id);
            previous = id;
        }
        Self {
            sites,
            anchor,
            root_length,
            num_columns: 0,
        }
    }

    pub fn anchor(&self) -> SiteId {
        self.anchor
    }

    pub fn root_length(&self) -> u64 {
        self.root_length
    }

    /// The handle for root column `index` (0-based, `index < root_length`).
    pub fn root_site(&self, index: u64) -> SiteId {
        debug_assert!(index < self.root_length);
        SiteId::new(index as usize + 1)
    }

    pub fn next_of(&self, id: SiteId) -> Option<SiteId> {
        self.sites[id.index()].next
    }

    /// Mark a site as a retained alignment column, if it isn't already
    /// (`reference_position` in the reference implementation). Idempotent:
    /// the MSA width only grows on a site's first reference.
    pub fn reference(&mut self, id: SiteId) {
        let site = &mut self.sites[id.index()];
        if !site.is_column {
            site.is_column = true;
            self.num_columns += 1;
        }
    }

    /// Splice a brand new site into the spine immediately after `after`,
    /// returning its handle. Chaining calls (using the previous return
    /// value as the next `after`) appends a run of sites in order.
    ///
    /// `is_column` is taken directly from whether the inserting view is
    /// saved (`insert_item_at_position`'s `is_to_save` argument), not routed
    /// through [`SuperSequence::reference`]: a fresh site belongs to exactly
    /// one view at the moment it is created, so there is no "first
    /// reference" to detect separately from its birth.
    pub fn insert_after(&mut self, after: SiteId, is_column: bool) -> SiteId {
        let new_id = SiteId::new(self.sites.len());
        let after_next = self.sites[after.index()].next;
        self.sites.push(SiteRecord {
            next: after_next,
            is_column,
            absolute_position: None,
        });
        self.sites[after.index()].next = Some(new_id);
        if is_column {
            self.num_columns += 1;
        }
        new_id
    }

    /// Walk the spine from the anchor, assigning each column site its final
    /// column number; non-column sites are left without a position. Must
    /// run once, after every node has finished generating its sequence
    /// (spec.md S4.5); [`SuperSequence::absolute_position`] panics if called
    /// on a site that isn't a column, or before this has run.
    pub fn assign_absolute_positions(&mut self) {
        let mut position = 0u64;
        let mut current = Some(self.anchor);
        while let Some(id) = current {
            if self.sites[id.index()].is_column {
                self.sites[id.index()].absolute_position = Some(position);
                position += 1;
            }
            current = self.sites[id.index()].next;
        }
    }

    pub fn absolute_position(&self, id: SiteId) -> u64 {
        self.sites[id.index()]
            .absolute_position
            .expect("absolute_position queried on a non-column site, or before assign_absolute_positions ran")
    }

    pub fn is_column(&self, id: SiteId) -> bool {
        self.sites[id.index()].is_column
    }

    /// The MSA width: the number of sites with `is_column = true` (spec.md
    /// S8 testable property 5), *not* the total number of sites ever
    /// created on the spine.
    pub fn num_columns(&self) -> u64 {
        self.num_columns
    }

    pub fn total_sites(&self) -> usize {
        self.sites.len()
    }
}
