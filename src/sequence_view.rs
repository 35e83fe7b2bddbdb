//! [`SequenceView`]: a node's ordered view over the shared
//! [`SuperSequence`] spine (spec.md S4.5-S4.6).
//!
//! Grounded on `original_source/indelsim/classes/sequence.py`
//! (`Sequence.init_root_seq`, `Sequence.generate_sequence`).

use crate::block::Block;
use crate::newtypes::SiteId;
use crate::super_sequence::SuperSequence;

/// The ordered list of site handles making up one node's sequence, plus
/// whether this node's row should be included in the final alignment.
#[derive(Debug, Clone)]
pub struct SequenceView {
    node_id: u64,
    handles: Vec<SiteId>,
    is_saved: bool,
}

impl SequenceView {
    pub fn node_id(&self) -> u64 {
        self.node_id
    }

    pub fn handles(&self) -> &[SiteId] {
        &self.handles
    }

    pub fn is_saved(&self) -> bool {
        self.is_saved
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// The root node's view: every site of the super-sequence's initial
    /// content, in order. If `is_saved`, every site it covers becomes an
    /// alignment column (`Sequence.init_root_seq`'s `reference_position`
    /// call on each site, when the root is itself a saved node).
    pub fn root(super_sequence: &mut SuperSequence, node_id: u64, is_saved: bool) -> Self {
        let handles: Vec<SiteId> = (0..super_sequence.root_length())
            .map(|i| super_sequence.root_site(i))
            .collect();
        if is_saved {
            for &site in &handles {
                super_sequence.reference(site);
            }
        }
        Self {
            node_id,
            handles,
            is_saved,
        }
    }

    /// Build a node's view from its parent's view and its own block list
    /// (the output of [`SeqNodeTree::blocks`](crate::seq_node::SeqNodeTree::blocks)
    /// or an equivalent cross-check variant).
    ///
    /// Blocks with `ancestor_index >= 0` copy a contiguous run of the
    /// parent's handles verbatim; a block's `inserted_count` is realized by
    /// splicing that many brand new sites into the shared spine right after
    /// the most recently placed handle (or the spine's anchor, if nothing
    /// has been placed yet -- this node's sequence started with new
    /// content). Splicing a sibling node's insertion after the same parent
    /// handle deliberately orders the two lineages' new sites adjacently in
    /// the shared spine; that ordering, plus gap-run padding, is what makes
    /// [`MsaBuilder`](crate::msa::MsaBuilder) produce a consistent
    /// alignment across the whole tree.
    ///
    /// If `is_saved`, every copied handle is referenced (promoting it to an
    /// alignment column, if some earlier saved view hadn't already) and
    /// every freshly-inserted site is born as a column outright
    /// (`Sequence.generate_sequence`'s `reference_position` / `is_to_save`
    /// handling). Unsaved interior views leave the sites they merely pass
    /// through untouched; a site earns a column only once some saved
    /// descendant actually reaches it.
    pub fn generate(
        super_sequence: &mut SuperSequence,
        parent_view: &SequenceView,
        blocks: &[Block],
        node_id: u64,
        is_saved: bool,
    ) -> Self {
        let mut handles = Vec::new();
        let mut cursor = super_sequence.anchor();
        for block in blocks {
            if block.ancestor_index >= 0 {
                let start = block.ancestor_index as usize;
                let end = start + block.copied_count as usize;
                handles.extend_from_slice(&parent_view.handles[start..end]);
                if is_saved {
                    for &site in &parent_view.handles[start..end] {
                        super_sequence.reference(site);
                    }
                }
                if let Some(&last) = handles.last() {
                    cursor = last;
                }
            }
            for _ in 0..block.inserted_count {
                let new_site = super_sequence.insert_after(cursor, is_saved);
                handles.push(new_site);
                cursor = new_site;
            }
        }
        Self {
            node_id,
            handles,
            is_saved,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_root_view_covers_every_root_site() {
        let mut ss = SuperSequence::new(4);
        let view = SequenceView::root(&mut ss, 0, true);
        assert_eq!(view.len(), 4);
        assert_eq!(view.handles()[0], ss.root_site(0));
        assert_eq!(view.handles()[3], ss.root_site(3));
        assert!(ss.is_column(ss.root_site(0)));
    }

    #[test]
    fn test_root_view_unsaved_does_not_reference() {
        let mut ss = SuperSequence::new(4);
        let _view = SequenceView::root(&mut ss, 0, false);
        assert!(!ss.is_column(ss.root_site(0)));
        assert_eq!(ss.num_columns(), 0);
    }

    #[test]
    fn test_generate_copies_and_inserts() {
        let mut ss = SuperSequence::new(5);
        let parent = SequenceView::root(&mut ss, 0, true);
        // blocks: copy parent[0..2], insert 2 new, copy parent[2..5]
        let blocks = vec![Block::new(0, 2, 2), Block::new(2, 3, 0)];
        let child = SequenceView::generate(&mut ss, &parent, &blocks, 1, true);
        assert_eq!(child.len(), 7);
        assert_eq!(child.handles()[0], parent.handles()[0]);
        assert_eq!(child.handles()[1], parent.handles()[1]);
        assert_eq!(child.handles()[4], parent.handles()[2]);
        assert_eq!(child.handles()[6], parent.handles()[4]);
    }

    #[test]
    fn test_generate_leading_pure_insertion_splices_after_anchor() {
        let mut ss = SuperSequence::new(3);
        let parent = SequenceView::root(&mut ss, 0, true);
        let blocks = vec![Block::new(-1, 0, 2), Block::new(0, 3, 0)];
        let child = SequenceView::generate(&mut ss, &parent, &blocks, 1, true);
        assert_eq!(child.len(), 5);
        assert_eq!(ss.next_of(ss.anchor()), Some(child.handles()[0]));
    }

    #[test]
    fn test_generate_unsaved_view_leaves_sites_unreferenced() {
        let mut ss = SuperSequence::new(5);
        let parent = SequenceView::root(&mut ss, 0, false);
        let blocks = vec![Block::new(0, 2, 1)];
        let child = SequenceView::generate(&mut ss, &parent, &blocks, 1, false);
        assert_eq!(child.len(), 3);
        assert_eq!(ss.num_columns(), 0);
    }

    #[test]
    fn test_generate_saved_view_references_copied_and_inserted_sites() {
        let mut ss = SuperSequence::new(5);
        let parent = SequenceView::root(&mut ss, 0, false);
        let blocks = vec![Block::new(0, 2, 1)];
        let child = SequenceView::generate(&mut ss, &parent, &blocks, 1, true);
        // 2 copied + 1 freshly inserted = 3 columns, even though the
        // parent view itself was never saved.
        assert_eq!(ss.num_columns(), 3);
        for &site in child.handles() {
            assert!(ss.is_column(site));
        }
    }
}
