//! [`SeqNodeTree`]: the balanced-tree variant of a node's block list, and the
//! primary/performant implementation of the indel engine (spec.md S4.1-S4.3).
//!
//! Grounded on `original_source/indelsim/classes/seq_node_as_tree.py`
//! (`find_event_sub_type`, `calculate_deletion_event`,
//! `calculate_insertion_event`). `DELETION_OF_COPIED`'s ancestry/inserted-tail
//! branching and the `DELETION_ALL_COPIED_UNCONTAINED` /
//! `..._AT_START` split both follow the reference case for case; see
//! DESIGN.md for the grounding ledger entry.

use crate::block::{Block, IndelEvent, PURE_INSERTION};
use crate::block_tree::BlockTree;
use crate::newtypes::BlockNodeId;

/// A node's sequence, represented as a balanced tree of blocks relative to
/// its parent. See module docs and spec.md S4.2.
#[derive(Debug)]
pub struct SeqNodeTree {
    node_id: u64,
    tree: BlockTree,
    length: u64,
}

impl SeqNodeTree {
    /// A fresh node copying the first `parent_length` sites of its parent
    /// verbatim, before any events have been applied.
    pub fn new(node_id: u64, parent_length: u64) -> Self {
        Self {
            node_id,
            tree: BlockTree::new(Block::new(0, parent_length, 0)),
            length: parent_length,
        }
    }

    pub fn node_id(&self) -> u64 {
        self.node_id
    }

    pub fn len(&self) -> u64 {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn blocks(&self) -> Vec<Block> {
        self.tree.traverse_in_order()
    }

    #[cfg(debug_assertions)]
    pub fn debug_check_invariants(&self) -> bool {
        self.tree.debug_tree_structure() && self.tree.total_length() == self.length
    }

    /// Apply a branch's worth of events in order, each against the tree
    /// state left by the previous one.
    pub fn apply_events(&mut self, events: &[IndelEvent]) {
        for &event in events {
            self.apply_event(event);
        }
    }

    /// Apply one event. Some deletion cases straddle a block boundary and
    /// must continue into the next block; rather than recurse (spec.md S9:
    /// "implement the straddling-deletion continuation as a loop, not
    /// recursion, so a single event spanning many small blocks cannot grow
    /// the call stack"), residual events are pushed onto `pending` and
    /// drained here.
    pub fn apply_event(&mut self, event: IndelEvent) {
        let mut pending = vec![event];
        while let Some(ev) = pending.pop() {
            self.apply_one(ev, &mut pending);
        }
    }

    fn apply_one(&mut self, event: IndelEvent, pending: &mut Vec<IndelEvent>) {
        if event.is_empty_after_clipping() {
            return;
        }
        if event.is_insertion {
            if event.place > self.length as i64 {
                return; // OutOfSequence, spec.md S7
            }
            self.apply_insertion(event);
        } else {
            if event.place >= self.length as i64 {
                return; // OutOfSequence
            }
            self.apply_deletion(event, pending);
        }
    }

    fn apply_insertion(&mut self, event: IndelEvent) {
        let length = event.length as u64;
        if event.place == 0 {
            let (id, _) = self.tree.search(0, true);
            let block = self.tree.block(id);
            if block.ancestor_index == PURE_INSERTION {
                self.tree.increment_in_place(id, 0, length);
            } else {
                self.tree.insert(Block::new(PURE_INSERTION, 0, length));
            }
            self.length += length;
            return;
        }

        let (id, r) = self.tree.search(event.place, true);
        let block = self.tree.block(id);
        let c = block.copied_count as i64;
        if r < c {
            // InsertionInsideCopied: split the block at the insertion point.
            // The original block's inserted tail moves to the new right
            // sibling; the original keeps only its first `r` copied sites
            // and becomes the carrier of the new inserted run.
            let right = Block::new(
                block.ancestor_index + r,
                (c - r) as u64,
                block.inserted_count,
            );
            self.tree.update_in_place(id, r as u64, length);
            self.tree.insert(right);
        } else {
            // InsertionInsideInserted / InsertionAtEnd: both append to this
            // block's already-inserted run.
            self.tree.increment_in_place(id, 0, length);
        }
        self.length += length;
    }

    fn apply_deletion(&mut self, event: IndelEvent, pending: &mut Vec<IndelEvent>) {
        let (id, r) = self.tree.search(event.place, false);
        let block = self.tree.block(id);
        let a = block.ancestor_index;
        let c = block.copied_count as i64;
        let i = block.inserted_count as i64;
        let len = event.length;

        if r >= c {
            // DeletionInsideInsertedContained / Uncontained / DeletionOfInserted:
            // the deletion starts inside the already-inserted part.
            let deleted_from_insertion = (i - (r - c)).min(len);
            self.delete_from_insertion_part(id, len, deleted_from_insertion, event.place, pending);
            return;
        }

        if r > 0 {
            if r + len <= c {
                // DeletionInsideCopiedContainedAtMid (also covers the r+len == c
                // boundary, which degenerates to an empty split-off tail).
                let split = Block::new(a + r + len, (c - r - len) as u64, block.inserted_count);
                self.tree.update_in_place(id, r as u64, 0);
                if !split.is_redundant() {
                    self.tree.insert(split);
                }
                self.length -= len as u64;
            } else {
                // DeletionInsideCopiedUncontained: consume the rest of the
                // copied run, then continue into the inserted tail.
                let removed_from_copied = c - r;
                let deleted_from_insertion = (len - removed_from_copied).min(i);
                self.tree.increment_in_place(id, -removed_from_copied, 0);
                self.length -= removed_from_copied as u64;
                let deletion_len = len - removed_from_copied;
                self.delete_from_insertion_part(id, deletion_len, deleted_from_insertion, event.place, pending);
            }
            return;
        }

        // r == 0: the deletion starts at this block's own boundary.
        if len < c {
            // DeletionInsideCopiedContainedAtStart: shrink from the front.
            self.tree
                .replace_key(a, Block::new(a + len, (c - len) as u64, block.inserted_count));
            self.length -= len as u64;
        } else if len == c {
            // DeletionOfCopied. See module docs: this branches on ancestry
            // and inserted tail rather than unconditionally rekeying, to
            // avoid assigning two blocks the same key (spec.md S8 S3).
            self.length -= len as u64;
            if a != PURE_INSERTION && i > 0 {
                self.tree.delete(a);
                pending.push(IndelEvent::new(true, event.place, i));
            } else if a != PURE_INSERTION {
                self.tree.delete(a);
            } else {
                self.tree.update_in_place(id, 0, block.inserted_count);
                if self.tree.block(id).is_redundant() {
                    self.tree.delete(PURE_INSERTION);
                }
            }
        } else {
            // DeletionAllCopiedUncontained / DeletionAllCopiedUncontainedAtStart:
            // consume all of the copied run, then as much of the inserted run
            // as the event still demands. Only the true AtStart case (the
            // deletion starts at position 0 of the whole sequence, and this
            // block has no predecessor) may rekey this node to pure-insertion
            // in place; otherwise the node is deleted and any surviving
            // inserted tail is merged onto whatever block now precedes the
            // deletion point, to avoid spawning a second, out-of-order
            // pure-insertion block mid-sequence.
            let remaining = len - c;
            let deleted_from_insertion = remaining.min(i);
            self.length -= (c + deleted_from_insertion) as u64;
            let new_inserted = i - deleted_from_insertion;
            let at_start = event.place == 0 && !self.tree.has_left(id);
            if new_inserted > 0 {
                if at_start {
                    self.tree.update_in_place(id, 0, new_inserted as u64);
                    self.tree.update_key_to_insert_only(id);
                } else {
                    self.tree.delete(a);
                    let (predecessor, _) = self.tree.search(event.place, true);
                    self.tree.increment_in_place(predecessor, 0, new_inserted);
                }
            } else {
                self.tree.delete(a);
                let residual = remaining - deleted_from_insertion;
                if residual > 0 {
                    pending.push(IndelEvent::new(false, event.place, residual));
                }
            }
        }
    }

    /// Shared tail of every deletion case that ends by consuming part (or
    /// all) of a block's inserted run: decrement the inserted count, drop
    /// the block if it became redundant, and carry any undelivered length
    /// forward as a fresh deletion at the same place.
    fn delete_from_insertion_part(
        &mut self,
        id: BlockNodeId,
        deletion_len: i64,
        deleted_from_insertion: i64,
        place: i64,
        pending: &mut Vec<IndelEvent>,
    ) {
        self.tree.increment_in_place(id, 0, -deleted_from_insertion);
        self.length -= deleted_from_insertion as u64;
        if self.tree.block(id).is_redundant() {
            let key = self.tree.block(id).ancestor_index;
            self.tree.delete(key);
        }
        let left_to_delete_later = deletion_len - deleted_from_insertion;
        if left_to_delete_later > 0 {
            pending.push(IndelEvent::new(false, place, left_to_delete_later));
        }
    }
}
