//! [`SeqNodeList`]: the sorted-`Vec<Block>` variant of the indel engine,
//! used only to cross-check [`SeqNodeTree`](crate::seq_node::SeqNodeTree)
//! (spec.md S4.3, testable property 3). Gated behind the `cross-check`
//! feature.
//!
//! Grounded on `original_source/classes/seq_node_as_list.py`
//! (`SequenceNodeAsList.find_block_index_and_sites_count`); the
//! classification and rewrite rules are identical to the tree variant, only
//! the storage and search are linear instead of logarithmic.

use crate::block::{Block, IndelEvent, PURE_INSERTION};

#[derive(Debug)]
pub struct SeqNodeList {
    node_id: u64,
    blocks: Vec<Block>,
    length: u64,
}

impl SeqNodeList {
    pub fn new(node_id: u64, parent_length: u64) -> Self {
        Self {
            node_id,
            blocks: vec![Block::new(0, parent_length, 0)],
            length: parent_length,
        }
    }

    pub fn node_id(&self) -> u64 {
        self.node_id
    }

    pub fn len(&self) -> u64 {
        self.length
    }

    pub fn blocks(&self) -> Vec<Block> {
        self.blocks.clone()
    }

    pub fn apply_events(&mut self, events: &[IndelEvent]) {
        for &event in events {
            self.apply_event(event);
        }
    }

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
                return;
            }
            self.apply_insertion(event);
        } else {
            if event.place >= self.length as i64 {
                return;
            }
            self.apply_deletion(event, pending);
        }
    }

    /// Linear scan mirroring `BlockTree::search`'s half-open conventions.
    fn search(&self, position: i64, is_insertion: bool) -> (usize, i64) {
        let mut position = position;
        for (idx, b) in self.blocks.iter().enumerate() {
            let own_len = b.len() as i64;
            if (position < own_len && !is_insertion) || (position <= own_len && is_insertion) {
                return (idx, position);
            }
            position -= own_len;
        }
        let last = self.blocks.len() - 1;
        (last, position + self.blocks[last].len() as i64)
    }

    fn key_index(&self, key: i64) -> usize {
        self.blocks
            .iter()
            .position(|b| b.ancestor_index == key)
            .expect("key must exist")
    }

    fn insert_sorted(&mut self, block: Block) -> usize {
        let idx = self
            .blocks
            .partition_point(|b| b.ancestor_index < block.ancestor_index);
        self.blocks.insert(idx, block);
        idx
    }

    fn delete_key(&mut self, key: i64) {
        let idx = self.key_index(key);
        self.blocks.remove(idx);
    }

    fn replace_key(&mut self, old_key: i64, new_block: Block) {
        self.delete_key(old_key);
        self.insert_sorted(new_block);
    }

    fn apply_insertion(&mut self, event: IndelEvent) {
        let length = event.length as u64;
        if event.place == 0 {
            let (idx, _) = self.search(0, true);
            if self.blocks[idx].ancestor_index == PURE_INSERTION {
                self.blocks[idx].inserted_count += length;
            } else {
                self.insert_sorted(Block::new(PURE_INSERTION, 0, length));
            }
            self.length += length;
            return;
        }

        let (idx, r) = self.search(event.place, true);
        let block = self.blocks[idx];
        let c = block.copied_count as i64;
        if r < c {
            let right = Block::new(block.ancestor_index + r, (c - r) as u64, block.inserted_count);
            self.blocks[idx].copied_count = r as u64;
            self.blocks[idx].inserted_count = length;
            self.insert_sorted(right);
        } else {
            self.blocks[idx].inserted_count += length;
        }
        self.length += length;
    }

    fn apply_deletion(&mut self, event: IndelEvent, pending: &mut Vec<IndelEvent>) {
        let (idx, r) = self.search(event.place, false);
        let block = self.blocks[idx];
        let a = block.ancestor_index;
        let c = block.copied_count as i64;
        let i = block.inserted_count as i64;
        let len = event.length;

        if r >= c {
            let deleted_from_insertion = (i - (r - c)).min(len);
            self.delete_from_insertion_part(idx, len, deleted_from_insertion, event.place, pending);
            return;
        }

        if r > 0 {
            if r + len <= c {
                let split = Block::new(a + r + len, (c - r - len) as u64, block.inserted_count);
                self.blocks[idx].copied_count = r as u64;
                self.blocks[idx].inserted_count = 0;
                if !split.is_redundant() {
                    self.insert_sorted(split);
                }
                self.length -= len as u64;
            } else {
                let removed_from_copied = c - r;
                let deleted_from_insertion = (len - removed_from_copied).min(i);
                self.blocks[idx].copied_count -= removed_from_copied as u64;
                self.length -= removed_from_copied as u64;
                let deletion_len = len - removed_from_copied;
                self.delete_from_insertion_part(idx, deletion_len, deleted_from_insertion, event.place, pending);
            }
            return;
        }

        if len < c {
            self.replace_key(a, Block::new(a + len, (c - len) as u64, block.inserted_count));
            self.length -= len as u64;
        } else if len == c {
            self.length -= len as u64;
            if a != PURE_INSERTION && i > 0 {
                self.delete_key(a);
                pending.push(IndelEvent::new(true, event.place, i));
            } else if a != PURE_INSERTION {
                self.delete_key(a);
            } else {
                self.blocks[idx].copied_count = 0;
                if self.blocks[idx].is_redundant() {
                    self.delete_key(PURE_INSERTION);
                }
            }
        } else {
            // DeletionAllCopiedUncontained / DeletionAllCopiedUncontainedAtStart,
            // mirroring seq_node.rs: only the true AtStart case (deletion at
            // position 0, no predecessor block) may rekey this block to
            // pure-insertion in place. Otherwise the block is removed and any
            // surviving inserted tail is merged onto whatever block now
            // precedes the deletion point.
            let remaining = len - c;
            let deleted_from_insertion = remaining.min(i);
            self.length -= (c + deleted_from_insertion) as u64;
            let new_inserted = i - deleted_from_insertion;
            let at_start = event.place == 0 && idx == 0;
            if new_inserted > 0 {
                if at_start {
                    self.blocks[idx].copied_count = 0;
                    self.blocks[idx].inserted_count = new_inserted as u64;
                    self.blocks[idx].ancestor_index = PURE_INSERTION;
                } else {
                    self.delete_key(a);
                    let (predecessor, _) = self.search(event.place, true);
                    self.blocks[predecessor].inserted_count += new_inserted as u64;
                }
            } else {
                self.delete_key(a);
                let residual = remaining - deleted_from_insertion;
                if residual > 0 {
                    pending.push(IndelEvent::new(false, event.place, residual));
                }
            }
        }
    }

    fn delete_from_insertion_part(
        &mut self,
        idx: usize,
        deletion_len: i64,
        deleted_from_insertion: i64,
        place: i64,
        pending: &mut Vec<IndelEvent>,
    ) {
        self.blocks[idx].inserted_count -= deleted_from_insertion as u64;
        self.length -= deleted_from_insertion as u64;
        if self.blocks[idx].is_redundant() {
            let key = self.blocks[idx].ancestor_index;
            self.delete_key(key);
        }
        let left_to_delete_later = deletion_len - deleted_from_insertion;
        if left_to_delete_later > 0 {
            pending.push(IndelEvent::new(false, place, left_to_delete_later));
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::seq_node::SeqNodeTree;

    fn cross_check(events: &[IndelEvent], parent_length: u64) {
        let mut tree = SeqNodeTree::new(1, parent_length);
        let mut list = SeqNodeList::new(1, parent_length);
        tree.apply_events(events);
        list.apply_events(events);
        assert_eq!(tree.blocks(), list.blocks());
        assert_eq!(tree.len(), list.len());
    }

    #[test]
    fn test_matches_tree_variant_scenario_s3() {
        cross_check(
            &[
                IndelEvent::new(true, 30, 5),
                IndelEvent::new(true, 40, 12),
                IndelEvent::new(false, 35, 5),
            ],
            100,
        );
    }

    #[test]
    fn test_matches_tree_variant_straddling_deletion() {
        cross_check(
            &[
                IndelEvent::new(true, 5, 3),
                IndelEvent::new(false, 0, 10),
            ],
            10,
        );
    }

    #[test]
    fn test_matches_tree_variant_deletion_all_copied_uncontained_merges_tail() {
        cross_check(
            &[
                IndelEvent::new(true, 10, 1),
                IndelEvent::new(true, 25, 2),
                IndelEvent::new(false, 11, 15),
            ],
            30,
        );
    }

    #[test]
    fn test_matches_tree_variant_deletion_all_copied_uncontained_at_start() {
        cross_check(
            &[IndelEvent::new(true, 10, 5), IndelEvent::new(false, 0, 13)],
            10,
        );
    }

    #[test]
    fn test_matches_tree_variant_many_random_like_events() {
        cross_check(
            &[
                IndelEvent::new(true, 0, 4),
                IndelEvent::new(true, 10, 2),
                IndelEvent::new(false, 3, 6),
                IndelEvent::new(true, 0, 1),
                IndelEvent::new(false, 50, 20),
            ],
            60,
        );
    }
}
