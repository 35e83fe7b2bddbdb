//! [`SeqNodeNaive`]: the per-site integer-array oracle (spec.md S4.3,
//! testable property 4). Gated behind the `cross-check` feature.
//!
//! Grounded on `original_source/indelsim/classes/seq_node_naive.py`
//! (`get_block_dto_from_single_branch`). Each site is either `Some(k)`,
//! meaning "copies ancestor column `k`", or `None`, meaning "freshly
//! inserted"; insertion and deletion are plain vector splices, with no
//! classification logic at all -- correctness here is obvious by
//! construction, which is the point of keeping this variant as an oracle.

use crate::block::{Block, IndelEvent, PURE_INSERTION};

#[derive(Debug)]
pub struct SeqNodeNaive {
    node_id: u64,
    sites: Vec<Option<i64>>,
}

impl SeqNodeNaive {
    pub fn new(node_id: u64, parent_length: u64) -> Self {
        Self {
            node_id,
            sites: (0..parent_length as i64).map(Some).collect(),
        }
    }

    pub fn node_id(&self) -> u64 {
        self.node_id
    }

    pub fn len(&self) -> u64 {
        self.sites.len() as u64
    }

    pub fn apply_events(&mut self, events: &[IndelEvent]) {
        for &event in events {
            self.apply_event(event);
        }
    }

    pub fn apply_event(&mut self, event: IndelEvent) {
        if event.is_empty_after_clipping() {
            return;
        }
        if event.is_insertion {
            if event.place > self.len() as i64 {
                return;
            }
            let at = event.place as usize;
            let run = std::iter::repeat(None).take(event.length as usize);
            let tail = self.sites.split_off(at);
            self.sites.extend(run);
            self.sites.extend(tail);
        } else {
            if event.place >= self.len() as i64 {
                return;
            }
            let start = event.place as usize;
            let end = (event.place + event.length).min(self.len() as i64) as usize;
            self.sites.drain(start..end);
        }
    }

    /// Reconstruct the block sequence a block-structured variant would have
    /// produced for the same edits, by grouping consecutive runs of
    /// contiguous ancestor indices and consecutive inserted sites
    /// (`get_block_dto_from_single_branch`).
    pub fn blocks(&self) -> Vec<Block> {
        let mut out = Vec::new();
        let mut i = 0;
        while i < self.sites.len() {
            if let Some(start) = self.sites[i] {
                let mut copied = 1u64;
                let mut j = i + 1;
                while j < self.sites.len() {
                    match self.sites[j] {
                        Some(v) if v == start + copied as i64 => {
                            copied += 1;
                            j += 1;
                        }
                        _ => break,
                    }
                }
                let mut inserted = 0u64;
                while j < self.sites.len() && self.sites[j].is_none() {
                    inserted += 1;
                    j += 1;
                }
                out.push(Block::new(start, copied, inserted));
                i = j;
            } else {
                let mut inserted = 0u64;
                let mut j = i;
                while j < self.sites.len() && self.sites[j].is_none() {
                    inserted += 1;
                    j += 1;
                }
                out.push(Block::new(PURE_INSERTION, 0, inserted));
                i = j;
            }
        }
        out
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::seq_node::SeqNodeTree;

    fn cross_check(events: &[IndelEvent], parent_length: u64) {
        let mut tree = SeqNodeTree::new(1, parent_length);
        let mut naive = SeqNodeNaive::new(1, parent_length);
        tree.apply_events(events);
        naive.apply_events(events);
        assert_eq!(tree.blocks(), naive.blocks());
        assert_eq!(tree.len(), naive.len());
    }

    #[test]
    fn test_naive_matches_tree_scenario_s3() {
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
    fn test_naive_matches_tree_on_leading_insertion_then_deletion() {
        cross_check(
            &[IndelEvent::new(true, 0, 3), IndelEvent::new(false, 0, 5)],
            10,
        );
    }

    #[test]
    fn test_naive_blocks_collapse_to_single_block_when_untouched() {
        let n = SeqNodeNaive::new(1, 5);
        assert_eq!(n.blocks(), vec![Block::new(0, 5, 0)]);
    }
}
