//! End-to-end checks against the concrete block scenarios spec.md S8 spells
//! out (S1, S2, S3, S4): apply a fixed sequence of indel events to a fresh
//! [`SeqNodeTree`] and check the resulting block list and length exactly.

use evosim::block::{Block, IndelEvent, PURE_INSERTION};
use evosim::seq_node::SeqNodeTree;

#[test]
fn s1_single_insertion() {
    let mut n = SeqNodeTree::new(1, 100);
    n.apply_event(IndelEvent::new(true, 30, 5));
    assert_eq!(n.len(), 105);
    assert_eq!(n.blocks(), vec![Block::new(0, 30, 5), Block::new(30, 70, 0)]);
}

#[test]
fn s2_insertion_then_deletion_then_insertion() {
    let mut n = SeqNodeTree::new(1, 100);
    n.apply_event(IndelEvent::new(true, 30, 5));
    n.apply_event(IndelEvent::new(false, 40, 12));
    n.apply_event(IndelEvent::new(true, 12, 2));
    assert_eq!(n.len(), 95);
    assert_eq!(
        n.blocks(),
        vec![
            Block::new(0, 12, 2),
            Block::new(12, 18, 5),
            Block::new(30, 5, 0),
            Block::new(47, 53, 0),
        ]
    );
}

#[test]
fn s3_deletion_consumes_entire_copied_block_with_insertion_tail() {
    let mut n = SeqNodeTree::new(1, 100);
    n.apply_event(IndelEvent::new(true, 30, 5));
    n.apply_event(IndelEvent::new(true, 40, 12));
    n.apply_event(IndelEvent::new(false, 35, 5));
    assert_eq!(n.len(), 112);
    assert_eq!(n.blocks(), vec![Block::new(0, 30, 17), Block::new(35, 65, 0)]);
}

#[test]
fn s5_deletion_all_copied_uncontained_merges_tail_onto_preceding_block() {
    // Not at the start of the sequence: a deletion that consumes an entire
    // copied run plus part of the following inserted run must merge the
    // surviving inserted tail onto whatever block now precedes the deletion
    // point, never spawn a new sentinel block mid-sequence.
    let mut n = SeqNodeTree::new(1, 30);
    n.apply_event(IndelEvent::new(true, 10, 1));
    n.apply_event(IndelEvent::new(true, 25, 2));
    assert_eq!(
        n.blocks(),
        vec![Block::new(0, 10, 1), Block::new(10, 14, 2), Block::new(24, 6, 0)]
    );
    n.apply_event(IndelEvent::new(false, 11, 15));
    assert_eq!(n.len(), 18);
    assert_eq!(n.blocks(), vec![Block::new(0, 10, 2), Block::new(24, 6, 0)]);
}

#[test]
fn s4_insertion_at_position_zero_creates_sentinel_block() {
    let mut n = SeqNodeTree::new(1, 100);
    n.apply_event(IndelEvent::new(true, 30, 5));
    n.apply_event(IndelEvent::new(true, 0, 12));
    n.apply_event(IndelEvent::new(true, 42, 3));
    assert_eq!(n.len(), 120);
    assert_eq!(
        n.blocks(),
        vec![
            Block::new(PURE_INSERTION, 0, 12),
            Block::new(0, 30, 8),
            Block::new(30, 70, 0),
        ]
    );
}
