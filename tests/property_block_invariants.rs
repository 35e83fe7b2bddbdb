//! Property checks for spec.md S8 invariants 1, 2, and 7: across many
//! randomly generated event sequences, block lengths stay consistent and
//! the AVL balance property never breaks. Plain `#[test]` functions seeding
//! `rand::rngs::StdRng`, not a `proptest` harness -- none of the retrieved
//! example repos with a real `Cargo.toml` carry `proptest`, so per the
//! "never fabricate dependencies" rule this stays with the crate's existing
//! `rand` dependency, the same way the teacher's own `tests/` directory
//! hand-rolls randomized validation loops.

use evosim::block::IndelEvent;
use evosim::seq_node::SeqNodeTree;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Draw a small, frequently-overlapping indel event against a sequence of
/// the given length, biased towards the current bounds so that splits,
/// straddling deletions, and sentinel-block cases all get exercised.
fn random_event(rng: &mut StdRng, current_length: u64) -> IndelEvent {
    let is_insertion = rng.gen_bool(0.5);
    let length = rng.gen_range(1..=8) as i64;
    if current_length == 0 {
        return IndelEvent::new(true, 0, length);
    }
    let bound = current_length as i64;
    let place = rng.gen_range(0..=bound);
    IndelEvent::new(is_insertion, place, length)
}

#[test]
fn invariant_1_block_lengths_sum_to_running_total_after_every_event() {
    for seed in 0..40u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut node = SeqNodeTree::new(1, 50);
        for _ in 0..60 {
            let event = random_event(&mut rng, node.len());
            node.apply_event(event);
            let summed: u64 = node.blocks().iter().map(|b| b.len()).sum();
            assert_eq!(
                summed,
                node.len(),
                "seed {seed}: block lengths ({summed}) diverged from running total ({})",
                node.len()
            );
        }
    }
}

#[test]
fn invariant_2_and_7_tree_subtree_length_and_avl_balance_hold_after_every_event() {
    for seed in 0..40u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut node = SeqNodeTree::new(1, 50);
        for step in 0..60 {
            let event = random_event(&mut rng, node.len());
            node.apply_event(event);
            assert!(
                node.debug_check_invariants(),
                "seed {seed} step {step}: BlockTree invariant (subtree_length / AVL balance) broken"
            );
        }
    }
}
