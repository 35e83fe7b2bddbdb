//! [`Simulation`]: the pre-order driver tying C5 (EventGenerator) through
//! C4 (SeqNode) and C7 (SequenceView) for indels, and C8
//! (SubstitutionSampler) for residues, into a finished alignment (spec.md
//! S4.8, C9).
//!
//! Grounded on `original_source/indelsim/classes/simulation.py`
//! (`Simulation.__init__`, `msa_from_blocktree`).

use std::collections::HashMap;
use std::io::Write;

use crate::error::EvoSimError;
use crate::event_generator::{EventGenerator, EventGeneratorConfig};
use crate::msa::{AlignmentRow, MsaBuilder};
use crate::rng::node_rng;
use crate::seq_node::SeqNodeTree;
use crate::sequence_view::SequenceView;
use crate::substitution::{SubstitutionAlgorithm, SubstitutionSampler};
use crate::super_sequence::SuperSequence;
use crate::tree::PhyloTree;

pub struct SubstitutionConfig {
    pub sampler: SubstitutionSampler,
}

impl SubstitutionConfig {
    pub fn new(
        rate_matrix: crate::substitution::RateMatrix,
        substitution_rate: f64,
        algorithm: SubstitutionAlgorithm,
    ) -> Self {
        Self {
            sampler: SubstitutionSampler::new(rate_matrix, substitution_rate, algorithm),
        }
    }
}

pub struct SimulationConfig {
    pub seed: u64,
    pub root_length: u64,
    pub event_config: EventGeneratorConfig,
    pub substitution: Option<SubstitutionConfig>,
    /// spec.md S7 `RunawayLength`: abort if any node's sequence exceeds this.
    pub length_ceiling: u64,
    /// spec.md S5: stream rows out one at a time instead of retaining the
    /// whole alignment.
    pub keep_in_memory: bool,
}

/// The indel-only gap template plus, when substitutions are enabled, the
/// residue string for one saved node.
pub struct SavedSequence {
    pub node_id: u64,
    pub row: AlignmentRow,
    pub residues: Option<Vec<u8>>,
}

pub struct SimulationOutput {
    pub width: u64,
    pub sequences: Vec<SavedSequence>,
}

struct NodeState {
    length: u64,
    view: SequenceView,
    residues: Option<Vec<u8>>,
    remaining_children: usize,
}

/// Run one full simulation over `tree`, returning either the complete
/// in-memory alignment or streaming it to `sink` (spec.md S5
/// `keep_in_memory`).
pub fn run_simulation(
    tree: &impl PhyloTree,
    config: &SimulationConfig,
) -> Result<SimulationOutput, EvoSimError> {
    let mut rows = run_to_rows(tree, config)?;
    rows.super_sequence.assign_absolute_positions();
    let builder = MsaBuilder::new(&rows.super_sequence);
    let width = builder.width();

    let sequences = rows
        .saved
        .into_iter()
        .map(|(node_id, view, residues)| {
            let row = builder.build_row(&view);
            SavedSequence { node_id, row, residues }
        })
        .collect();

    Ok(SimulationOutput { width, sequences })
}

/// Same traversal, but writes each saved row to `sink` as soon as its
/// alignment row is computed instead of returning them all (spec.md S5,
/// `keep_in_memory = false`).
pub fn run_simulation_streaming<W: Write>(
    tree: &impl PhyloTree,
    config: &SimulationConfig,
    sink: &mut W,
) -> Result<u64, EvoSimError> {
    let mut rows = run_to_rows(tree, config)?;
    rows.super_sequence.assign_absolute_positions();
    let builder = MsaBuilder::new(&rows.super_sequence);
    let width = builder.width();

    for (node_id, view, residues) in rows.saved {
        let row = builder.build_row(&view);
        match residues {
            Some(res) => {
                let chars: Vec<char> = res
                    .iter()
                    .map(|&r| crate::substitution::residue_to_char(r as usize))
                    .collect();
                writeln!(sink, ">{node_id}").map_err(EvoSimError::Io)?;
                writeln!(sink, "{}", row.render_with_residues(&chars)).map_err(EvoSimError::Io)?;
            }
            None => {
                writeln!(sink, ">{node_id}").map_err(EvoSimError::Io)?;
                writeln!(sink, "{}", row.render_template()).map_err(EvoSimError::Io)?;
            }
        }
    }
    Ok(width)
}

struct TraversalResult {
    super_sequence: SuperSequence,
    saved: Vec<(u64, SequenceView, Option<Vec<u8>>)>,
}

fn run_to_rows(tree: &impl PhyloTree, config: &SimulationConfig) -> Result<TraversalResult, EvoSimError> {
    let preorder = tree.preorder();
    let root_id = *preorder
        .first()
        .ok_or_else(|| EvoSimError::Tree("empty tree".to_owned()))?;

    let mut super_sequence = SuperSequence::new(config.root_length);
    let mut states: HashMap<u64, NodeState> = HashMap::new();
    let mut saved = Vec::new();

    let root_view = SequenceView::root(&mut super_sequence, root_id, tree.is_leaf(root_id));
    let root_residues = config.substitution.as_ref().map(|s| {
        let mut rng = node_rng(config.seed, root_id);
        s.sampler.sample_root_sequence(&mut rng, config.root_length as usize)
    });
    if tree.is_leaf(root_id) {
        saved.push((root_id, root_view.clone(), root_residues.clone()));
    }
    states.insert(
        root_id,
        NodeState {
            length: config.root_length,
            view: root_view,
            residues: root_residues,
            remaining_children: tree.child_count(root_id),
        },
    );

    for &id in preorder.iter().skip(1) {
        let parent_id = tree
            .parent(id)
            .ok_or_else(|| EvoSimError::Tree(format!("node {id} has no parent")))?;
        let branch_length = tree.branch_length(id);
        let mut rng = node_rng(config.seed, id);

        let (parent_length, parent_residues) = {
            let parent = states
                .get(&parent_id)
                .ok_or_else(|| EvoSimError::Tree(format!("parent {parent_id} not yet simulated")))?;
            (parent.length, parent.residues.clone())
        };

        let generator = EventGenerator::new(&config.event_config);
        let events = generator.sample_branch(&mut rng, branch_length, parent_length);
        let mut seq_node = SeqNodeTree::new(id, parent_length);
        seq_node.apply_events(&events);

        if seq_node.len() > config.length_ceiling {
            return Err(EvoSimError::RunawayLength {
                node_id: id,
                length: seq_node.len(),
                ceiling: config.length_ceiling,
            });
        }

        let view = {
            let parent = states.get(&parent_id).expect("checked above");
            SequenceView::generate(&mut super_sequence, &parent.view, &seq_node.blocks(), id, tree.is_leaf(id))
        };

        let residues = match (&config.substitution, parent_residues) {
            (Some(sub), Some(parent_res)) => {
                Some(sub.sampler.evolve_branch(&mut rng, &parent_res, branch_length)?)
            }
            _ => None,
        };

        if tree.is_leaf(id) {
            saved.push((id, view.clone(), residues.clone()));
        }

        states.insert(
            id,
            NodeState {
                length: seq_node.len(),
                view,
                residues,
                remaining_children: tree.child_count(id),
            },
        );

        // spec.md S5: "when the [child] count reaches zero, the parent's
        // handle list may be dropped" -- once every child of `parent_id`
        // has been simulated, its NodeState (needed only so children could
        // read its view/residues) is no longer referenced by anything.
        if let Some(parent) = states.get_mut(&parent_id) {
            parent.remaining_children -= 1;
            if parent.remaining_children == 0 && parent_id != root_id {
                states.remove(&parent_id);
            }
        }
    }

    Ok(TraversalResult { super_sequence, saved })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::substitution::RateMatrix;
    use crate::tree::InMemoryTree;

    fn small_tree() -> InMemoryTree {
        let mut t = InMemoryTree::new();
        let root = t.add_root("root");
        t.add_child(root, "leaf_a", 1.0);
        t.add_child(root, "leaf_b", 1.0);
        t
    }

    fn config() -> SimulationConfig {
        SimulationConfig {
            seed: 7,
            root_length: 100,
            event_config: EventGeneratorConfig {
                insertion_rate: 0.02,
                deletion_rate: 0.02,
                insertion_length_alpha: 1.7,
                deletion_length_alpha: 1.7,
                max_insertion_length: 20,
                max_deletion_length: 20,
                deletion_extra_edge_length: 20,
            },
            substitution: None,
            length_ceiling: 1_000_000,
            keep_in_memory: true,
        }
    }

    #[test]
    fn test_indel_only_simulation_produces_one_row_per_leaf() {
        let tree = small_tree();
        let out = run_simulation(&tree, &config()).unwrap();
        assert_eq!(out.sequences.len(), 2);
        for seq in &out.sequences {
            assert_eq!(seq.row.width() as u64, out.width);
            assert!(seq.residues.is_none());
        }
    }

    #[test]
    fn test_combined_simulation_fills_residues() {
        let tree = small_tree();
        let mut cfg = config();
        cfg.substitution = Some(SubstitutionConfig::new(
            RateMatrix::uniform(),
            1.0,
            SubstitutionAlgorithm::Gillespie,
        ));
        let out = run_simulation(&tree, &cfg).unwrap();
        for seq in &out.sequences {
            let residues = seq.residues.as_ref().unwrap();
            assert_eq!(residues.len() as i64, seq.row.non_gap_count());
        }
    }

    #[test]
    fn test_runaway_length_aborts() {
        let tree = small_tree();
        let mut cfg = config();
        cfg.length_ceiling = 1;
        let result = run_simulation(&tree, &cfg);
        assert!(matches!(result, Err(EvoSimError::RunawayLength { .. })));
    }

    #[test]
    fn test_streaming_matches_in_memory_width() {
        let tree = small_tree();
        let cfg = config();
        let in_memory = run_simulation(&tree, &cfg).unwrap();
        let mut buf = Vec::new();
        let width = run_simulation_streaming(&tree, &cfg, &mut buf).unwrap();
        assert_eq!(width, in_memory.width);
    }
}
