//! `substitution-only`: simulate amino-acid substitution along a tree with
//! no indels, emitting one residue sequence per saved node (spec.md S6).
//!
//! The empirical JTT rate matrix is explicitly out of scope (spec.md S1:
//! "we specify only the interface to the substitution sampler, not the
//! numerical constants"); this binary drives [`RateMatrix::uniform`] in its
//! place. A deployment with real rate-matrix data would substitute its own
//! `RateMatrix::new` call here without touching the simulation core.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use evosim::config::{OutputType, SubstitutionAlgorithmArg, SubstitutionOnlyArgs};
use evosim::event_generator::EventGeneratorConfig;
use evosim::fasta::write_fasta;
use evosim::newick::parse_newick;
use evosim::simulation::{run_simulation, SimulationConfig, SubstitutionConfig};
use evosim::substitution::{residue_to_char, RateMatrix, SubstitutionAlgorithm};
use evosim::tree::PhyloTree;

fn main() -> Result<()> {
    let args = SubstitutionOnlyArgs::parse();
    args.validate()?;

    let tree_text = fs::read_to_string(&args.common.tree_file)
        .with_context(|| format!("reading tree file {}", args.common.tree_file))?;
    let tree = parse_newick(&tree_text)?;

    // No indels: zero rates make `EventGenerator::sample_branch` return no
    // events (evosim::event_generator test_zero_rates_yield_no_events), so
    // every node keeps the root's length exactly.
    let event_config = EventGeneratorConfig {
        insertion_rate: 0.0,
        deletion_rate: 0.0,
        insertion_length_alpha: 1.0,
        deletion_length_alpha: 1.0,
        max_insertion_length: 1,
        max_deletion_length: 1,
        deletion_extra_edge_length: 0,
    };

    let algorithm = match args.algorithm {
        SubstitutionAlgorithmArg::Gillespie => SubstitutionAlgorithm::Gillespie,
        SubstitutionAlgorithmArg::Matrix => SubstitutionAlgorithm::Matrix,
    };

    fs::create_dir_all(&args.common.output_directory)
        .with_context(|| format!("creating output directory {}", args.common.output_directory))?;

    let single_path = Path::new(&args.common.output_directory).join("combined.fasta");
    if matches!(args.common.output_type, OutputType::Single) {
        File::create(&single_path).with_context(|| format!("creating {}", single_path.display()))?;
    }

    for sim_index in 0..args.common.number_of_simulations {
        let substitution = SubstitutionConfig::new(RateMatrix::uniform(), args.substitution_rate, algorithm);
        let config = SimulationConfig {
            seed: args.common.seed.wrapping_add(sim_index as u64),
            root_length: args.original_sequence_length,
            event_config,
            substitution: Some(substitution),
            length_ceiling: args.original_sequence_length.saturating_mul(2).max(1_000_000),
            keep_in_memory: true,
        };

        let out = run_simulation(&tree, &config)?;
        let rows: Vec<(String, String)> = out
            .sequences
            .iter()
            .map(|s| {
                let residues = s.residues.as_ref().expect("substitution enabled above");
                let chars: Vec<char> = residues.iter().map(|&r| residue_to_char(r as usize)).collect();
                (tree.name(s.node_id).to_owned(), s.row.render_with_residues(&chars))
            })
            .collect();

        match args.common.output_type {
            OutputType::Drop => {}
            OutputType::Multi => {
                let path = sim_path(&args.common.output_directory, sim_index);
                let mut file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
                write_fasta(&mut file, rows.iter().map(|(n, s)| (n.as_str(), s.as_str())))?;
            }
            OutputType::Single => {
                let mut file = OpenOptions::new()
                    .append(true)
                    .open(&single_path)
                    .with_context(|| format!("opening {}", single_path.display()))?;
                write_fasta(&mut file, rows.iter().map(|(n, s)| (n.as_str(), s.as_str())))?;
            }
        }

        if args.common.verbose {
            eprintln!("simulation {sim_index} complete");
        }
    }

    Ok(())
}

fn sim_path(output_directory: &str, sim_index: u32) -> PathBuf {
    Path::new(output_directory).join(format!("sim_{sim_index}.fasta"))
}
