//! `indel-only`: simulate insertion/deletion events along a tree and emit
//! the resulting gap-template alignment, without amino-acid substitution
//! (spec.md S6).

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use evosim::config::{IndelOnlyArgs, OutputType};
use evosim::event_generator::EventGeneratorConfig;
use evosim::fasta::write_fasta;
use evosim::newick::parse_newick;
use evosim::simulation::{run_simulation, run_simulation_streaming, SimulationConfig};
use evosim::tree::PhyloTree;

fn main() -> Result<()> {
    let args = IndelOnlyArgs::parse();
    args.validate()?;

    let tree_text = fs::read_to_string(&args.common.tree_file)
        .with_context(|| format!("reading tree file {}", args.common.tree_file))?;
    let tree = parse_newick(&tree_text)?;

    let event_config = EventGeneratorConfig {
        insertion_rate: args.insertion_rate,
        deletion_rate: args.deletion_rate,
        insertion_length_alpha: args.insertion_length_alpha,
        deletion_length_alpha: args.deletion_length_alpha,
        max_insertion_length: args.insertion_length_truncation,
        max_deletion_length: args.deletion_length_truncation,
        deletion_extra_edge_length: args.deletion_extra_edge_length,
    };

    fs::create_dir_all(&args.common.output_directory)
        .with_context(|| format!("creating output directory {}", args.common.output_directory))?;

    let single_path = Path::new(&args.common.output_directory).join("combined.fasta");
    if matches!(args.common.output_type, OutputType::Single) {
        // truncate any previous run's combined file before the first append.
        File::create(&single_path).with_context(|| format!("creating {}", single_path.display()))?;
    }

    for sim_index in 0..args.common.number_of_simulations {
        let config = SimulationConfig {
            seed: args.common.seed.wrapping_add(sim_index as u64),
            root_length: args.original_sequence_length,
            event_config,
            substitution: None,
            length_ceiling: args.original_sequence_length.saturating_mul(1000).max(1_000_000),
            keep_in_memory: args.common.keep_in_memory,
        };

        if args.common.keep_in_memory {
            let out = run_simulation(&tree, &config)?;
            let records: Vec<(String, String)> = out
                .sequences
                .iter()
                .map(|s| (tree.name(s.node_id).to_owned(), s.row.render_template()))
                .collect();
            write_records(&args.common.output_type, sim_index, &args.common.output_directory, &single_path, &records)?;
        } else {
            match args.common.output_type {
                OutputType::Drop => {
                    run_simulation_streaming(&tree, &config, &mut io::sink())?;
                }
                OutputType::Multi => {
                    let path = sim_path(&args.common.output_directory, sim_index);
                    let mut file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
                    run_simulation_streaming(&tree, &config, &mut file)?;
                }
                OutputType::Single => {
                    let mut file = OpenOptions::new()
                        .append(true)
                        .open(&single_path)
                        .with_context(|| format!("opening {}", single_path.display()))?;
                    run_simulation_streaming(&tree, &config, &mut file)?;
                }
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

fn write_records(
    output_type: &OutputType,
    sim_index: u32,
    output_directory: &str,
    single_path: &Path,
    records: &[(String, String)],
) -> Result<()> {
    match output_type {
        OutputType::Drop => {}
        OutputType::Multi => {
            let path = sim_path(output_directory, sim_index);
            let mut file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
            write_fasta(&mut file, records.iter().map(|(n, s)| (n.as_str(), s.as_str())))?;
        }
        OutputType::Single => {
            let mut file = OpenOptions::new()
                .append(true)
                .open(single_path)
                .with_context(|| format!("opening {}", single_path.display()))?;
            write_fasta(&mut file, records.iter().map(|(n, s)| (n.as_str(), s.as_str())))?;
        }
    }
    Ok(())
}

