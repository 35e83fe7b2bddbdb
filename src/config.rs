//! CLI configuration surface (spec.md S6), via `clap`'s derive API in the
//! same style the teacher workspace's own command-line tools use.
//!
//! Grounded on `original_source/indelsim/indel_simulator.py` (`argparse`
//! setup, `_validate_args`) for flag names, defaults, and validation rules.

use clap::{Parser, ValueEnum};

use crate::error::EvoSimError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SeqNodeVariant {
    Naive,
    List,
    Tree,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputType {
    /// Don't write alignment output at all (benchmarking runs).
    Drop,
    /// One FASTA file per simulation.
    Multi,
    /// A single FASTA file covering all simulations.
    Single,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SubstitutionAlgorithmArg {
    Gillespie,
    Matrix,
}

/// Flags shared by all three binaries.
#[derive(Debug, Clone, Parser)]
pub struct CommonArgs {
    #[arg(long)]
    pub tree_file: String,

    #[arg(long, default_value_t = 1)]
    pub number_of_simulations: u32,

    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    #[arg(long, value_enum, default_value_t = OutputType::Multi)]
    pub output_type: OutputType,

    #[arg(long, default_value_t = String::from("."))]
    pub output_directory: String,

    #[arg(long, default_value_t = false)]
    pub keep_in_memory: bool,

    #[arg(long, short, default_value_t = false)]
    pub verbose: bool,

    #[arg(long, default_value_t = false)]
    pub benchmark: bool,
}

/// `indel-only` CLI surface.
#[derive(Debug, Clone, Parser)]
#[command(name = "indel-only")]
pub struct IndelOnlyArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[arg(long, value_enum, default_value_t = SeqNodeVariant::Tree)]
    pub r#type: SeqNodeVariant,

    #[arg(long, default_value_t = 0.01)]
    pub insertion_rate: f64,
    #[arg(long, default_value_t = 0.01)]
    pub deletion_rate: f64,
    #[arg(long, default_value_t = 1.7)]
    pub insertion_length_alpha: f64,
    #[arg(long, default_value_t = 50)]
    pub insertion_length_truncation: u64,
    #[arg(long, default_value_t = 1.7)]
    pub deletion_length_alpha: f64,
    #[arg(long, default_value_t = 50)]
    pub deletion_length_truncation: u64,
    #[arg(long, default_value_t = 1000)]
    pub original_sequence_length: u64,
    #[arg(long, default_value_t = 50)]
    pub deletion_extra_edge_length: u64,
}

impl IndelOnlyArgs {
    pub fn validate(&self) -> Result<(), EvoSimError> {
        validate_common(&self.common)?;
        validate_seq_node_variant(self.r#type)?;
        if self.insertion_rate < 0.0 || self.deletion_rate < 0.0 {
            return Err(EvoSimError::InvalidConfig(
                "insertion_rate and deletion_rate must be >= 0".to_owned(),
            ));
        }
        if self.original_sequence_length == 0 {
            return Err(EvoSimError::InvalidConfig(
                "original_sequence_length must be positive".to_owned(),
            ));
        }
        Ok(())
    }
}

/// `substitution-only` CLI surface.
#[derive(Debug, Clone, Parser)]
#[command(name = "substitution-only")]
pub struct SubstitutionOnlyArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[arg(long, default_value_t = 1.0)]
    pub substitution_rate: f64,
    #[arg(long, value_enum, default_value_t = SubstitutionAlgorithmArg::Matrix)]
    pub algorithm: SubstitutionAlgorithmArg,
    #[arg(long, default_value_t = 1000)]
    pub original_sequence_length: u64,
}

impl SubstitutionOnlyArgs {
    pub fn validate(&self) -> Result<(), EvoSimError> {
        validate_common(&self.common)?;
        if self.substitution_rate < 0.0 {
            return Err(EvoSimError::InvalidConfig(
                "substitution_rate must be >= 0".to_owned(),
            ));
        }
        if self.original_sequence_length == 0 {
            return Err(EvoSimError::InvalidConfig(
                "original_sequence_length must be positive".to_owned(),
            ));
        }
        Ok(())
    }
}

/// `combined`: the union of `indel-only` and `substitution-only`.
#[derive(Debug, Clone, Parser)]
#[command(name = "combined")]
pub struct CombinedArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[arg(long, value_enum, default_value_t = SeqNodeVariant::Tree)]
    pub r#type: SeqNodeVariant,
    #[arg(long, default_value_t = 0.01)]
    pub insertion_rate: f64,
    #[arg(long, default_value_t = 0.01)]
    pub deletion_rate: f64,
    #[arg(long, default_value_t = 1.7)]
    pub insertion_length_alpha: f64,
    #[arg(long, default_value_t = 50)]
    pub insertion_length_truncation: u64,
    #[arg(long, default_value_t = 1.7)]
    pub deletion_length_alpha: f64,
    #[arg(long, default_value_t = 50)]
    pub deletion_length_truncation: u64,
    #[arg(long, default_value_t = 1000)]
    pub original_sequence_length: u64,
    #[arg(long, default_value_t = 50)]
    pub deletion_extra_edge_length: u64,

    #[arg(long, default_value_t = 1.0)]
    pub substitution_rate: f64,
    #[arg(long, value_enum, default_value_t = SubstitutionAlgorithmArg::Matrix)]
    pub algorithm: SubstitutionAlgorithmArg,
}

impl CombinedArgs {
    pub fn validate(&self) -> Result<(), EvoSimError> {
        validate_common(&self.common)?;
        validate_seq_node_variant(self.r#type)?;
        if self.insertion_rate < 0.0 || self.deletion_rate < 0.0 {
            return Err(EvoSimError::InvalidConfig(
                "insertion_rate and deletion_rate must be >= 0".to_owned(),
            ));
        }
        if self.substitution_rate < 0.0 {
            return Err(EvoSimError::InvalidConfig(
                "substitution_rate must be >= 0".to_owned(),
            ));
        }
        if self.original_sequence_length == 0 {
            return Err(EvoSimError::InvalidConfig(
                "original_sequence_length must be positive".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Per spec.md S9 ("Three variants... A production rewrite should expose
/// the tree variant only and keep the naive/list implementations behind a
/// test-only feature flag"), `SeqNodeList`/`SeqNodeNaive` are compiled only
/// under the `cross-check` test feature and are never wired into
/// [`crate::simulation::run_simulation`]. Accepting `--type list`/`--type
/// naive` here and silently running the tree variant anyway would be a
/// correctness bug (the user asked for one representation, got another), so
/// we reject anything but `tree` at the CLI boundary instead.
fn validate_seq_node_variant(variant: SeqNodeVariant) -> Result<(), EvoSimError> {
    if variant != SeqNodeVariant::Tree {
        return Err(EvoSimError::InvalidConfig(
            "--type list and --type naive are cross-check-only oracles, not available to the simulation driver; use --type tree".to_owned(),
        ));
    }
    Ok(())
}

fn validate_common(common: &CommonArgs) -> Result<(), EvoSimError> {
    if common.tree_file.is_empty() {
        return Err(EvoSimError::InvalidConfig("tree_file is required".to_owned()));
    }
    if common.number_of_simulations == 0 {
        return Err(EvoSimError::InvalidConfig(
            "number_of_simulations must be positive".to_owned(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    fn common() -> CommonArgs {
        CommonArgs {
            tree_file: "tree.nwk".to_owned(),
            number_of_simulations: 1,
            seed: 0,
            output_type: OutputType::Multi,
            output_directory: ".".to_owned(),
            keep_in_memory: true,
            verbose: false,
            benchmark: false,
        }
    }

    #[test]
    fn test_negative_insertion_rate_rejected() {
        let args = IndelOnlyArgs {
            common: common(),
            r#type: SeqNodeVariant::Tree,
            insertion_rate: -0.1,
            deletion_rate: 0.01,
            insertion_length_alpha: 1.7,
            insertion_length_truncation: 50,
            deletion_length_alpha: 1.7,
            deletion_length_truncation: 50,
            original_sequence_length: 100,
            deletion_extra_edge_length: 10,
        };
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_list_variant_rejected_at_cli_boundary() {
        let args = IndelOnlyArgs {
            common: common(),
            r#type: SeqNodeVariant::List,
            insertion_rate: 0.01,
            deletion_rate: 0.01,
            insertion_length_alpha: 1.7,
            insertion_length_truncation: 50,
            deletion_length_alpha: 1.7,
            deletion_length_truncation: 50,
            original_sequence_length: 100,
            deletion_extra_edge_length: 10,
        };
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_empty_tree_file_rejected() {
        let mut c = common();
        c.tree_file.clear();
        let args = SubstitutionOnlyArgs {
            common: c,
            substitution_rate: 1.0,
            algorithm: SubstitutionAlgorithmArg::Matrix,
            original_sequence_length: 100,
        };
        assert!(args.validate().is_err());
    }
}
