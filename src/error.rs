//! Error handling.

use thiserror::Error;

/// The error type returned by fallible `evosim` operations.
///
/// Errors at the event-application level (an [`IndelEvent`](crate::block::IndelEvent)
/// landing past the current sequence end, or clipping to an empty span) are
/// never surfaced here -- they are legitimate outcomes of the continuous-time
/// sampling model and are silently dropped where they occur. This type only
/// covers the cases spec'd as fatal: bad configuration, numerical failures in
/// the substitution model, and runaway sequence growth.
#[derive(Error, Debug)]
pub enum EvoSimError {
    /// Bad CLI/config input: negative rates, non-positive lengths, an
    /// unknown algorithm name, or similar. Reported at startup; fatal.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A row of the matrix-exponential transition matrix summed to something
    /// outside tolerance of 1. Indicates a model-building bug, not user error.
    #[error("transition matrix row sum {row_sum} at time {time} deviates from 1")]
    NumericInstability { time: f64, row_sum: f64 },

    /// The simulated sequence length at `node_id` exceeded the configured
    /// ceiling. Protects against parameter choices with exponential growth.
    #[error("sequence length {length} at node {node_id} exceeds ceiling {ceiling}")]
    RunawayLength {
        node_id: u64,
        length: u64,
        ceiling: u64,
    },

    /// A failure reading or interpreting the external tree input.
    #[error("tree error: {0}")]
    Tree(String),

    /// I/O failure writing alignment output.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_invalid_config_message() {
        let e = EvoSimError::InvalidConfig("insertion_rate must be >= 0".to_owned());
        assert_eq!(
            format!("{e}"),
            "invalid configuration: insertion_rate must be >= 0"
        );
    }

    #[test]
    fn test_runaway_length_message() {
        let e = EvoSimError::RunawayLength {
            node_id: 3,
            length: 1_000_000,
            ceiling: 500_000,
        };
        assert_eq!(
            format!("{e}"),
            "sequence length 1000000 at node 3 exceeds ceiling 500000"
        );
    }

    #[test]
    fn test_numeric_instability_message() {
        let e = EvoSimError::NumericInstability {
            time: 1.5,
            row_sum: 1.1,
        };
        assert_eq!(
            format!("{e}"),
            "transition matrix row sum 1.1 at time 1.5 deviates from 1"
        );
    }
}
