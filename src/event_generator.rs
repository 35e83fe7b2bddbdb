//! [`EventGenerator`]: continuous-time sampling of indel events along a
//! single branch (spec.md S4.4).
//!
//! Grounded on `original_source/indelsim/classes/sim_node.py`
//! (`create_events`, `insertion_event`, `deletion_event`) and
//! `original_source/indelsim/utils.py` (`calc_trunc_zipf`).

use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::{Distribution, Exp, Uniform};

use crate::block::IndelEvent;

/// Per-branch indel parameters. One instance is shared across all nodes in a
/// run; only the sequence length `current_length` varies call to call.
///
/// Serializable behind the `serde` feature (teacher pattern: `tskit`'s own
/// metadata types are `derive(Serialize, Deserialize)` behind its `serde`
/// feature), so a run's configuration can be logged alongside its output for
/// downstream tooling.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EventGeneratorConfig {
    pub insertion_rate: f64,
    pub deletion_rate: f64,
    pub insertion_length_alpha: f64,
    pub deletion_length_alpha: f64,
    pub max_insertion_length: u64,
    pub max_deletion_length: u64,
    /// Extra sequence positions to the left of the first site that a
    /// deletion may start from (`deletion_extra_edge_length` in the
    /// reference), allowing deletions to straddle the sequence start.
    pub deletion_extra_edge_length: u64,
}

/// Samples the indel events that occur along one branch, in time order.
pub struct EventGenerator<'a> {
    config: &'a EventGeneratorConfig,
}

impl<'a> EventGenerator<'a> {
    pub fn new(config: &'a EventGeneratorConfig) -> Self {
        Self { config }
    }

    /// Sample every indel event along a branch of length `branch_length`,
    /// given the sequence length `current_length` at the start of the
    /// branch. The running length `L` is updated after every sampled event
    /// (insertions grow it, deletions shrink it by the clipped length) and
    /// the updated value feeds the next iteration's total rate, insertion
    /// probability, and placement bounds, mirroring `create_events` in
    /// `original_source/indelsim/classes/sim_node.py:39-63`.
    pub fn sample_branch(
        &self,
        rng: &mut StdRng,
        branch_length: f64,
        current_length: u64,
    ) -> Vec<IndelEvent> {
        let mut events = Vec::new();
        let mut elapsed = 0.0f64;
        let mut l = current_length;

        loop {
            let lf = l as f64;
            let total_rate = self.config.insertion_rate * (lf + 1.0)
                + self.config.deletion_rate * (lf + self.config.deletion_extra_edge_length as f64);
            if total_rate <= 0.0 {
                break;
            }
            let wait: f64 = Exp::new(total_rate).unwrap().sample(rng);
            elapsed += wait;
            if elapsed > branch_length {
                break;
            }
            let insertion_prob = self.config.insertion_rate * (lf + 1.0) / total_rate;
            let is_insertion: f64 = rng.gen();
            if is_insertion < insertion_prob {
                if let Some(ev) = self.sample_insertion(rng, l) {
                    l += ev.length as u64;
                    events.push(ev);
                }
            } else if let Some(ev) = self.sample_deletion(rng, l) {
                l -= ev.length as u64;
                events.push(ev);
            }
        }
        events
    }

    fn sample_insertion(&self, rng: &mut StdRng, current_length: u64) -> Option<IndelEvent> {
        let place = Uniform::new_inclusive(0, current_length as i64).sample(rng);
        let length = trunc_zipf(rng, self.config.insertion_length_alpha, self.config.max_insertion_length);
        Some(IndelEvent::new(true, place, length as i64))
    }

    fn sample_deletion(&self, rng: &mut StdRng, current_length: u64) -> Option<IndelEvent> {
        let lo = -(self.config.deletion_extra_edge_length as i64);
        let hi = current_length as i64 - 1;
        if lo > hi {
            return None;
        }
        let place = Uniform::new_inclusive(lo, hi).sample(rng);
        let mut length = trunc_zipf(rng, self.config.deletion_length_alpha, self.config.max_deletion_length) as i64;
        if place + length > current_length as i64 {
            length = current_length as i64 - place;
        }
        if place + length <= 0 {
            return None;
        }
        Some(IndelEvent::new(false, place, length))
    }
}

/// Draw from a Zipf distribution truncated to `[1, max_val]` by rejection
/// sampling, matching `calc_trunc_zipf`: repeatedly draw an (untruncated)
/// Zipf variate and discard draws above `max_val`.
fn trunc_zipf(rng: &mut StdRng, alpha: f64, max_val: u64) -> u64 {
    if max_val <= 1 {
        return max_val.max(1);
    }
    let zipf = rand_distr::Zipf::new(u64::MAX, alpha).unwrap();
    loop {
        let z = zipf.sample(rng) as u64;
        if z <= max_val {
            return z;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::rng::node_rng;

    fn config() -> EventGeneratorConfig {
        EventGeneratorConfig {
            insertion_rate: 0.1,
            deletion_rate: 0.1,
            insertion_length_alpha: 1.7,
            deletion_length_alpha: 1.7,
            max_insertion_length: 50,
            max_deletion_length: 50,
            deletion_extra_edge_length: 50,
        }
    }

    #[test]
    fn test_sample_branch_deterministic_given_seed() {
        let cfg = config();
        let gen = EventGenerator::new(&cfg);
        let mut rng_a = node_rng(7, 2);
        let mut rng_b = node_rng(7, 2);
        let a = gen.sample_branch(&mut rng_a, 5.0, 200);
        let b = gen.sample_branch(&mut rng_b, 5.0, 200);
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_branch_length_yields_no_events() {
        let cfg = config();
        let gen = EventGenerator::new(&cfg);
        let mut rng = node_rng(1, 1);
        let events = gen.sample_branch(&mut rng, 0.0, 200);
        assert!(events.is_empty());
    }

    #[test]
    fn test_zero_rates_yield_no_events() {
        let cfg = EventGeneratorConfig {
            insertion_rate: 0.0,
            deletion_rate: 0.0,
            ..config()
        };
        let gen = EventGenerator::new(&cfg);
        let mut rng = node_rng(1, 1);
        let events = gen.sample_branch(&mut rng, 100.0, 200);
        assert!(events.is_empty());
    }

    #[test]
    fn test_events_stay_within_declared_length_bounds() {
        let cfg = config();
        let gen = EventGenerator::new(&cfg);
        let mut rng = node_rng(99, 5);
        let events = gen.sample_branch(&mut rng, 50.0, 300);
        for e in events {
            assert!(e.length as u64 <= cfg.max_insertion_length.max(cfg.max_deletion_length));
        }
    }
}
