//! Admission probabilities and deterministic lottery coins.
//!
//! Every undecided vertex flips a coin each lottery superstep. The coin is a
//! pure function of `(seed, vertex id, superstep)`: a splitmix-style mix of
//! the three words seeds a small PRNG whose first draw is the coin. No
//! generator state is shared across vertices, so any parallel schedule
//! observes the same coins and a run is reproducible from its seed alone.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// The probability schedule used to admit lottery bids.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub enum AdmissionSchedule {
    /// `min(1, 1/(2·deg))`: the classic Luby probability, giving expected
    /// constant-factor progress per round. The default.
    HalfDegree,
    /// `HalfDegree` until the first color cycle completes, then the fixed
    /// probability `after`. Aggressive once the graph has thinned out, but
    /// without a progress guarantee; offered as a policy knob, never
    /// selected by default.
    SwitchAfterFirstCycle {
        /// The fixed admission probability used after the first cycle.
        after: f64,
    },
    /// A fixed admission probability, degree be damned.
    Fixed(f64),
}

impl AdmissionSchedule {
    /// The admission probability for a vertex of the given surviving degree.
    ///
    /// `first_cycle_complete` is the master-broadcast flag raised after the
    /// first color assignment.
    pub fn probability(&self, degree: usize, first_cycle_complete: bool) -> f64 {
        match *self {
            AdmissionSchedule::HalfDegree => half_degree(degree),
            AdmissionSchedule::SwitchAfterFirstCycle { after } => {
                if first_cycle_complete {
                    after
                } else {
                    half_degree(degree)
                }
            }
            AdmissionSchedule::Fixed(p) => p,
        }
    }
}

impl Default for AdmissionSchedule {
    fn default() -> Self {
        AdmissionSchedule::HalfDegree
    }
}

fn half_degree(degree: usize) -> f64 {
    if degree == 0 {
        1.0
    } else {
        (1.0 / (2.0 * degree as f64)).min(1.0)
    }
}

/// Draws the lottery coin for `vertex` at `superstep`, uniform in `[0, 1)`.
pub fn coin(seed: u64, vertex: u64, superstep: u64) -> f64 {
    SmallRng::seed_from_u64(mix(seed, vertex, superstep)).gen::<f64>()
}

/// Mixes the three words into one seed; splitmix64 finalizer.
fn mix(seed: u64, vertex: u64, superstep: u64) -> u64 {
    let mut x = seed
        .wrapping_add(vertex.wrapping_mul(0x9e37_79b9_7f4a_7c15))
        .wrapping_add(superstep.wrapping_mul(0xd1b5_4a32_d192_ed03));
    x ^= x >> 30;
    x = x.wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^= x >> 31;
    x
}
