//! Names for the master-driven phases.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// One phase of the coloring protocol, broadcast by the master and read by
/// every vertex at the start of a superstep.
///
/// A color cycle loops `Lottery → ConflictResolution → EdgeCleaning` until no
/// vertex is left undecided, then runs one `ColorAssignment` superstep.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    /// Before the first superstep; no vertex ever computes in this phase.
    Start,
    /// Undecided vertices draw a random coin and tentatively bid for
    /// independent-set membership.
    Lottery,
    /// Concurrent bids among neighbors are resolved; the minimum vertex id
    /// wins.
    ConflictResolution,
    /// Edges incident to fresh set members are removed; their neighbors are
    /// ruled out of this cycle's set.
    EdgeCleaning,
    /// The finished independent set takes the cycle's color; everyone else
    /// resets for the next cycle.
    ColorAssignment,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Start => "START",
            Phase::Lottery => "LOTTERY",
            Phase::ConflictResolution => "CONFLICT_RESOLUTION",
            Phase::EdgeCleaning => "EDGE_CLEANING",
            Phase::ColorAssignment => "COLOR_ASSIGNMENT",
        };
        f.write_str(name)
    }
}

impl FromStr for Phase {
    type Err = Error;
    fn from_str(name: &str) -> Result<Self, Error> {
        match name {
            "START" => Ok(Phase::Start),
            "LOTTERY" => Ok(Phase::Lottery),
            "CONFLICT_RESOLUTION" => Ok(Phase::ConflictResolution),
            "EDGE_CLEANING" => Ok(Phase::EdgeCleaning),
            "COLOR_ASSIGNMENT" => Ok(Phase::ColorAssignment),
            other => Err(Error::UnknownPhase(other.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for phase in [
            Phase::Start,
            Phase::Lottery,
            Phase::ConflictResolution,
            Phase::EdgeCleaning,
            Phase::ColorAssignment,
        ] {
            assert_eq!(phase.to_string().parse::<Phase>().unwrap(), phase);
        }
    }

    #[test]
    fn unrecognized_name_is_fatal() {
        let err = "PAINT_IT_BLACK".parse::<Phase>().unwrap_err();
        assert!(matches!(err, Error::UnknownPhase(name) if name == "PAINT_IT_BLACK"));
    }
}
