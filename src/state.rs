//! Per-vertex coloring state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a vertex stands with respect to the current cycle's independent set.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    /// Undecided; will take part in the next lottery.
    Unknown,
    /// Won the lottery this superstep; membership is pending conflict
    /// resolution with concurrently admitted neighbors.
    TentativelyInSet,
    /// A confirmed member of this cycle's independent set, waiting for its
    /// color.
    InSet,
    /// Has a neighbor in this cycle's set and therefore cannot join it;
    /// sits out the rest of the cycle.
    NotInSet,
}

/// A color label, allocated by the master in increasing order, one per cycle.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Color(pub u32);

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "color-{}", self.0)
    }
}

/// The mutable value carried by each vertex.
///
/// A colored vertex is never revisited: it votes to halt and is logically
/// absent from all subsequent color cycles. At the boundary between cycles
/// every uncolored vertex is back in [`State::Unknown`].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexValue {
    /// Independent-set membership state for the current cycle.
    pub state: State,
    /// The assigned color, if any.
    pub color: Option<Color>,
}

impl VertexValue {
    /// A fresh value: undecided and uncolored.
    pub fn new() -> Self {
        VertexValue { state: State::Unknown, color: None }
    }

    /// True once a color has been assigned.
    pub fn is_colored(&self) -> bool {
        self.color.is_some()
    }
}

impl Default for VertexValue {
    fn default() -> Self {
        VertexValue::new()
    }
}
