//! Aggregators: the master↔vertex control channel.
//!
//! Two flavors live on the [`Board`]. Summed counters are additive monoids
//! with identity zero, written by vertices during a superstep and reset at
//! every barrier; the master reads in superstep S+1 the fully-reduced value
//! from S. Broadcast registers are last-writer-wins, written only by the
//! master between barriers and readable by every vertex starting the next
//! superstep.

use serde::{Deserialize, Serialize};

use crate::phase::Phase;
use crate::state::{Color, State};

/// The summed counters a vertex can contribute to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Counter {
    /// Vertices still undecided.
    Unknown,
    /// Vertices with a pending lottery bid.
    TentativelyInSet,
    /// Vertices ruled out of this cycle's set.
    NotInSet,
    /// Confirmed set members awaiting their color.
    InSet,
    /// Vertices colored this superstep.
    Colored,
}

impl From<State> for Counter {
    fn from(state: State) -> Counter {
        match state {
            State::Unknown => Counter::Unknown,
            State::TentativelyInSet => Counter::TentativelyInSet,
            State::InSet => Counter::InSet,
            State::NotInSet => Counter::NotInSet,
        }
    }
}

/// One superstep's worth of reduced counter values.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Totals {
    /// Vertices that ended the superstep undecided.
    pub unknown: u64,
    /// Vertices that ended the superstep with a pending bid.
    pub tentatively_in_set: u64,
    /// Vertices ruled out of this cycle's set.
    pub not_in_set: u64,
    /// Confirmed set members awaiting their color.
    pub in_set: u64,
    /// Vertices colored this superstep.
    pub colored: u64,
}

impl Totals {
    /// Adds one to the named counter.
    pub fn tally(&mut self, counter: Counter) {
        match counter {
            Counter::Unknown => self.unknown += 1,
            Counter::TentativelyInSet => self.tentatively_in_set += 1,
            Counter::NotInSet => self.not_in_set += 1,
            Counter::InSet => self.in_set += 1,
            Counter::Colored => self.colored += 1,
        }
    }

    /// The number of still-active (uncolored) vertices counted this
    /// superstep.
    pub fn active(&self) -> u64 {
        self.unknown + self.tentatively_in_set + self.not_in_set + self.in_set
    }
}

/// The shared aggregator board.
///
/// Vertices tally into the working half during a superstep; the barrier
/// publishes it and resets the working half to the monoid identity. The
/// broadcast registers persist until the master rewrites them.
#[derive(Debug, Clone)]
pub struct Board {
    working: Totals,
    published: Totals,
    phase: Phase,
    color_to_assign: Color,
    first_cycle_complete: bool,
    num_vertices: u64,
    num_edges: u64,
}

impl Board {
    /// A board for a graph of the given size, in the `Start` phase.
    pub fn new(num_vertices: u64, num_edges: u64) -> Self {
        Board {
            working: Totals::default(),
            published: Totals::default(),
            phase: Phase::Start,
            color_to_assign: Color(0),
            first_cycle_complete: false,
            num_vertices,
            num_edges,
        }
    }

    /// Adds one to a counter for the current superstep.
    pub fn tally(&mut self, counter: Counter) {
        self.working.tally(counter);
    }

    /// The barrier: publishes the current superstep's sums and resets the
    /// working half.
    pub fn publish(&mut self) -> &Totals {
        self.published = std::mem::take(&mut self.working);
        &self.published
    }

    /// The fully-reduced totals from the previous superstep.
    pub fn published(&self) -> &Totals {
        &self.published
    }

    /// The current phase register.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Writes the phase register. Master only.
    pub fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    /// The color the current cycle will assign.
    pub fn color_to_assign(&self) -> Color {
        self.color_to_assign
    }

    /// Writes the color register. Master only.
    pub fn set_color_to_assign(&mut self, color: Color) {
        self.color_to_assign = color;
    }

    /// Whether at least one color assignment superstep has completed.
    pub fn first_cycle_complete(&self) -> bool {
        self.first_cycle_complete
    }

    /// Raises the first-cycle flag. Master only.
    pub fn set_first_cycle_complete(&mut self) {
        self.first_cycle_complete = true;
    }

    /// Number of vertices in the graph; set once at initialization.
    pub fn num_vertices(&self) -> u64 {
        self.num_vertices
    }

    /// Number of edges in the graph; set once at initialization.
    pub fn num_edges(&self) -> u64 {
        self.num_edges
    }
}
