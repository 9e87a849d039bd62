//! Typed event logging for the coloring engine.
//!
//! A [`Logger`] is a shared handle to an event sink; the master and the
//! driver log through optional handles, and anything from a println to a
//! test-side capture buffer can sit behind one.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::aggregate::Totals;
use crate::graph::VertexId;
use crate::phase::Phase;
use crate::state::Color;

/// A shared handle to an event sink.
pub struct Logger<E> {
    action: Rc<RefCell<dyn FnMut(&E)>>,
}

impl<E> Logger<E> {
    /// Wraps an action in a logger handle.
    pub fn new<F>(action: F) -> Self
    where
        F: FnMut(&E) + 'static,
    {
        Logger { action: Rc::new(RefCell::new(action)) }
    }

    /// Delivers an event to the sink.
    pub fn log(&self, event: E) {
        (self.action.borrow_mut())(&event);
    }
}

impl<E> Clone for Logger<E> {
    fn clone(&self) -> Self {
        Logger { action: Rc::clone(&self.action) }
    }
}

impl<E> fmt::Debug for Logger<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger").finish_non_exhaustive()
    }
}

/// Logger for coloring engine events.
pub type ColoringLogger = Logger<ColoringEvent>;

/// Events emitted by the master and the reference driver.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ColoringEvent {
    /// The master moved the phase register.
    PhaseTransition {
        /// The superstep about to run under the new phase.
        superstep: u64,
        /// The phase whose superstep just finished.
        from: Phase,
        /// The phase written for the next superstep.
        to: Phase,
    },
    /// The master opened a new color cycle.
    CycleStarted {
        /// One-based cycle index.
        cycle: u32,
        /// The color this cycle will assign.
        color: Color,
    },
    /// One superstep finished; the published aggregator totals.
    SuperstepSummary {
        /// The superstep that finished.
        superstep: u64,
        /// The phase it ran under.
        phase: Phase,
        /// The reduced counters it produced.
        totals: Totals,
    },
    /// A color assignment superstep finished; the full color class.
    ColorClass {
        /// The color just assigned.
        color: Color,
        /// Every vertex that took it.
        members: Vec<VertexId>,
    },
    /// The master halted the computation.
    Terminated {
        /// Supersteps executed in total.
        supersteps: u64,
        /// Colors assigned in total.
        colors: u32,
    },
}
