//! The master controller: the global phase state machine.
//!
//! The master runs once between barriers. It reads the counter totals
//! published by the superstep that just finished, writes the broadcast
//! registers for the superstep about to run, and decides when to stop.
//!
//! One color cycle loops the lottery triple until no vertex is undecided:
//!
//! ```text
//! START → LOTTERY → CONFLICT_RESOLUTION → EDGE_CLEANING ─┐
//!            ↑                                           │ unknown > 0
//!            └───────────────────────────────────────────┘
//!                                                        │ unknown == 0
//!                                           COLOR_ASSIGNMENT
//!                                      ┌─────────┴─────────┐
//!                             uncolored remain         all colored
//!                             (next cycle, LOTTERY)    (terminate)
//! ```

use crate::aggregate::Board;
use crate::error::Error;
use crate::logging::{ColoringEvent, ColoringLogger};
use crate::phase::Phase;
use crate::state::Color;

/// What the driver should do after a master step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Run another superstep under the phase now on the board.
    Continue,
    /// Every vertex is colored; stop.
    Halt,
}

/// The global controller, advanced once per superstep.
#[derive(Debug)]
pub struct Master {
    colored_total: u64,
    cycle: u32,
    stalled_rounds: u64,
    last_unknown: Option<u64>,
    divergence_limit: u64,
    logger: Option<ColoringLogger>,
}

impl Master {
    /// A master that aborts after `divergence_limit` consecutive
    /// edge-cleaning rounds without progress.
    pub fn new(divergence_limit: u64, logger: Option<ColoringLogger>) -> Self {
        Master {
            colored_total: 0,
            cycle: 0,
            stalled_rounds: 0,
            last_unknown: None,
            divergence_limit,
            logger,
        }
    }

    /// Vertices colored so far, accumulated across color cycles.
    ///
    /// Per-superstep counters reset at every barrier, so the cumulative view
    /// needed for the termination check lives here.
    pub fn colored_total(&self) -> u64 {
        self.colored_total
    }

    /// Color cycles started so far; after termination, the palette size.
    pub fn cycles(&self) -> u32 {
        self.cycle
    }

    /// Advances the phase machine: reads the totals published by superstep
    /// `superstep - 1` and writes the registers for `superstep`.
    pub fn advance(&mut self, board: &mut Board, superstep: u64) -> Result<Directive, Error> {
        let from = board.phase();
        let next = match from {
            Phase::Start => {
                self.begin_cycle(board);
                Phase::Lottery
            }
            Phase::Lottery => Phase::ConflictResolution,
            Phase::ConflictResolution => Phase::EdgeCleaning,
            Phase::EdgeCleaning => {
                let unknown = board.published().unknown;
                if unknown > 0 {
                    // The set is not yet maximal; run another lottery round.
                    self.check_progress(unknown)?;
                    Phase::Lottery
                } else {
                    Phase::ColorAssignment
                }
            }
            Phase::ColorAssignment => {
                self.colored_total += board.published().colored;
                board.set_first_cycle_complete();
                if self.colored_total < board.num_vertices() {
                    self.begin_cycle(board);
                    Phase::Lottery
                } else {
                    self.log(ColoringEvent::Terminated {
                        supersteps: superstep,
                        colors: self.cycle,
                    });
                    return Ok(Directive::Halt);
                }
            }
        };
        self.log(ColoringEvent::PhaseTransition { superstep, from, to: next });
        board.set_phase(next);
        Ok(Directive::Continue)
    }

    /// Opens a color cycle: allocates the next color label and resets the
    /// progress watchdog.
    fn begin_cycle(&mut self, board: &mut Board) {
        let color = Color(self.cycle);
        self.cycle += 1;
        self.stalled_rounds = 0;
        self.last_unknown = None;
        board.set_color_to_assign(color);
        self.log(ColoringEvent::CycleStarted { cycle: self.cycle, color });
    }

    /// Admission is probabilistic, so an unchanged count is not failure on
    /// its own; only a long run of them is.
    fn check_progress(&mut self, unknown: u64) -> Result<(), Error> {
        match self.last_unknown {
            Some(previous) if unknown >= previous => {
                self.stalled_rounds += 1;
                if self.stalled_rounds >= self.divergence_limit {
                    return Err(Error::Divergence { rounds: self.stalled_rounds, unknown });
                }
            }
            _ => self.stalled_rounds = 0,
        }
        self.last_unknown = Some(unknown);
        Ok(())
    }

    fn log(&self, event: ColoringEvent) {
        if let Some(logger) = &self.logger {
            logger.log(event);
        }
    }
}
