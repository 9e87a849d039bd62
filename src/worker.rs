//! A single-process reference driver for the coloring protocol.
//!
//! The driver owns the vertex records, the aggregator board, and the master,
//! and runs the BSP contract faithfully: compute once per superstep for
//! every awake vertex, messages buffered during superstep S and delivered at
//! the start of S+1, counter sums published at the barrier, halted vertices
//! woken only by delivery.
//!
//! Messages are routed by vertex partition (`id % partitions`). A message
//! whose endpoints share a partition moves directly; one that crosses a
//! partition boundary round-trips through the framed wire codec, the same
//! split a distributed deployment would have between intra-worker handoff
//! and serialized exchange.

use std::collections::BTreeMap;

use crate::aggregate::Board;
use crate::compute::{vertex_compute, Context};
use crate::error::Error;
use crate::execute::{Coloring, Config};
use crate::graph::{EdgeList, Graph, Vertex, VertexId};
use crate::logging::{ColoringEvent, ColoringLogger};
use crate::lottery::{self, AdmissionSchedule};
use crate::master::{Directive, Master};
use crate::message::{self, Message};
use crate::phase::Phase;

/// The reference driver. See the module docs.
#[derive(Debug)]
pub struct Worker {
    vertices: BTreeMap<VertexId, Vertex>,
    inboxes: BTreeMap<VertexId, Vec<Message>>,
    outgoing: Vec<(VertexId, Message)>,
    board: Board,
    master: Master,
    schedule: AdmissionSchedule,
    seed: u64,
    partitions: usize,
    superstep: u64,
    logger: Option<ColoringLogger>,
}

impl Worker {
    /// Builds a driver over a snapshot of `graph`.
    pub fn new(graph: &Graph, config: Config) -> Self {
        let vertices = graph
            .vertex_ids()
            .map(|id| (id, Vertex::new(id, EdgeList::from_slice(graph.neighbors(id)))))
            .collect();
        let board = Board::new(graph.num_vertices(), graph.num_edges());
        let master = Master::new(config.divergence_limit, config.logger.clone());
        Worker {
            vertices,
            inboxes: BTreeMap::new(),
            outgoing: Vec::new(),
            board,
            master,
            schedule: config.schedule,
            seed: config.seed,
            partitions: config.partitions.max(1),
            superstep: 0,
            logger: config.logger,
        }
    }

    /// The index of the next superstep to run.
    pub fn superstep(&self) -> u64 {
        self.superstep
    }

    /// Runs one superstep: master hook, vertex compute, barrier, routing.
    ///
    /// Returns `Ok(false)` once the master halts the computation.
    pub fn step(&mut self) -> Result<bool, Error> {
        if self.master.advance(&mut self.board, self.superstep)? == Directive::Halt {
            return Ok(false);
        }
        let phase = self.board.phase();

        // Deliver the messages buffered by the previous superstep.
        let mut inboxes = std::mem::take(&mut self.inboxes);

        let mut ctx = StepContext {
            superstep: self.superstep,
            seed: self.seed,
            schedule: &self.schedule,
            board: &mut self.board,
            outgoing: &mut self.outgoing,
        };
        for (id, vertex) in self.vertices.iter_mut() {
            let messages = inboxes.remove(id).unwrap_or_default();
            if vertex.halted {
                if messages.is_empty() {
                    continue;
                }
                // Delivery wakes a halted vertex.
                vertex.halted = false;
            }
            vertex_compute(vertex, &messages, &mut ctx)?;
        }

        if phase == Phase::ColorAssignment {
            self.log_color_class();
        }

        // Barrier: publish this superstep's sums and check that the counts
        // partition the vertex set.
        let totals = self.board.publish().clone();
        debug_assert_eq!(
            totals.active() + totals.colored + self.master.colored_total(),
            self.board.num_vertices(),
            "aggregated counts must partition the vertex set",
        );
        if let Some(logger) = &self.logger {
            logger.log(ColoringEvent::SuperstepSummary {
                superstep: self.superstep,
                phase,
                totals,
            });
        }

        self.route()?;
        self.superstep += 1;
        Ok(true)
    }

    /// Runs supersteps until the master halts.
    pub fn run(&mut self) -> Result<(), Error> {
        while self.step()? {}
        Ok(())
    }

    /// Extracts the finished coloring.
    pub fn into_coloring(self) -> Coloring {
        let colors = self
            .vertices
            .into_values()
            .filter_map(|vertex| vertex.value.color.map(|color| (vertex.id, color)))
            .collect();
        Coloring::new(colors, self.superstep, self.master.cycles())
    }

    /// Moves buffered messages into next superstep's inboxes, serializing
    /// any batch that crosses a partition boundary.
    fn route(&mut self) -> Result<(), Error> {
        let outgoing = std::mem::take(&mut self.outgoing);
        if outgoing.is_empty() {
            return Ok(());
        }
        if self.partitions == 1 {
            for (target, message) in outgoing {
                self.deliver(target, message)?;
            }
            return Ok(());
        }

        let mut batches: Vec<Vec<(VertexId, Message)>> = vec![Vec::new(); self.partitions];
        for (target, message) in outgoing {
            if self.partition_of(message.sender) == self.partition_of(target) {
                self.deliver(target, message)?;
            } else {
                batches[self.partition_of(target)].push((target, message));
            }
        }
        for batch in &batches {
            if batch.is_empty() {
                continue;
            }
            let frame = message::encode_batch(batch)?;
            for (target, message) in message::decode_batch(&frame)? {
                self.deliver(target, message)?;
            }
        }
        Ok(())
    }

    fn deliver(&mut self, target: VertexId, message: Message) -> Result<(), Error> {
        if !self.vertices.contains_key(&target) {
            return Err(Error::StateInvariant {
                vertex: target,
                detail: format!("message from {} addressed to an absent vertex", message.sender),
            });
        }
        self.inboxes.entry(target).or_default().push(message);
        Ok(())
    }

    fn partition_of(&self, id: VertexId) -> usize {
        (id % self.partitions as u64) as usize
    }

    fn log_color_class(&self) {
        if let Some(logger) = &self.logger {
            let color = self.board.color_to_assign();
            let members: Vec<VertexId> = self
                .vertices
                .values()
                .filter(|vertex| vertex.value.color == Some(color))
                .map(|vertex| vertex.id)
                .collect();
            logger.log(ColoringEvent::ColorClass { color, members });
        }
    }
}

/// The [`Context`] the driver hands to each compute call.
struct StepContext<'a> {
    superstep: u64,
    seed: u64,
    schedule: &'a AdmissionSchedule,
    board: &'a mut Board,
    outgoing: &'a mut Vec<(VertexId, Message)>,
}

impl Context for StepContext<'_> {
    fn superstep(&self) -> u64 {
        self.superstep
    }
    fn phase(&self) -> Phase {
        self.board.phase()
    }
    fn color_to_assign(&self) -> crate::state::Color {
        self.board.color_to_assign()
    }
    fn first_cycle_complete(&self) -> bool {
        self.board.first_cycle_complete()
    }
    fn admission_probability(&self, degree: usize) -> f64 {
        self.schedule.probability(degree, self.board.first_cycle_complete())
    }
    fn lottery_coin(&mut self, vertex: VertexId) -> f64 {
        lottery::coin(self.seed, vertex, self.superstep)
    }
    fn send(&mut self, target: VertexId, message: Message) {
        self.outgoing.push((target, message));
    }
    fn tally(&mut self, counter: crate::aggregate::Counter) {
        self.board.tally(counter);
    }
}
