//! Starts a coloring run from configuration information.

use std::collections::BTreeMap;

use itertools::Itertools;

use crate::error::Error;
use crate::graph::{Graph, VertexId};
use crate::logging::ColoringLogger;
use crate::lottery::AdmissionSchedule;
use crate::state::Color;
use crate::worker::Worker;

/// Configures the execution of a coloring computation.
#[derive(Debug, Clone)]
pub struct Config {
    /// Seed from which every lottery coin is derived. Two runs with the same
    /// seed and graph produce the same coloring.
    pub seed: u64,
    /// The admission probability schedule for the lottery.
    pub schedule: AdmissionSchedule,
    /// Number of logical partitions messages are routed across. Partition
    /// count never changes the result, only which messages take the
    /// serialized path.
    pub partitions: usize,
    /// Consecutive no-progress lottery rounds tolerated before the run is
    /// aborted as diverged.
    pub divergence_limit: u64,
    /// Optional sink for engine events.
    pub logger: Option<ColoringLogger>,
}

impl Config {
    /// A single-partition configuration with the defaults for all other
    /// parameters.
    pub fn thread() -> Config {
        Config {
            seed: 1,
            schedule: AdmissionSchedule::default(),
            partitions: 1,
            divergence_limit: 10_000,
            logger: None,
        }
    }

    /// A configuration routing messages across `n` partitions, with the
    /// defaults for all other parameters.
    pub fn process(n: usize) -> Config {
        Config { partitions: n.max(1), ..Config::thread() }
    }

    /// Replaces the seed.
    pub fn with_seed(mut self, seed: u64) -> Config {
        self.seed = seed;
        self
    }

    /// Replaces the admission schedule.
    pub fn with_schedule(mut self, schedule: AdmissionSchedule) -> Config {
        self.schedule = schedule;
        self
    }

    /// Attaches an event logger.
    pub fn with_logger(mut self, logger: ColoringLogger) -> Config {
        self.logger = Some(logger);
        self
    }
}

impl Default for Config {
    fn default() -> Config {
        Config::thread()
    }
}

/// Colors `graph` under `config`, driving the reference driver to
/// termination.
pub fn execute(graph: &Graph, config: Config) -> Result<Coloring, Error> {
    let mut worker = Worker::new(graph, config);
    worker.run()?;
    Ok(worker.into_coloring())
}

/// The finished output: one color per vertex, plus run statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coloring {
    colors: BTreeMap<VertexId, Color>,
    supersteps: u64,
    cycles: u32,
}

impl Coloring {
    pub(crate) fn new(colors: BTreeMap<VertexId, Color>, supersteps: u64, cycles: u32) -> Self {
        Coloring { colors, supersteps, cycles }
    }

    /// The color assigned to `vertex`, if it was part of the graph.
    pub fn color(&self, vertex: VertexId) -> Option<Color> {
        self.colors.get(&vertex).copied()
    }

    /// Every vertex with its color, in increasing vertex order.
    pub fn iter(&self) -> impl Iterator<Item = (VertexId, Color)> + '_ {
        self.colors.iter().map(|(&id, &color)| (id, color))
    }

    /// Number of distinct colors used.
    pub fn num_colors(&self) -> usize {
        self.colors.values().copied().unique().count()
    }

    /// Supersteps the run took.
    pub fn supersteps(&self) -> u64 {
        self.supersteps
    }

    /// Color cycles the run took; equals the palette size.
    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    /// True if every vertex of `graph` is colored and no edge joins two
    /// vertices of the same color.
    pub fn is_proper(&self, graph: &Graph) -> bool {
        graph.vertex_ids().all(|u| {
            let own = self.colors.get(&u);
            own.is_some()
                && graph.neighbors(u).iter().all(|v| self.colors.get(v) != own)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_single_partition() {
        let config = Config::default();
        assert_eq!(config.partitions, 1);
        assert_eq!(config.schedule, AdmissionSchedule::HalfDegree);
    }

    #[test]
    fn builders_replace_fields() {
        let config = Config::process(4)
            .with_seed(99)
            .with_schedule(AdmissionSchedule::SwitchAfterFirstCycle { after: 0.7 });
        assert_eq!(config.partitions, 4);
        assert_eq!(config.seed, 99);
        assert_eq!(
            config.schedule,
            AdmissionSchedule::SwitchAfterFirstCycle { after: 0.7 }
        );
    }

    #[test]
    fn improper_colorings_are_detected() {
        let graph = Graph::from_edges([(1, 2)]);
        let same = Coloring::new(
            [(1, Color(0)), (2, Color(0))].into_iter().collect(),
            0,
            0,
        );
        assert!(!same.is_proper(&graph));

        let partial = Coloring::new([(1, Color(0))].into_iter().collect(), 0, 0);
        assert!(!partial.is_proper(&graph));

        let proper = Coloring::new(
            [(1, Color(0)), (2, Color(1))].into_iter().collect(),
            0,
            0,
        );
        assert!(proper.is_proper(&graph));
        assert_eq!(proper.num_colors(), 2);
    }
}
