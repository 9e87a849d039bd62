//! Chromatic is a bulk-synchronous vertex-centric graph coloring engine.
//!
//! Given an undirected graph, the engine repeatedly extracts a maximal
//! independent set with a randomized Luby-style lottery and assigns each
//! extracted set one fresh color, until every vertex is colored. No two
//! adjacent vertices ever share a color; the number of colors is approximate,
//! not optimal.
//!
//! The code is organized so the coordination protocol is independent of any
//! particular runtime:
//!
//! **Vertex compute**: the [`compute`] module holds the per-vertex transition
//! function, dispatched by the current phase and the vertex's local state. It
//! is generic over a thin [`compute::Context`] contract (send to neighbors,
//! tally aggregators, read broadcasts, draw a lottery coin), so any BSP
//! runtime that honors superstep barriers can host it.
//!
//! **Master controller**: the [`master`] module advances the global phase
//! state machine once per superstep, reading the aggregated counts written in
//! the previous superstep and writing the broadcast registers read in the
//! next. It allocates color labels and decides termination.
//!
//! **Reference driver**: the [`worker`] module runs the whole protocol in a
//! single process: double-buffered message delivery, aggregator barriers,
//! vote-to-halt semantics, and partition-aware routing through a serialized
//! wire path.
//!
//! # Examples
//!
//! The following colors a triangle, which needs exactly three colors.
//!
//! ```
//! use chromatic::{Config, Graph};
//!
//! let graph = Graph::from_edges([(1, 2), (2, 3), (1, 3)]);
//! let coloring = chromatic::execute(&graph, Config::thread()).unwrap();
//!
//! assert_eq!(coloring.num_colors(), 3);
//! assert!(coloring.is_proper(&graph));
//! ```
//!
//! Runs are deterministic per seed: the lottery coin of a vertex is a pure
//! function of `(seed, vertex id, superstep)`, so the same configuration
//! produces the same coloring regardless of scheduling or partitioning.

#![forbid(missing_docs)]

pub mod aggregate;
pub mod compute;
pub mod error;
pub mod execute;
pub mod graph;
pub mod logging;
pub mod lottery;
pub mod master;
pub mod message;
pub mod phase;
pub mod state;
pub mod worker;

pub use error::Error;
pub use execute::{execute, Coloring, Config};
pub use graph::{Graph, VertexId};
pub use logging::{ColoringEvent, ColoringLogger};
pub use lottery::AdmissionSchedule;
pub use phase::Phase;
pub use state::{Color, State};
