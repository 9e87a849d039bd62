//! Fatal error conditions.
//!
//! The protocol is pure and deterministic per seed, so there is no
//! per-message recovery: any detected inconsistency indicates a bug in the
//! master, in a neighbor's compute, or in the hosting runtime, and aborts
//! the job.

use crate::graph::VertexId;
use crate::message::MessageKind;
use crate::phase::Phase;

/// Errors that abort a coloring job.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The phase register held a name no phase answers to.
    #[error("unknown phase name: {0:?}")]
    UnknownPhase(String),

    /// A vertex received a message whose kind is incompatible with the
    /// current phase. Messages sent in superstep S are delivered in S+1, so
    /// a phase may only see the kinds its predecessor produces.
    #[error("protocol violation at vertex {vertex}: {kind:?} message delivered during {phase}")]
    ProtocolViolation {
        /// The phase during which the message was delivered.
        phase: Phase,
        /// The receiving vertex.
        vertex: VertexId,
        /// The offending message kind.
        kind: MessageKind,
    },

    /// A vertex was observed in a state the phase machine cannot produce,
    /// e.g. a colored vertex woken by a message.
    #[error("state invariant violated at vertex {vertex}: {detail}")]
    StateInvariant {
        /// The vertex at which the violation was detected.
        vertex: VertexId,
        /// What was observed.
        detail: String,
    },

    /// The independent-set inner loop stopped making progress. Admission is
    /// probabilistic, so an unlucky round is not failure; this fires only
    /// after many consecutive rounds without any reduction in the number of
    /// undecided vertices.
    #[error("no lottery progress for {rounds} rounds ({unknown} vertices still undecided)")]
    Divergence {
        /// Consecutive rounds without progress.
        rounds: u64,
        /// Vertices still undecided when the watchdog fired.
        unknown: u64,
    },

    /// A routed message batch failed to encode or decode.
    #[error("message codec error: {0}")]
    Codec(#[from] bincode::Error),

    /// A routed message batch had a malformed frame header.
    #[error("message framing error: {0}")]
    Frame(#[from] std::io::Error),
}
