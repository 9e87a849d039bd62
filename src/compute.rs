//! The per-vertex transition function.
//!
//! [`vertex_compute`] is invoked once per superstep for every awake vertex,
//! dispatched on the master-broadcast phase and the vertex's local state. It
//! is generic over [`Context`], the thin contract a hosting BSP runtime must
//! provide; the reference driver in [`crate::worker`] implements it, and
//! tests substitute their own.

use crate::aggregate::Counter;
use crate::error::Error;
use crate::graph::{Vertex, VertexId};
use crate::message::{Message, MessageKind};
use crate::phase::Phase;
use crate::state::{Color, State};

/// What one vertex's compute call may ask of the BSP runtime.
///
/// Edge access, edge removal, and the halt vote act directly on the
/// `&mut Vertex` argument of [`vertex_compute`]; everything that crosses
/// the vertex boundary goes through this trait.
pub trait Context {
    /// The current superstep index.
    fn superstep(&self) -> u64;
    /// The phase broadcast by the master for this superstep.
    fn phase(&self) -> Phase;
    /// The color the current cycle will assign.
    fn color_to_assign(&self) -> Color;
    /// Whether at least one color cycle has completed.
    fn first_cycle_complete(&self) -> bool;
    /// The admission probability for a vertex of the given degree.
    fn admission_probability(&self, degree: usize) -> f64;
    /// Draws this vertex's lottery coin for the current superstep.
    fn lottery_coin(&mut self, vertex: VertexId) -> f64;
    /// Buffers a message for delivery at the start of the next superstep.
    fn send(&mut self, target: VertexId, message: Message);
    /// Adds one to a summed aggregator.
    fn tally(&mut self, counter: Counter);
}

/// Runs one superstep of the coloring protocol for a single vertex.
///
/// The vertex may update its value, shrink its edge set, vote to halt, send
/// messages to neighbors, and tally aggregators. Any message or state
/// incompatible with the current phase is a fatal error.
pub fn vertex_compute<C: Context>(
    vertex: &mut Vertex,
    messages: &[Message],
    ctx: &mut C,
) -> Result<(), Error> {
    let phase = ctx.phase();

    // A colored vertex is logically absent from the graph. Edge cleaning
    // removed every route to it, so a wake-up can only mean a bug upstream.
    if vertex.value.is_colored() {
        if let Some(message) = messages.first() {
            return Err(Error::StateInvariant {
                vertex: vertex.id,
                detail: format!("colored vertex woken by {:?} from {}", message.kind, message.sender),
            });
        }
        vertex.halted = true;
        return Ok(());
    }

    // Confirmed set members are pinned until their color arrives.
    if vertex.value.state == State::InSet && phase != Phase::ColorAssignment {
        if !messages.is_empty() {
            return Err(Error::StateInvariant {
                vertex: vertex.id,
                detail: "set member received messages while awaiting its color".to_owned(),
            });
        }
        ctx.tally(Counter::InSet);
        return Ok(());
    }

    match phase {
        Phase::Start => {
            return Err(Error::StateInvariant {
                vertex: vertex.id,
                detail: "compute invoked during START".to_owned(),
            })
        }
        Phase::Lottery => lottery(vertex, messages, ctx)?,
        Phase::ConflictResolution => conflict_resolution(vertex, messages, ctx)?,
        Phase::EdgeCleaning => edge_cleaning(vertex, messages, ctx)?,
        Phase::ColorAssignment => color_assignment(vertex, messages, ctx)?,
    }

    // A vertex colored this superstep was tallied as such; everyone else
    // reports their final state so the master can pick the next phase.
    if !vertex.value.is_colored() {
        ctx.tally(Counter::from(vertex.value.state));
    }
    Ok(())
}

/// LOTTERY: undecided vertices bid for set membership.
fn lottery<C: Context>(vertex: &mut Vertex, messages: &[Message], ctx: &mut C) -> Result<(), Error> {
    // Lottery supersteps follow phases that send nothing.
    ensure_no_messages(Phase::Lottery, vertex.id, messages)?;
    match vertex.value.state {
        State::Unknown => {
            if vertex.edges.is_empty() {
                // An isolated vertex joins the set for free.
                vertex.value.state = State::InSet;
            } else {
                let p = ctx.admission_probability(vertex.degree());
                if ctx.lottery_coin(vertex.id) < p {
                    vertex.value.state = State::TentativelyInSet;
                    for &neighbor in &vertex.edges {
                        ctx.send(neighbor, Message::new(vertex.id, MessageKind::WantsToBeInSet));
                    }
                }
            }
            Ok(())
        }
        // Ruled out earlier this cycle; sits the lottery out.
        State::NotInSet => Ok(()),
        State::TentativelyInSet => Err(tentative_outside_resolution(vertex.id, Phase::Lottery)),
        // Pinned by the preamble.
        State::InSet => unreachable!("set members are pinned before phase dispatch"),
    }
}

/// CONFLICT_RESOLUTION: concurrent bids among neighbors are settled in favor
/// of the minimum vertex id.
///
/// The bidder with the smallest id among itself and all competing bidders is
/// promoted to the set and announces itself; every other bidder returns to
/// undecided. A bidder with no competitors is promoted outright.
fn conflict_resolution<C: Context>(
    vertex: &mut Vertex,
    messages: &[Message],
    ctx: &mut C,
) -> Result<(), Error> {
    // Only lottery bids can legally arrive here, at any vertex.
    for message in messages {
        if message.kind != MessageKind::WantsToBeInSet {
            return Err(Error::ProtocolViolation {
                phase: Phase::ConflictResolution,
                vertex: vertex.id,
                kind: message.kind,
            });
        }
    }
    if vertex.value.state != State::TentativelyInSet {
        // Bids from neighbors are of no concern to non-bidders.
        return Ok(());
    }

    let min_contender = messages.iter().map(|message| message.sender).min();
    let wins = min_contender.is_none_or(|min| vertex.id < min);
    if wins {
        vertex.value.state = State::InSet;
        for &neighbor in &vertex.edges {
            ctx.send(neighbor, Message::new(vertex.id, MessageKind::IsInSet));
        }
    } else {
        vertex.value.state = State::Unknown;
    }
    Ok(())
}

/// EDGE_CLEANING: edges toward fresh set members are removed, and their
/// neighbors are ruled out of this cycle's set.
fn edge_cleaning<C: Context>(
    vertex: &mut Vertex,
    messages: &[Message],
    _ctx: &mut C,
) -> Result<(), Error> {
    if vertex.value.state == State::TentativelyInSet {
        return Err(tentative_outside_resolution(vertex.id, Phase::EdgeCleaning));
    }
    let mut neighbors_in_set = 0;
    for message in messages {
        if message.kind != MessageKind::IsInSet {
            return Err(Error::ProtocolViolation {
                phase: Phase::EdgeCleaning,
                vertex: vertex.id,
                kind: message.kind,
            });
        }
        vertex.remove_edge(message.sender);
        neighbors_in_set += 1;
    }
    if neighbors_in_set > 0 {
        vertex.value.state = State::NotInSet;
    }
    Ok(())
}

/// COLOR_ASSIGNMENT: set members take the cycle's color; everyone else
/// resets to undecided for the next cycle.
fn color_assignment<C: Context>(
    vertex: &mut Vertex,
    messages: &[Message],
    ctx: &mut C,
) -> Result<(), Error> {
    ensure_no_messages(Phase::ColorAssignment, vertex.id, messages)?;
    match vertex.value.state {
        State::InSet => {
            vertex.value.color = Some(ctx.color_to_assign());
            ctx.tally(Counter::Colored);
            Ok(())
        }
        State::Unknown | State::NotInSet => {
            vertex.value.state = State::Unknown;
            Ok(())
        }
        State::TentativelyInSet => {
            Err(tentative_outside_resolution(vertex.id, Phase::ColorAssignment))
        }
    }
}

fn ensure_no_messages(phase: Phase, vertex: VertexId, messages: &[Message]) -> Result<(), Error> {
    match messages.first() {
        None => Ok(()),
        Some(message) => Err(Error::ProtocolViolation { phase, vertex, kind: message.kind }),
    }
}

fn tentative_outside_resolution(vertex: VertexId, phase: Phase) -> Error {
    Error::StateInvariant {
        vertex,
        detail: format!("tentative bid still unresolved during {}", phase),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::EdgeList;
    use crate::lottery::AdmissionSchedule;

    /// A scripted runtime: fixed phase and coin, captured sends and tallies.
    struct TestContext {
        phase: Phase,
        color: Color,
        first_cycle_complete: bool,
        coin: f64,
        schedule: AdmissionSchedule,
        sent: Vec<(VertexId, Message)>,
        tallies: Vec<Counter>,
    }

    impl TestContext {
        fn in_phase(phase: Phase) -> Self {
            TestContext {
                phase,
                color: Color(0),
                first_cycle_complete: false,
                coin: 0.0,
                schedule: AdmissionSchedule::HalfDegree,
                sent: Vec::new(),
                tallies: Vec::new(),
            }
        }
    }

    impl Context for TestContext {
        fn superstep(&self) -> u64 {
            0
        }
        fn phase(&self) -> Phase {
            self.phase
        }
        fn color_to_assign(&self) -> Color {
            self.color
        }
        fn first_cycle_complete(&self) -> bool {
            self.first_cycle_complete
        }
        fn admission_probability(&self, degree: usize) -> f64 {
            self.schedule.probability(degree, self.first_cycle_complete)
        }
        fn lottery_coin(&mut self, _vertex: VertexId) -> f64 {
            self.coin
        }
        fn send(&mut self, target: VertexId, message: Message) {
            self.sent.push((target, message));
        }
        fn tally(&mut self, counter: Counter) {
            self.tallies.push(counter);
        }
    }

    fn vertex_with_edges(id: VertexId, edges: &[VertexId]) -> Vertex {
        Vertex::new(id, EdgeList::from_slice(edges))
    }

    #[test]
    fn isolated_vertex_joins_unconditionally() {
        let mut ctx = TestContext::in_phase(Phase::Lottery);
        ctx.coin = 0.999; // would lose any lottery
        let mut vertex = vertex_with_edges(9, &[]);
        vertex_compute(&mut vertex, &[], &mut ctx).unwrap();
        assert_eq!(vertex.value.state, State::InSet);
        assert!(ctx.sent.is_empty());
        assert_eq!(ctx.tallies, vec![Counter::InSet]);
    }

    #[test]
    fn winning_coin_bids_to_every_neighbor() {
        let mut ctx = TestContext::in_phase(Phase::Lottery);
        ctx.coin = 0.1; // under 1/(2*2)
        let mut vertex = vertex_with_edges(1, &[2, 3]);
        vertex_compute(&mut vertex, &[], &mut ctx).unwrap();
        assert_eq!(vertex.value.state, State::TentativelyInSet);
        assert_eq!(
            ctx.sent,
            vec![
                (2, Message::new(1, MessageKind::WantsToBeInSet)),
                (3, Message::new(1, MessageKind::WantsToBeInSet)),
            ]
        );
        assert_eq!(ctx.tallies, vec![Counter::TentativelyInSet]);
    }

    #[test]
    fn losing_coin_stays_undecided() {
        let mut ctx = TestContext::in_phase(Phase::Lottery);
        ctx.coin = 0.9;
        let mut vertex = vertex_with_edges(1, &[2, 3]);
        vertex_compute(&mut vertex, &[], &mut ctx).unwrap();
        assert_eq!(vertex.value.state, State::Unknown);
        assert!(ctx.sent.is_empty());
        assert_eq!(ctx.tallies, vec![Counter::Unknown]);
    }

    // The minimum id wins under concurrent bids.
    #[test]
    fn minimum_id_wins_concurrent_bids() {
        let mut ctx = TestContext::in_phase(Phase::ConflictResolution);
        let mut vertex = vertex_with_edges(2, &[5, 9]);
        vertex.value.state = State::TentativelyInSet;
        let bids = [
            Message::new(5, MessageKind::WantsToBeInSet),
            Message::new(9, MessageKind::WantsToBeInSet),
        ];
        vertex_compute(&mut vertex, &bids, &mut ctx).unwrap();
        assert_eq!(vertex.value.state, State::InSet);
        assert_eq!(
            ctx.sent,
            vec![
                (5, Message::new(2, MessageKind::IsInSet)),
                (9, Message::new(2, MessageKind::IsInSet)),
            ]
        );
        assert_eq!(ctx.tallies, vec![Counter::InSet]);
    }

    #[test]
    fn larger_id_withdraws_its_bid() {
        let mut ctx = TestContext::in_phase(Phase::ConflictResolution);
        let mut vertex = vertex_with_edges(7, &[2]);
        vertex.value.state = State::TentativelyInSet;
        let bids = [Message::new(2, MessageKind::WantsToBeInSet)];
        vertex_compute(&mut vertex, &bids, &mut ctx).unwrap();
        assert_eq!(vertex.value.state, State::Unknown);
        assert!(ctx.sent.is_empty());
        assert_eq!(ctx.tallies, vec![Counter::Unknown]);
    }

    #[test]
    fn uncontested_bid_is_promoted() {
        let mut ctx = TestContext::in_phase(Phase::ConflictResolution);
        let mut vertex = vertex_with_edges(7, &[2]);
        vertex.value.state = State::TentativelyInSet;
        vertex_compute(&mut vertex, &[], &mut ctx).unwrap();
        assert_eq!(vertex.value.state, State::InSet);
        assert_eq!(ctx.sent, vec![(2, Message::new(7, MessageKind::IsInSet))]);
    }

    #[test]
    fn non_bidders_ignore_bids() {
        let mut ctx = TestContext::in_phase(Phase::ConflictResolution);
        let mut vertex = vertex_with_edges(4, &[2]);
        let bids = [Message::new(2, MessageKind::WantsToBeInSet)];
        vertex_compute(&mut vertex, &bids, &mut ctx).unwrap();
        assert_eq!(vertex.value.state, State::Unknown);
        assert!(ctx.sent.is_empty());
    }

    #[test]
    fn cleaning_removes_edges_and_rules_out() {
        let mut ctx = TestContext::in_phase(Phase::EdgeCleaning);
        let mut vertex = vertex_with_edges(4, &[1, 2, 3]);
        let notices = [
            Message::new(1, MessageKind::IsInSet),
            Message::new(3, MessageKind::IsInSet),
        ];
        vertex_compute(&mut vertex, &notices, &mut ctx).unwrap();
        assert_eq!(vertex.edges.as_slice(), &[2]);
        assert_eq!(vertex.value.state, State::NotInSet);
        assert_eq!(ctx.tallies, vec![Counter::NotInSet]);
    }

    #[test]
    fn cleaning_without_notices_changes_nothing() {
        let mut ctx = TestContext::in_phase(Phase::EdgeCleaning);
        let mut vertex = vertex_with_edges(4, &[1, 2]);
        vertex_compute(&mut vertex, &[], &mut ctx).unwrap();
        assert_eq!(vertex.edges.as_slice(), &[1, 2]);
        assert_eq!(vertex.value.state, State::Unknown);
    }

    #[test]
    fn set_members_take_the_cycle_color() {
        let mut ctx = TestContext::in_phase(Phase::ColorAssignment);
        ctx.color = Color(3);
        let mut vertex = vertex_with_edges(4, &[]);
        vertex.value.state = State::InSet;
        vertex_compute(&mut vertex, &[], &mut ctx).unwrap();
        assert_eq!(vertex.value.color, Some(Color(3)));
        assert_eq!(ctx.tallies, vec![Counter::Colored]);
    }

    #[test]
    fn everyone_else_resets_for_the_next_cycle() {
        let mut ctx = TestContext::in_phase(Phase::ColorAssignment);
        let mut vertex = vertex_with_edges(4, &[1]);
        vertex.value.state = State::NotInSet;
        vertex_compute(&mut vertex, &[], &mut ctx).unwrap();
        assert_eq!(vertex.value.state, State::Unknown);
        assert_eq!(vertex.value.color, None);
        assert_eq!(ctx.tallies, vec![Counter::Unknown]);
    }

    #[test]
    fn colored_vertices_halt() {
        let mut ctx = TestContext::in_phase(Phase::Lottery);
        let mut vertex = vertex_with_edges(4, &[]);
        vertex.value.color = Some(Color(0));
        vertex_compute(&mut vertex, &[], &mut ctx).unwrap();
        assert!(vertex.halted);
        assert!(ctx.tallies.is_empty());
    }

    #[test]
    fn waking_a_colored_vertex_is_fatal() {
        let mut ctx = TestContext::in_phase(Phase::EdgeCleaning);
        let mut vertex = vertex_with_edges(4, &[]);
        vertex.value.color = Some(Color(0));
        let stray = [Message::new(9, MessageKind::IsInSet)];
        let err = vertex_compute(&mut vertex, &stray, &mut ctx).unwrap_err();
        assert!(matches!(err, Error::StateInvariant { vertex: 4, .. }));
    }

    #[test]
    fn set_notice_during_resolution_is_fatal() {
        let mut ctx = TestContext::in_phase(Phase::ConflictResolution);
        let mut vertex = vertex_with_edges(4, &[2]);
        vertex.value.state = State::TentativelyInSet;
        let stray = [Message::new(2, MessageKind::IsInSet)];
        let err = vertex_compute(&mut vertex, &stray, &mut ctx).unwrap_err();
        assert!(matches!(
            err,
            Error::ProtocolViolation { kind: MessageKind::IsInSet, vertex: 4, .. }
        ));
    }

    #[test]
    fn bid_during_cleaning_is_fatal() {
        let mut ctx = TestContext::in_phase(Phase::EdgeCleaning);
        let mut vertex = vertex_with_edges(4, &[2]);
        let stray = [Message::new(2, MessageKind::WantsToBeInSet)];
        let err = vertex_compute(&mut vertex, &stray, &mut ctx).unwrap_err();
        assert!(matches!(
            err,
            Error::ProtocolViolation { kind: MessageKind::WantsToBeInSet, vertex: 4, .. }
        ));
    }

    #[test]
    fn pinned_member_only_reports_itself() {
        let mut ctx = TestContext::in_phase(Phase::Lottery);
        let mut vertex = vertex_with_edges(4, &[2]);
        vertex.value.state = State::InSet;
        vertex_compute(&mut vertex, &[], &mut ctx).unwrap();
        assert_eq!(vertex.value.state, State::InSet);
        assert!(ctx.sent.is_empty());
        assert_eq!(ctx.tallies, vec![Counter::InSet]);
    }
}
