//! Undirected graphs and the per-vertex records owned by the driver.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::state::VertexValue;

/// Globally unique vertex identifier.
pub type VertexId = u64;

/// Adjacency list storage; most vertices in sparse graphs stay inline.
pub type EdgeList = SmallVec<[VertexId; 4]>;

/// An undirected simple graph.
///
/// Adjacency is kept sorted by vertex id so that iteration, and therefore
/// any run at a fixed seed, is reproducible.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Graph {
    adjacency: BTreeMap<VertexId, EdgeList>,
}

impl Graph {
    /// An empty graph.
    pub fn new() -> Self {
        Graph::default()
    }

    /// Builds a graph from an edge list, creating vertices as needed.
    pub fn from_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (VertexId, VertexId)>,
    {
        let mut graph = Graph::new();
        for (u, v) in edges {
            graph.add_edge(u, v);
        }
        graph
    }

    /// Adds a vertex with no edges. Adding an existing vertex is a no-op.
    pub fn add_vertex(&mut self, id: VertexId) {
        self.adjacency.entry(id).or_default();
    }

    /// Adds the undirected edge `(u, v)`, creating either endpoint as
    /// needed. Duplicate edges are ignored.
    ///
    /// # Panics
    ///
    /// Panics on a self-loop; a vertex adjacent to itself admits no proper
    /// coloring.
    pub fn add_edge(&mut self, u: VertexId, v: VertexId) {
        assert!(u != v, "self-loop at vertex {} admits no proper coloring", u);
        let forward = self.adjacency.entry(u).or_default();
        if !forward.contains(&v) {
            forward.push(v);
        }
        let backward = self.adjacency.entry(v).or_default();
        if !backward.contains(&u) {
            backward.push(u);
        }
    }

    /// True if the vertex is present.
    pub fn contains_vertex(&self, id: VertexId) -> bool {
        self.adjacency.contains_key(&id)
    }

    /// True if the undirected edge `(u, v)` is present.
    pub fn contains_edge(&self, u: VertexId, v: VertexId) -> bool {
        self.adjacency.get(&u).is_some_and(|edges| edges.contains(&v))
    }

    /// Vertex identifiers in increasing order.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.adjacency.keys().copied()
    }

    /// The neighbors of `id`, or an empty slice for an absent vertex.
    pub fn neighbors(&self, id: VertexId) -> &[VertexId] {
        self.adjacency.get(&id).map_or(&[], |edges| edges.as_slice())
    }

    /// The degree of `id`.
    pub fn degree(&self, id: VertexId) -> usize {
        self.neighbors(id).len()
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> u64 {
        self.adjacency.len() as u64
    }

    /// Number of undirected edges.
    pub fn num_edges(&self) -> u64 {
        let endpoints: usize = self.adjacency.values().map(|edges| edges.len()).sum();
        (endpoints / 2) as u64
    }
}

/// A vertex record as owned by the driver: identity, value, the surviving
/// edge set, and the halt flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vertex {
    /// The vertex identifier.
    pub id: VertexId,
    /// Coloring status and set membership.
    pub value: VertexValue,
    /// Surviving edges; shrinks under edge cleaning, never grows.
    pub edges: EdgeList,
    /// Whether the vertex has voted to halt. A halted vertex is woken only
    /// by message delivery.
    pub halted: bool,
}

impl Vertex {
    /// A fresh, awake, uncolored vertex with the given edges.
    pub fn new(id: VertexId, edges: EdgeList) -> Self {
        Vertex { id, value: VertexValue::new(), edges, halted: false }
    }

    /// Number of surviving edges.
    pub fn degree(&self) -> usize {
        self.edges.len()
    }

    /// Removes the edge to `neighbor`, if present. Idempotent per sender,
    /// so the unspecified ordering of a message bag cannot matter.
    pub fn remove_edge(&mut self, neighbor: VertexId) {
        self.edges.retain(|&mut id| id != neighbor);
    }
}
