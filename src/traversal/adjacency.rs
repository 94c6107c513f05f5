use std::collections::HashMap;

use crate::error::Result;

use super::engine::{NeighborBuf, NeighborSource};
use super::VertexId;

/// In-memory directed graph that returns neighbors in edge insertion order.
#[derive(Clone, Debug, Default)]
pub struct AdjacencyList {
    out: HashMap<VertexId, Vec<VertexId>>,
}

impl AdjacencyList {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from `(from, to)` pairs.
    pub fn from_edges<I: IntoIterator<Item = (VertexId, VertexId)>>(edges: I) -> Self {
        let mut graph = Self::new();
        for (from, to) in edges {
            graph.add_edge(from, to);
        }
        graph
    }

    /// Adds a directed edge.
    pub fn add_edge(&mut self, from: VertexId, to: VertexId) {
        self.out.entry(from).or_default().push(to);
    }

    /// Number of edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.out.values().map(Vec::len).sum()
    }
}

impl NeighborSource for AdjacencyList {
    fn neighbors(&mut self, id: VertexId, out: &mut NeighborBuf) -> Result<usize> {
        if let Some(heads) = self.out.get(&id) {
            out.extend_from_slice(heads);
        }
        Ok(0)
    }
}
