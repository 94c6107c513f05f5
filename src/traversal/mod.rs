//! Breadth-first traversal engine.
//!
//! The engine is independent of SQLite: it pulls neighbors through the
//! [`NeighborSource`] trait, keeps discovered vertices in a balanced
//! [`VisitedSet`] and pending ones in a FIFO [`Frontier`].

mod adjacency;
mod engine;
mod frontier;
mod visited;

/// Integer vertex id as stored in the edge table.
pub type VertexId = i64;

pub use adjacency::AdjacencyList;
pub use engine::{DistanceBound, NeighborBuf, NeighborSource, Traversal};
pub use frontier::{Frontier, FrontierRecord};
pub use visited::{Insertion, Iter as VisitedIter, Visited, VisitedSet};
