use std::fmt::Write as _;
use std::sync::Arc;

use smallvec::SmallVec;
use tracing::trace;

use crate::error::Result;
use crate::metrics::TraversalMetrics;
use crate::options::ModuleOptions;

use super::frontier::{Frontier, FrontierRecord};
use super::visited::{Insertion, Visited, VisitedSet};
use super::VertexId;

/// Buffer the neighbor source fills for a single expansion.
pub type NeighborBuf = SmallVec<[VertexId; 16]>;

/// Supplies the outgoing neighbors of a vertex.
pub trait NeighborSource {
    /// Appends the heads of every edge leaving `id` to `out`, in the order the
    /// underlying store returns them.
    ///
    /// Returns how many candidate values were dropped because they were not
    /// integers.
    fn neighbors(&mut self, id: VertexId, out: &mut NeighborBuf) -> Result<usize>;
}

/// Upper bound on the distance of emitted vertices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DistanceBound {
    /// `distance < n`
    Below(i64),
    /// `distance <= n` or `distance = n`
    AtMost(i64),
}

impl DistanceBound {
    /// Returns `true` if a vertex at `distance` may be emitted.
    pub fn admits(&self, distance: i64) -> bool {
        match *self {
            DistanceBound::Below(limit) => distance < limit,
            DistanceBound::AtMost(limit) => distance <= limit,
        }
    }
}

/// Breadth-first traversal over a [`NeighborSource`], one vertex per step.
///
/// The traversal is primed by [`Traversal::start`], which seeds the root and
/// positions the cursor on it. Each [`Traversal::advance`] releases the current
/// record, pulls the next one from the frontier and expands it.
pub struct Traversal<S> {
    root: VertexId,
    source: S,
    visited: VisitedSet,
    frontier: Frontier,
    current: Option<FrontierRecord>,
    bound: Option<DistanceBound>,
    scratch: NeighborBuf,
    metrics: Arc<dyn TraversalMetrics>,
}

impl<S: NeighborSource> Traversal<S> {
    /// Seeds a traversal at `root` and advances onto the root row.
    pub fn start(
        root: VertexId,
        source: S,
        options: &ModuleOptions,
        bound: Option<DistanceBound>,
    ) -> Result<Self> {
        let mut visited = VisitedSet::with_capacity(options.visited_capacity);
        visited.insert(Visited::root(root));
        let mut frontier = Frontier::new();
        frontier.push(FrontierRecord::root(root));
        let mut traversal = Self {
            root,
            source,
            visited,
            frontier,
            current: None,
            bound,
            scratch: NeighborBuf::new(),
            metrics: Arc::clone(&options.metrics),
        };
        options.metrics.traversal_started();
        traversal.advance()?;
        Ok(traversal)
    }

    /// Moves to the next vertex in BFS order and expands it.
    ///
    /// On error the cursor keeps the pulled record as current and remains safe
    /// to drop.
    pub fn advance(&mut self) -> Result<()> {
        self.current = self.frontier.pull();
        let Some(current) = self.current else {
            return Ok(());
        };
        self.metrics.row_emitted();

        let child_distance = current.distance + 1;
        if let Some(bound) = self.bound {
            if !bound.admits(child_distance) {
                self.metrics.expansion_pruned();
                return Ok(());
            }
        }

        self.scratch.clear();
        self.metrics.neighbor_scan();
        let skipped = self.source.neighbors(current.id, &mut self.scratch)?;
        if skipped > 0 {
            self.metrics.neighbors_skipped(skipped as u64);
        }

        let mut discovered = 0usize;
        for &id in &self.scratch {
            let entry = Visited {
                id,
                parent: current.id,
            };
            if let Insertion::Inserted = self.visited.insert(entry) {
                self.frontier.push(FrontierRecord {
                    id,
                    parent: current.id,
                    distance: child_distance,
                });
                discovered += 1;
            }
        }
        trace!(
            vertex = current.id,
            distance = current.distance,
            fetched = self.scratch.len(),
            discovered,
            skipped,
            "expanded vertex"
        );
        Ok(())
    }

    /// Returns `true` once every reachable vertex has been emitted.
    pub fn is_exhausted(&self) -> bool {
        self.current.is_none() && self.frontier.is_empty()
    }
}

impl<S> Traversal<S> {
    /// The vertex the traversal started from.
    pub fn root(&self) -> VertexId {
        self.root
    }

    /// Record the cursor is positioned on.
    pub fn current(&self) -> Option<&FrontierRecord> {
        self.current.as_ref()
    }

    /// BFS parent of the current vertex; `None` for the root.
    pub fn parent(&self) -> Option<VertexId> {
        self.current
            .filter(|record| record.id != self.root)
            .map(|record| record.parent)
    }

    /// Distance bound in effect, if any.
    pub fn bound(&self) -> Option<DistanceBound> {
        self.bound
    }

    /// Vertices discovered so far, emitted or not.
    pub fn visited(&self) -> &VisitedSet {
        &self.visited
    }

    /// Number of vertices discovered but not yet emitted.
    pub fn pending(&self) -> usize {
        self.frontier.len()
    }

    /// Shortest path from the root to the current vertex, rendered as
    /// `/root/.../current/`.
    pub fn shortest_path(&self) -> Option<String> {
        let current = self.current?;
        let lineage = self.visited.lineage(current.id);
        let mut path = String::with_capacity(lineage.len() * 8 + 1);
        path.push('/');
        for id in lineage {
            // writing into a String cannot fail
            let _ = write!(path, "{id}/");
        }
        Some(path)
    }

    /// Releases all traversal state, returning how many visited entries and
    /// pending frontier records were dropped.
    pub fn release(&mut self) -> (usize, usize) {
        let mut visited = 0usize;
        let mut pending = 0usize;
        self.visited.destroy(|_| visited += 1);
        self.frontier.destroy(|_| pending += 1);
        self.current = None;
        (visited, pending)
    }
}
