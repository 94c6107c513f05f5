use std::collections::VecDeque;

use super::VertexId;

/// A vertex that has been discovered but not yet emitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrontierRecord {
    /// Vertex id.
    pub id: VertexId,
    /// Vertex this one was discovered from; equal to `id` for the root.
    pub parent: VertexId,
    /// Hops from the root.
    pub distance: i64,
}

impl FrontierRecord {
    /// Record seeding a traversal at `id`.
    pub fn root(id: VertexId) -> Self {
        Self {
            id,
            parent: id,
            distance: 0,
        }
    }

    /// Returns `true` for the record that seeded the traversal.
    pub fn is_root(&self) -> bool {
        self.parent == self.id
    }
}

/// First-in first-out queue of frontier records.
#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<FrontierRecord>,
}

impl Frontier {
    /// Creates an empty frontier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `record` at the tail.
    pub fn push(&mut self, record: FrontierRecord) {
        self.queue.push_back(record);
    }

    /// Removes and returns the oldest record.
    pub fn pull(&mut self) -> Option<FrontierRecord> {
        self.queue.pop_front()
    }

    /// Number of queued records.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns `true` when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Hands every queued record to `release`, head to tail, leaving the queue empty.
    pub fn destroy<F: FnMut(FrontierRecord)>(&mut self, release: F) {
        self.queue.drain(..).for_each(release);
    }
}
