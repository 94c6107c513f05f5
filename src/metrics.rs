use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Trait for tracking traversal activity across all cursors of a module.
///
/// Implementations receive one call per event and must be cheap; they are
/// invoked from inside the host's scan loop.
pub trait TraversalMetrics: Send + Sync {
    /// Records a filter call that started a traversal.
    fn traversal_started(&self);

    /// Records a filter call that produced no traversal, either because the
    /// plan lacked `root = ?` or because the edge binding was incomplete.
    fn empty_plan(&self);

    /// Records a row handed to the host.
    fn row_emitted(&self);

    /// Records one execution of the neighbor query.
    fn neighbor_scan(&self);

    /// Records neighbor values dropped because they were not integers.
    fn neighbors_skipped(&self, count: u64);

    /// Records an expansion skipped because children would exceed the distance bound.
    fn expansion_pruned(&self);
}

/// A no-op implementation of [`TraversalMetrics`].
#[derive(Default)]
pub struct NoopMetrics;

impl TraversalMetrics for NoopMetrics {
    fn traversal_started(&self) {}
    fn empty_plan(&self) {}
    fn row_emitted(&self) {}
    fn neighbor_scan(&self) {}
    fn neighbors_skipped(&self, _count: u64) {}
    fn expansion_pruned(&self) {}
}

/// Atomic counter implementation of [`TraversalMetrics`].
#[derive(Default)]
pub struct CounterMetrics {
    /// Traversals started by filter.
    pub traversals_started: AtomicU64,

    /// Filter calls that produced an empty result without traversing.
    pub empty_plans: AtomicU64,

    /// Rows emitted to the host.
    pub rows_emitted: AtomicU64,

    /// Neighbor query executions.
    pub neighbor_scans: AtomicU64,

    /// Non-integer neighbor values dropped.
    pub neighbors_skipped: AtomicU64,

    /// Expansions skipped by the distance bound.
    pub expansions_pruned: AtomicU64,
}

impl TraversalMetrics for CounterMetrics {
    fn traversal_started(&self) {
        self.traversals_started.fetch_add(1, Ordering::Relaxed);
    }

    fn empty_plan(&self) {
        self.empty_plans.fetch_add(1, Ordering::Relaxed);
    }

    fn row_emitted(&self) {
        self.rows_emitted.fetch_add(1, Ordering::Relaxed);
    }

    fn neighbor_scan(&self) {
        self.neighbor_scans.fetch_add(1, Ordering::Relaxed);
    }

    fn neighbors_skipped(&self, count: u64) {
        self.neighbors_skipped.fetch_add(count, Ordering::Relaxed);
    }

    fn expansion_pruned(&self) {
        self.expansions_pruned.fetch_add(1, Ordering::Relaxed);
    }
}

/// Returns the default metrics implementation, [`NoopMetrics`], wrapped in an [`Arc`].
pub fn default_metrics() -> Arc<dyn TraversalMetrics> {
    Arc::new(NoopMetrics)
}
