use std::fmt;
use std::sync::Arc;

use crate::metrics::{default_metrics, TraversalMetrics};

/// Name the module is registered under unless overridden.
pub const DEFAULT_MODULE_NAME: &str = "bfsvtab";

/// Configuration supplied when registering the virtual table module.
#[derive(Clone)]
pub struct ModuleOptions {
    /// Module name used in `CREATE VIRTUAL TABLE ... USING <name>(...)`.
    pub name: String,
    /// Metrics sink shared by every table and cursor of the module.
    pub metrics: Arc<dyn TraversalMetrics>,
    /// Whether a `distance` constraint prunes the traversal. When disabled the
    /// bound is still negotiated with the planner but only the host filters rows.
    pub enforce_distance_bound: bool,
    /// Initial arena capacity of each cursor's visited set.
    pub visited_capacity: usize,
}

impl ModuleOptions {
    /// Sets the module name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the metrics sink.
    pub fn metrics(mut self, metrics: Arc<dyn TraversalMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Enables or disables distance-bound pruning.
    pub fn enforce_distance_bound(mut self, enabled: bool) -> Self {
        self.enforce_distance_bound = enabled;
        self
    }

    /// Sets the initial visited-set capacity.
    pub fn visited_capacity(mut self, capacity: usize) -> Self {
        self.visited_capacity = capacity;
        self
    }
}

impl Default for ModuleOptions {
    fn default() -> Self {
        Self {
            name: DEFAULT_MODULE_NAME.to_owned(),
            metrics: default_metrics(),
            enforce_distance_bound: true,
            visited_capacity: 64,
        }
    }
}

impl fmt::Debug for ModuleOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleOptions")
            .field("name", &self.name)
            .field("enforce_distance_bound", &self.enforce_distance_bound)
            .field("visited_capacity", &self.visited_capacity)
            .finish_non_exhaustive()
    }
}
