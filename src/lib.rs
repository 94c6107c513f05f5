//! Breadth-first graph traversal as a SQLite virtual table.
//!
//! Register the module on a connection, declare a table over any edge table,
//! and query reachable vertices in BFS order:
//!
//! ```no_run
//! # fn main() -> rusqlite::Result<()> {
//! let conn = rusqlite::Connection::open_in_memory()?;
//! bfsvtab::register(&conn)?;
//! conn.execute_batch(
//!     "CREATE TABLE edges(src INTEGER, dst INTEGER);
//!      CREATE VIRTUAL TABLE reach USING bfsvtab(tablename=edges, fromcolumn=src, tocolumn=dst);",
//! )?;
//! let mut stmt = conn.prepare("SELECT id, distance FROM reach WHERE root = ?1")?;
//! let rows = stmt.query_map([1], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))?;
//! # drop(rows);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod binding;

/// Error type shared by the engine and the SQLite glue.
pub mod error;

/// Counters for traversal activity.
pub mod metrics;

/// Module-level configuration.
pub mod options;

pub mod plan;
pub mod traversal;
pub mod vtab;

pub use binding::{BindingKey, EdgeQuery, TableBinding};
pub use error::{BfsError, Result};
pub use metrics::{default_metrics, CounterMetrics, NoopMetrics, TraversalMetrics};
pub use options::{ModuleOptions, DEFAULT_MODULE_NAME};
pub use traversal::{AdjacencyList, DistanceBound, NeighborSource, Traversal, VertexId};
pub use vtab::{register, register_with_options, BfsCursor, BfsTab, SqlNeighbors};
