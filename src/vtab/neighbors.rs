use rusqlite::types::ValueRef;
use rusqlite::{Connection, Statement};

use crate::error::Result;
use crate::traversal::{NeighborBuf, NeighborSource, VertexId};

/// Neighbor source backed by a prepared `SELECT to FROM edges WHERE from = ?1`.
///
/// The statement is compiled once per traversal and reset after every step.
pub struct SqlNeighbors<'conn> {
    stmt: Statement<'conn>,
}

impl<'conn> SqlNeighbors<'conn> {
    /// Compiles `sql`, which must take the tail vertex as parameter 1.
    pub fn prepare(conn: &'conn Connection, sql: &str) -> Result<Self> {
        Ok(Self {
            stmt: conn.prepare(sql)?,
        })
    }
}

impl NeighborSource for SqlNeighbors<'_> {
    fn neighbors(&mut self, id: VertexId, out: &mut NeighborBuf) -> Result<usize> {
        let mut skipped = 0;
        // dropping `rows` resets the statement for the next step
        let mut rows = self.stmt.query([id])?;
        while let Some(row) = rows.next()? {
            match row.get_ref(0)? {
                ValueRef::Integer(head) => out.push(head),
                _ => skipped += 1,
            }
        }
        Ok(skipped)
    }
}
