use std::sync::atomic::Ordering;
use std::sync::Arc;

use bfsvtab::{register_with_options, CounterMetrics, ModuleOptions};
use rusqlite::{Connection, Result};

fn chain(options: ModuleOptions) -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    register_with_options(&conn, options)?;
    conn.execute_batch(
        "CREATE TABLE edges(src INTEGER, dst INTEGER);
         INSERT INTO edges VALUES (1, 2), (2, 3), (3, 4), (4, 5), (2, 6);
         CREATE VIRTUAL TABLE reach USING bfsvtab(
             tablename=edges, fromcolumn=src, tocolumn=dst, order_by_column=dst);",
    )?;
    Ok(conn)
}

fn ids(conn: &Connection, sql: &str) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], |row| row.get(0))?;
    rows.collect()
}

#[test]
fn strict_and_inclusive_bounds() -> Result<()> {
    let conn = chain(ModuleOptions::default())?;
    assert_eq!(
        ids(&conn, "SELECT id FROM reach WHERE root = 1 AND distance < 2")?,
        vec![1, 2]
    );
    assert_eq!(
        ids(&conn, "SELECT id FROM reach WHERE root = 1 AND distance <= 2")?,
        vec![1, 2, 3, 6]
    );
    assert_eq!(
        ids(&conn, "SELECT id FROM reach WHERE root = 1 AND distance = 2")?,
        vec![3, 6]
    );
    assert_eq!(
        ids(&conn, "SELECT id FROM reach WHERE root = 1 AND distance < 0")?,
        Vec::<i64>::new()
    );
    Ok(())
}

#[test]
fn bound_limits_neighbor_scans() -> Result<()> {
    let metrics = Arc::new(CounterMetrics::default());
    let conn = chain(ModuleOptions::default().metrics(metrics.clone()))?;
    assert_eq!(
        ids(&conn, "SELECT id FROM reach WHERE root = 1 AND distance <= 1")?,
        vec![1, 2]
    );
    // only the root is expanded; the distance-1 row is emitted without a scan
    assert_eq!(metrics.neighbor_scans.load(Ordering::Relaxed), 1);
    assert_eq!(metrics.expansions_pruned.load(Ordering::Relaxed), 1);
    Ok(())
}

#[test]
fn disabled_enforcement_still_filters_rows() -> Result<()> {
    let metrics = Arc::new(CounterMetrics::default());
    let options = ModuleOptions::default()
        .metrics(metrics.clone())
        .enforce_distance_bound(false);
    let conn = chain(options)?;
    assert_eq!(
        ids(&conn, "SELECT id FROM reach WHERE root = 1 AND distance <= 1")?,
        vec![1, 2]
    );
    // every reachable vertex was visited and rejected by the host instead
    assert_eq!(metrics.rows_emitted.load(Ordering::Relaxed), 6);
    assert_eq!(metrics.neighbor_scans.load(Ordering::Relaxed), 6);
    assert_eq!(metrics.expansions_pruned.load(Ordering::Relaxed), 0);
    Ok(())
}

#[test]
fn bound_from_parameter() -> Result<()> {
    let conn = chain(ModuleOptions::default())?;
    let mut stmt = conn.prepare("SELECT id FROM reach WHERE root = ?1 AND distance < ?2")?;
    let ids: Vec<i64> = stmt
        .query_map([2, 2], |row| row.get(0))?
        .collect::<Result<_>>()?;
    assert_eq!(ids, vec![2, 3, 6]);
    Ok(())
}
