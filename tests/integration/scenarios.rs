#![allow(clippy::type_complexity)]

use bfsvtab::{register, register_with_options, CounterMetrics, ModuleOptions};
use rusqlite::{params, Connection, Result};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

type Row = (i64, Option<i64>, i64, String);

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn setup(edges: &[(i64, i64)], order_by: Option<&str>) -> Result<Connection> {
    init_tracing();
    let conn = Connection::open_in_memory()?;
    register(&conn)?;
    conn.execute_batch("CREATE TABLE edges(src INTEGER, dst INTEGER);")?;
    for (src, dst) in edges {
        conn.execute("INSERT INTO edges(src, dst) VALUES (?1, ?2)", params![src, dst])?;
    }
    let order = order_by
        .map(|column| format!(", order_by_column={column}"))
        .unwrap_or_default();
    conn.execute_batch(&format!(
        "CREATE VIRTUAL TABLE reach USING bfsvtab(tablename=edges, fromcolumn=src, tocolumn=dst{order});"
    ))?;
    Ok(conn)
}

fn traverse(conn: &Connection, root: i64) -> Result<Vec<Row>> {
    let mut stmt =
        conn.prepare("SELECT id, parent, distance, shortest_path FROM reach WHERE root = ?1")?;
    let rows = stmt.query_map([root], |row| {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
    })?;
    rows.collect()
}

fn row(id: i64, parent: Option<i64>, distance: i64, path: &str) -> Row {
    (id, parent, distance, path.to_owned())
}

#[test]
fn linear_chain() -> Result<()> {
    let conn = setup(&[(1, 2), (2, 3), (3, 4)], None)?;
    assert_eq!(
        traverse(&conn, 1)?,
        vec![
            row(1, None, 0, "/1/"),
            row(2, Some(1), 1, "/1/2/"),
            row(3, Some(2), 2, "/1/2/3/"),
            row(4, Some(3), 3, "/1/2/3/4/"),
        ]
    );
    Ok(())
}

#[test]
fn cycle_terminates() -> Result<()> {
    let conn = setup(&[(1, 2), (2, 3), (3, 1)], None)?;
    assert_eq!(
        traverse(&conn, 1)?,
        vec![
            row(1, None, 0, "/1/"),
            row(2, Some(1), 1, "/1/2/"),
            row(3, Some(2), 2, "/1/2/3/"),
        ]
    );
    Ok(())
}

#[test]
fn diamond_without_ordering() -> Result<()> {
    let conn = setup(&[(1, 2), (1, 3), (2, 4), (3, 4)], None)?;
    let rows = traverse(&conn, 1)?;
    let mut by_distance: Vec<(i64, i64)> = rows.iter().map(|r| (r.0, r.2)).collect();
    by_distance.sort_unstable();
    assert_eq!(by_distance, vec![(1, 0), (2, 1), (3, 1), (4, 2)]);

    // whichever sibling came back first is the parent of 4
    let first_sibling = rows[1].0;
    assert_eq!(rows[3].1, Some(first_sibling));
    assert_eq!(rows[3].3, format!("/1/{first_sibling}/4/"));
    Ok(())
}

#[test]
fn diamond_with_ordering_is_deterministic() -> Result<()> {
    // insert the edges out of order; ordering by dst must still yield 2 before 3
    let conn = setup(&[(3, 4), (2, 4), (1, 3), (1, 2)], Some("dst"))?;
    let expected = vec![
        row(1, None, 0, "/1/"),
        row(2, Some(1), 1, "/1/2/"),
        row(3, Some(1), 1, "/1/3/"),
        row(4, Some(2), 2, "/1/2/4/"),
    ];
    assert_eq!(traverse(&conn, 1)?, expected);
    assert_eq!(traverse(&conn, 1)?, expected);
    Ok(())
}

#[test]
fn ordering_column_can_differ_from_target() -> Result<()> {
    init_tracing();
    let conn = Connection::open_in_memory()?;
    register(&conn)?;
    conn.execute_batch(
        "CREATE TABLE links(a INTEGER, b INTEGER, rank INTEGER);
         INSERT INTO links VALUES (1, 2, 30), (1, 3, 10), (1, 4, 20);
         CREATE VIRTUAL TABLE r USING bfsvtab(
             tablename='links', fromcolumn=\"a\", tocolumn=[b], order_by_column=`rank`);",
    )?;
    let mut stmt = conn.prepare("SELECT id FROM r WHERE root = 1")?;
    let ids: Vec<i64> = stmt.query_map([], |row| row.get(0))?.collect::<Result<_>>()?;
    assert_eq!(ids, vec![1, 3, 4, 2]);
    Ok(())
}

#[test]
fn disconnected_component_is_unreachable() -> Result<()> {
    let conn = setup(&[(1, 2), (3, 4)], None)?;
    assert_eq!(
        traverse(&conn, 1)?,
        vec![row(1, None, 0, "/1/"), row(2, Some(1), 1, "/1/2/")]
    );
    Ok(())
}

#[test]
fn root_without_edges_is_still_emitted() -> Result<()> {
    let conn = setup(&[(1, 2)], None)?;
    assert_eq!(traverse(&conn, 42)?, vec![row(42, None, 0, "/42/")]);
    Ok(())
}

#[test]
fn missing_root_constraint_yields_nothing() -> Result<()> {
    let conn = setup(&[(1, 2), (2, 3)], None)?;
    let count: i64 = conn.query_row("SELECT count(*) FROM reach", [], |row| row.get(0))?;
    assert_eq!(count, 0);
    let count: i64 =
        conn.query_row("SELECT count(*) FROM reach WHERE root > 0", [], |row| row.get(0))?;
    assert_eq!(count, 0);
    Ok(())
}

#[test]
fn rowid_root_and_hidden_columns() -> Result<()> {
    let conn = setup(&[(7, 8)], Some("dst"))?;
    let mut stmt = conn.prepare(
        "SELECT rowid, id, root, tablename, fromcolumn, tocolumn, order_by_column
         FROM reach WHERE root = 7",
    )?;
    let rows: Vec<(i64, i64, i64, String, String, String, String)> = stmt
        .query_map([], |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
            ))
        })?
        .collect::<Result<_>>()?;
    assert_eq!(rows.len(), 2);
    for (rowid, id, root, table, from, to, order) in rows {
        assert_eq!(rowid, id);
        assert_eq!(root, 7);
        assert_eq!(
            (table.as_str(), from.as_str(), to.as_str(), order.as_str()),
            ("edges", "src", "dst", "dst")
        );
    }
    Ok(())
}

#[test]
fn unset_ordering_column_projects_null() -> Result<()> {
    let conn = setup(&[(1, 2)], None)?;
    let order: Option<String> = conn.query_row(
        "SELECT order_by_column FROM reach WHERE root = 1 LIMIT 1",
        [],
        |row| row.get(0),
    )?;
    assert!(order.is_none());
    Ok(())
}

#[test]
fn nested_cursors_traverse_independently() -> Result<()> {
    let conn = setup(&[(1, 2), (2, 3)], Some("dst"))?;
    let mut stmt = conn.prepare(
        "SELECT a.id, b.id FROM reach AS a, reach AS b
         WHERE a.root = 1 AND b.root = a.id ORDER BY a.id, b.id",
    )?;
    let pairs: Vec<(i64, i64)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<_>>()?;
    assert_eq!(pairs, vec![(1, 1), (1, 2), (1, 3), (2, 2), (2, 3), (3, 3)]);
    Ok(())
}

#[test]
fn metrics_count_rows_and_scans() -> Result<()> {
    init_tracing();
    let metrics = Arc::new(CounterMetrics::default());
    let conn = Connection::open_in_memory()?;
    register_with_options(&conn, ModuleOptions::default().metrics(metrics.clone()))?;
    conn.execute_batch(
        "CREATE TABLE e(f, t);
         INSERT INTO e VALUES (1, 2), (1, 'two'), (2, 3);
         CREATE VIRTUAL TABLE r USING bfsvtab(tablename=e, fromcolumn=f, tocolumn=t);",
    )?;
    let count: i64 = conn.query_row("SELECT count(*) FROM r WHERE root = 1", [], |row| row.get(0))?;
    assert_eq!(count, 3);
    let count: i64 = conn.query_row("SELECT count(*) FROM r", [], |row| row.get(0))?;
    assert_eq!(count, 0);

    assert_eq!(metrics.traversals_started.load(Ordering::Relaxed), 1);
    assert_eq!(metrics.rows_emitted.load(Ordering::Relaxed), 3);
    assert_eq!(metrics.neighbor_scans.load(Ordering::Relaxed), 3);
    assert_eq!(metrics.neighbors_skipped.load(Ordering::Relaxed), 1);
    assert_eq!(metrics.empty_plans.load(Ordering::Relaxed), 1);
    Ok(())
}

#[test]
fn custom_module_name() -> Result<()> {
    let conn = Connection::open_in_memory()?;
    register_with_options(&conn, ModuleOptions::default().name("bfs"))?;
    conn.execute_batch(
        "CREATE TABLE e(f, t);
         INSERT INTO e VALUES (1, 2);
         CREATE VIRTUAL TABLE r USING bfs(tablename=e, fromcolumn=f, tocolumn=t);",
    )?;
    let count: i64 = conn.query_row("SELECT count(*) FROM r WHERE root = 1", [], |row| row.get(0))?;
    assert_eq!(count, 2);
    Ok(())
}

#[test]
fn declaration_survives_reopen() -> Result<()> {
    init_tracing();
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("graph.db");
    {
        let conn = Connection::open(&path)?;
        register(&conn)?;
        conn.execute_batch(
            "CREATE TABLE edges(src INTEGER, dst INTEGER);
             INSERT INTO edges VALUES (1, 2), (2, 3);
             CREATE VIRTUAL TABLE reach USING bfsvtab(tablename=edges, fromcolumn=src, tocolumn=dst);",
        )?;
    }
    let conn = Connection::open(&path)?;
    register(&conn)?;
    assert_eq!(
        traverse(&conn, 1)?,
        vec![
            row(1, None, 0, "/1/"),
            row(2, Some(1), 1, "/1/2/"),
            row(3, Some(2), 2, "/1/2/3/"),
        ]
    );
    Ok(())
}
