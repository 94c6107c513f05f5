//! SQLite virtual table module exposing the traversal.
//!
//! ```sql
//! CREATE VIRTUAL TABLE reach USING bfsvtab(
//!     tablename=edges, fromcolumn=src, tocolumn=dst, order_by_column=dst
//! );
//! SELECT id, parent, distance, shortest_path FROM reach WHERE root = 1;
//! ```

mod neighbors;

use std::os::raw::c_int;

use rusqlite::ffi;
use rusqlite::types::{Null, ValueRef};
use rusqlite::vtab::{
    read_only_module, Context, CreateVTab, IndexConstraintOp, IndexInfo, VTab, VTabConnection,
    VTabCursor, VTabKind, Values,
};
use rusqlite::Connection;
use tracing::{debug, trace, warn};

use crate::binding::{BindingKey, TableBinding};
use crate::error::{BfsError, Result};
use crate::options::ModuleOptions;
use crate::plan::{self, Candidate, Column, ConstraintOp, PlanDescriptor, SCHEMA};
use crate::traversal::{DistanceBound, Traversal, VertexId};

pub use neighbors::SqlNeighbors;

/// Registers the module under its default name, `bfsvtab`.
pub fn register(conn: &Connection) -> rusqlite::Result<()> {
    register_with_options(conn, ModuleOptions::default())
}

/// Registers the module with explicit options.
pub fn register_with_options(conn: &Connection, options: ModuleOptions) -> rusqlite::Result<()> {
    let name = options.name.clone();
    conn.create_module(name.as_str(), read_only_module::<BfsTab>(), Some(options))
}

/// A traversal table bound to one edge table.
#[repr(C)]
pub struct BfsTab {
    /// Base class. Must be first.
    base: ffi::sqlite3_vtab,
    conn: Connection,
    name: String,
    binding: TableBinding,
    options: ModuleOptions,
}

unsafe impl<'vtab> VTab<'vtab> for BfsTab {
    type Aux = ModuleOptions;
    type Cursor = BfsCursor<'vtab>;

    fn connect(
        db: &mut VTabConnection,
        aux: Option<&ModuleOptions>,
        args: &[&[u8]],
    ) -> rusqlite::Result<(String, Self)> {
        let options = aux.cloned().unwrap_or_default();
        let name = args
            .get(2)
            .map(|raw| String::from_utf8_lossy(raw).into_owned())
            .unwrap_or_default();
        let params = args
            .get(3..)
            .unwrap_or_default()
            .iter()
            .map(|raw| std::str::from_utf8(raw))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(rusqlite::Error::Utf8Error)?;
        let binding = TableBinding::parse(&params).map_err(|err| {
            warn!(table = %name, error = %err, "rejected traversal table arguments");
            err
        })?;
        // SAFETY: the host keeps the handle open for as long as this table
        // exists, and the returned Connection never closes it.
        let conn = unsafe { Connection::from_handle(db.handle())? };
        debug!(
            table = %name,
            edges = ?binding.table,
            from = ?binding.from_column,
            to = ?binding.to_column,
            order_by = ?binding.order_by_column,
            "connected traversal table"
        );
        Ok((
            SCHEMA.to_owned(),
            BfsTab {
                base: ffi::sqlite3_vtab::default(),
                conn,
                name,
                binding,
                options,
            },
        ))
    }

    fn best_index(&self, info: &mut IndexInfo) -> rusqlite::Result<()> {
        let candidates: Vec<Candidate> = info
            .constraints()
            .map(|constraint| Candidate {
                column: constraint.column(),
                op: constraint_op(constraint.operator()),
                usable: constraint.is_usable(),
            })
            .collect();
        let choice = plan::best_index(&candidates, &self.binding);
        for (i, usage) in choice.usages.iter().enumerate() {
            if usage.argv_index > 0 {
                let mut slot = info.constraint_usage(i);
                slot.set_argv_index(usage.argv_index);
                slot.set_omit(usage.omit);
            }
        }
        trace!(
            table = %self.name,
            plan = choice.descriptor.bits(),
            cost = choice.cost,
            "planned traversal"
        );
        info.set_idx_num(choice.descriptor.bits());
        info.set_estimated_cost(choice.cost);
        Ok(())
    }

    fn open(&'vtab mut self) -> rusqlite::Result<BfsCursor<'vtab>> {
        Ok(BfsCursor::new(self))
    }
}

impl<'vtab> CreateVTab<'vtab> for BfsTab {
    const KIND: VTabKind = VTabKind::Default;
}

/// Cursor running one traversal per filter call.
#[repr(C)]
pub struct BfsCursor<'vtab> {
    /// Base class. Must be first.
    base: ffi::sqlite3_vtab_cursor,
    tab: &'vtab BfsTab,
    binding: TableBinding,
    traversal: Option<Traversal<SqlNeighbors<'vtab>>>,
}

impl<'vtab> BfsCursor<'vtab> {
    fn new(tab: &'vtab BfsTab) -> Self {
        BfsCursor {
            base: ffi::sqlite3_vtab_cursor::default(),
            tab,
            binding: tab.binding.clone(),
            traversal: None,
        }
    }

    fn reset(&mut self) {
        if let Some(mut traversal) = self.traversal.take() {
            let (visited, pending) = traversal.release();
            trace!(
                table = %self.tab.name,
                root = traversal.root(),
                visited,
                pending,
                "released traversal"
            );
        }
        self.binding = self.tab.binding.clone();
    }

    fn start(&mut self, plan: PlanDescriptor, args: &Values<'_>) -> Result<()> {
        let tab = self.tab;
        let metrics = &tab.options.metrics;
        if !plan.has_root() {
            metrics.empty_plan();
            debug!(table = %tab.name, "no usable root constraint; empty result");
            return Ok(());
        }
        let Some(root) = integer_value(argument(args, 0)?) else {
            metrics.empty_plan();
            debug!(table = %tab.name, "root is not an integer; empty result");
            return Ok(());
        };

        let mut overrides = TableBinding::default();
        for key in BindingKey::ALL {
            let Some(position) = plan.override_arg(key) else {
                continue;
            };
            // the host never re-checks `key = NULL`, which matches no row
            let Some(value) = text_value(argument(args, position)?) else {
                metrics.empty_plan();
                debug!(table = %tab.name, key = key.as_str(), "override is NULL; empty result");
                return Ok(());
            };
            overrides.set(key, value);
        }
        self.binding = tab.binding.overlay(&overrides);
        let sql = match self.binding.edge_query() {
            Ok(query) => query.sql(),
            Err(BfsError::MissingBinding(key)) => {
                metrics.empty_plan();
                debug!(table = %tab.name, missing = key, "edge binding incomplete; empty result");
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        let bound = match plan.distance_arg() {
            Some(position) if tab.options.enforce_distance_bound => {
                distance_bound(argument(args, position)?, plan.distance_strict())
            }
            _ => None,
        };
        debug!(table = %tab.name, root, plan = plan.bits(), ?bound, %sql, "starting traversal");
        let source = SqlNeighbors::prepare(&tab.conn, &sql)?;
        self.traversal = Some(Traversal::start(root, source, &tab.options, bound)?);
        Ok(())
    }
}

unsafe impl VTabCursor for BfsCursor<'_> {
    fn filter(
        &mut self,
        idx_num: c_int,
        _idx_str: Option<&str>,
        args: &Values<'_>,
    ) -> rusqlite::Result<()> {
        self.reset();
        self.start(PlanDescriptor::from_bits(idx_num), args)?;
        Ok(())
    }

    fn next(&mut self) -> rusqlite::Result<()> {
        if let Some(traversal) = self.traversal.as_mut() {
            traversal.advance()?;
        }
        Ok(())
    }

    fn eof(&self) -> bool {
        self.traversal
            .as_ref()
            .map_or(true, |traversal| traversal.is_exhausted())
    }

    fn column(&self, ctx: &mut Context, i: c_int) -> rusqlite::Result<()> {
        let column = Column::from_index(i)
            .ok_or_else(|| rusqlite::Error::ModuleError(format!("no column at index {i}")))?;
        if let Some(key) = column.binding_key() {
            return ctx.set_result(&self.binding.get(key));
        }
        let Some(traversal) = self.traversal.as_ref() else {
            return ctx.set_result(&Null);
        };
        let Some(current) = traversal.current() else {
            return ctx.set_result(&Null);
        };
        match column {
            Column::Id => ctx.set_result(&current.id),
            Column::Parent => ctx.set_result(&traversal.parent()),
            Column::Distance => ctx.set_result(&current.distance),
            Column::ShortestPath => ctx.set_result(&traversal.shortest_path()),
            Column::Root => ctx.set_result(&traversal.root()),
            _ => ctx.set_result(&Null),
        }
    }

    fn rowid(&self) -> rusqlite::Result<i64> {
        self.traversal
            .as_ref()
            .and_then(|traversal| traversal.current())
            .map(|current| current.id)
            .ok_or_else(|| rusqlite::Error::ModuleError("cursor is not on a row".into()))
    }
}

fn constraint_op(op: IndexConstraintOp) -> ConstraintOp {
    match op {
        IndexConstraintOp::SQLITE_INDEX_CONSTRAINT_EQ => ConstraintOp::Eq,
        IndexConstraintOp::SQLITE_INDEX_CONSTRAINT_LT => ConstraintOp::Lt,
        IndexConstraintOp::SQLITE_INDEX_CONSTRAINT_LE => ConstraintOp::Le,
        _ => ConstraintOp::Other,
    }
}

fn argument<'a>(args: &'a Values<'_>, position: usize) -> Result<ValueRef<'a>> {
    args.iter().nth(position).ok_or_else(|| {
        BfsError::InvalidPlan(format!(
            "argument {position} requested but only {} supplied",
            args.len()
        ))
    })
}

fn integer_value(value: ValueRef<'_>) -> Option<VertexId> {
    match value {
        ValueRef::Integer(v) => Some(v),
        ValueRef::Real(v) if v.fract() == 0.0 => Some(v as i64),
        ValueRef::Text(text) => std::str::from_utf8(text).ok()?.trim().parse().ok(),
        _ => None,
    }
}

fn text_value(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(v) => Some(v.to_string()),
        ValueRef::Real(v) => Some(real_text(v)),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Some(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

/// Renders a real the way SQLite converts it to text (`%!.15g`).
fn real_text(v: f64) -> String {
    if !v.is_finite() {
        let text = if v.is_nan() {
            ""
        } else if v > 0.0 {
            "Inf"
        } else {
            "-Inf"
        };
        return text.to_owned();
    }
    let scientific = format!("{v:.14e}");
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((&scientific, "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    if (-4..15).contains(&exponent) {
        let fixed = format!("{:.*}", (14 - exponent) as usize, v);
        with_fraction(&fixed)
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{sign}{:02}", with_fraction(mantissa), exponent.abs())
    }
}

fn with_fraction(digits: &str) -> String {
    let trimmed = digits.trim_end_matches('0');
    match trimmed.strip_suffix('.') {
        Some(whole) => format!("{whole}.0"),
        None if trimmed.contains('.') => trimmed.to_owned(),
        None => format!("{trimmed}.0"),
    }
}

fn distance_bound(value: ValueRef<'_>, strict: bool) -> Option<DistanceBound> {
    let limit = match value {
        ValueRef::Integer(v) => v,
        ValueRef::Real(v) if strict => v.ceil() as i64,
        ValueRef::Real(v) => v.floor() as i64,
        _ => return None,
    };
    Some(if strict {
        DistanceBound::Below(limit)
    } else {
        DistanceBound::AtMost(limit)
    })
}
