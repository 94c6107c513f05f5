//! Edge-table binding: which table and columns describe the graph.
//!
//! A binding is declared by the `CREATE VIRTUAL TABLE` arguments and may be
//! overridden per query through the hidden columns of the same names.

use crate::error::{BfsError, Result};

/// Keys accepted both as creation arguments and as hidden-column overrides.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BindingKey {
    /// Name of the edge table.
    TableName,
    /// Column holding the tail of each edge.
    FromColumn,
    /// Column holding the head of each edge.
    ToColumn,
    /// Column that orders siblings during expansion.
    OrderByColumn,
}

impl BindingKey {
    /// All keys in declaration order.
    pub const ALL: [BindingKey; 4] = [
        BindingKey::TableName,
        BindingKey::FromColumn,
        BindingKey::ToColumn,
        BindingKey::OrderByColumn,
    ];

    /// Argument and column name of the key.
    pub fn as_str(self) -> &'static str {
        match self {
            BindingKey::TableName => "tablename",
            BindingKey::FromColumn => "fromcolumn",
            BindingKey::ToColumn => "tocolumn",
            BindingKey::OrderByColumn => "order_by_column",
        }
    }
}

/// Table and column names used to fetch neighbors.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TableBinding {
    /// Edge table.
    pub table: Option<String>,
    /// Tail column.
    pub from_column: Option<String>,
    /// Head column.
    pub to_column: Option<String>,
    /// Optional sibling ordering column.
    pub order_by_column: Option<String>,
}

impl TableBinding {
    /// Parses `key=value` creation arguments.
    ///
    /// Values are dequoted; a later occurrence of a key replaces an earlier one.
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Result<Self> {
        let mut binding = TableBinding::default();
        for arg in args {
            let arg = arg.as_ref();
            let Some((key, raw)) = BindingKey::ALL
                .iter()
                .find_map(|key| value_of_key(key.as_str(), arg).map(|value| (*key, value)))
            else {
                return Err(BfsError::UnrecognizedArgument(arg.to_owned()));
            };
            let value = dequote(raw);
            if value.is_empty() {
                return Err(BfsError::EmptyArgument(arg.to_owned()));
            }
            binding.set(key, value);
        }
        Ok(binding)
    }

    /// Value bound to `key`.
    pub fn get(&self, key: BindingKey) -> Option<&str> {
        match key {
            BindingKey::TableName => self.table.as_deref(),
            BindingKey::FromColumn => self.from_column.as_deref(),
            BindingKey::ToColumn => self.to_column.as_deref(),
            BindingKey::OrderByColumn => self.order_by_column.as_deref(),
        }
    }

    /// Binds `key` to `value`.
    pub fn set(&mut self, key: BindingKey, value: String) {
        let slot = match key {
            BindingKey::TableName => &mut self.table,
            BindingKey::FromColumn => &mut self.from_column,
            BindingKey::ToColumn => &mut self.to_column,
            BindingKey::OrderByColumn => &mut self.order_by_column,
        };
        *slot = Some(value);
    }

    /// Returns a copy of `self` with every key bound in `overrides` replaced.
    pub fn overlay(&self, overrides: &TableBinding) -> TableBinding {
        let mut merged = self.clone();
        for key in BindingKey::ALL {
            if let Some(value) = overrides.get(key) {
                merged.set(key, value.to_owned());
            }
        }
        merged
    }

    /// Returns the key that must still be supplied before a query can run.
    pub fn missing(&self) -> Option<BindingKey> {
        [
            BindingKey::TableName,
            BindingKey::FromColumn,
            BindingKey::ToColumn,
        ]
        .into_iter()
        .find(|key| self.get(*key).is_none())
    }

    /// Resolves the binding into a neighbor query.
    pub fn edge_query(&self) -> Result<EdgeQuery<'_>> {
        match (&self.table, &self.from_column, &self.to_column) {
            (Some(table), Some(from_column), Some(to_column)) => Ok(EdgeQuery {
                table,
                from_column,
                to_column,
                order_by_column: self.order_by_column.as_deref(),
            }),
            _ => Err(BfsError::MissingBinding(
                self.missing().map_or("binding", BindingKey::as_str),
            )),
        }
    }
}

/// A fully resolved binding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EdgeQuery<'a> {
    /// Edge table.
    pub table: &'a str,
    /// Tail column.
    pub from_column: &'a str,
    /// Head column.
    pub to_column: &'a str,
    /// Optional sibling ordering column.
    pub order_by_column: Option<&'a str>,
}

impl EdgeQuery<'_> {
    /// SQL selecting the heads of all edges whose tail is `?1`.
    pub fn sql(&self) -> String {
        let mut sql = String::with_capacity(96);
        sql.push_str("SELECT ");
        push_column(&mut sql, self.table, self.to_column);
        sql.push_str(" FROM ");
        push_identifier(&mut sql, self.table);
        sql.push_str(" WHERE ");
        push_column(&mut sql, self.table, self.from_column);
        sql.push_str("=?1");
        if let Some(order) = self.order_by_column {
            sql.push_str(" ORDER BY ");
            push_column(&mut sql, self.table, order);
        }
        sql
    }
}

/// Strips one level of SQL quoting.
///
/// Values starting with `"`, `'`, `` ` `` or `[` lose the surrounding quotes and
/// doubled closing quotes collapse to one; anything else is returned unchanged.
pub fn dequote(input: &str) -> String {
    let mut chars = input.chars();
    let close = match chars.next() {
        Some('[') => ']',
        Some(q @ ('"' | '\'' | '`')) => q,
        _ => return input.to_owned(),
    };
    let mut out = String::with_capacity(input.len());
    let mut rest = chars.peekable();
    while let Some(c) = rest.next() {
        if c != close {
            out.push(c);
        } else if rest.peek() == Some(&close) {
            rest.next();
            out.push(close);
        } else {
            break;
        }
    }
    out
}

/// Returns the value of a `key = value` argument, ignoring spaces around `=`.
fn value_of_key<'a>(key: &str, arg: &'a str) -> Option<&'a str> {
    let rest = arg.trim_start().strip_prefix(key)?;
    let value = rest.trim_start().strip_prefix('=')?;
    Some(value.trim())
}

fn push_identifier(sql: &mut String, ident: &str) {
    sql.push('"');
    for c in ident.chars() {
        if c == '"' {
            sql.push('"');
        }
        sql.push(c);
    }
    sql.push('"');
}

fn push_column(sql: &mut String, table: &str, column: &str) {
    push_identifier(sql, table);
    sql.push('.');
    push_identifier(sql, column);
}
