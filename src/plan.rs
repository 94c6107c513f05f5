//! Index planning for the traversal table.
//!
//! The host offers a list of `WHERE` constraints; the planner picks the ones
//! the traversal binds and packs that choice into an integer descriptor:
//!
//! | bits    | meaning                                          |
//! |---------|--------------------------------------------------|
//! | 0       | `root = ?` present                               |
//! | 1       | distance constraint is a strict `<`              |
//! | 4..=7   | argv position of the distance bound              |
//! | 8..=11  | argv position of the `tablename` override        |
//! | 12..=15 | argv position of the `fromcolumn` override       |
//! | 16..=19 | argv position of the `tocolumn` override         |
//! | 20..=23 | argv position of the `order_by_column` override  |
//!
//! Positions are zero-based indexes into the filter arguments; the root is
//! always at position 0, so a zero nibble means "not bound".

use std::os::raw::c_int;

use crate::binding::{BindingKey, TableBinding};

/// Columns of the virtual table in declaration order.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Column {
    Id,
    Parent,
    Distance,
    ShortestPath,
    Root,
    TableName,
    FromColumn,
    ToColumn,
    OrderByColumn,
}

impl Column {
    /// Maps a host column index onto a column.
    pub fn from_index(index: c_int) -> Option<Column> {
        Some(match index {
            0 => Column::Id,
            1 => Column::Parent,
            2 => Column::Distance,
            3 => Column::ShortestPath,
            4 => Column::Root,
            5 => Column::TableName,
            6 => Column::FromColumn,
            7 => Column::ToColumn,
            8 => Column::OrderByColumn,
            _ => return None,
        })
    }

    /// Binding key overridden through this hidden column, if any.
    pub fn binding_key(self) -> Option<BindingKey> {
        match self {
            Column::TableName => Some(BindingKey::TableName),
            Column::FromColumn => Some(BindingKey::FromColumn),
            Column::ToColumn => Some(BindingKey::ToColumn),
            Column::OrderByColumn => Some(BindingKey::OrderByColumn),
            _ => None,
        }
    }
}

/// Schema declared to the host for every traversal table.
pub const SCHEMA: &str = "CREATE TABLE x(id,parent,distance,shortest_path,root HIDDEN,\
                          tablename HIDDEN,fromcolumn HIDDEN,tocolumn HIDDEN,order_by_column HIDDEN)";

/// Comparison operator of a candidate constraint.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConstraintOp {
    Eq,
    Lt,
    Le,
    Other,
}

/// A `WHERE` constraint offered by the host planner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Candidate {
    /// Host column index.
    pub column: c_int,
    /// Operator.
    pub op: ConstraintOp,
    /// Whether the right-hand side is available to this plan.
    pub usable: bool,
}

/// How the host should treat one candidate constraint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Usage {
    /// 1-based argument slot, or 0 when the constraint is not consumed.
    pub argv_index: c_int,
    /// Whether the host may skip re-checking the constraint.
    pub omit: bool,
}

/// Packed plan descriptor passed from planning to filter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlanDescriptor(c_int);

impl PlanDescriptor {
    const ROOT: c_int = 0x1;
    const DISTANCE_STRICT: c_int = 0x2;
    const DISTANCE_SHIFT: u32 = 4;

    /// Reconstructs a descriptor from the host's `idx_num`.
    pub fn from_bits(bits: c_int) -> Self {
        PlanDescriptor(bits)
    }

    /// Raw `idx_num` value.
    pub fn bits(self) -> c_int {
        self.0
    }

    /// Whether `root = ?` was bound.
    pub fn has_root(self) -> bool {
        self.0 & Self::ROOT != 0
    }

    /// Whether the distance constraint is a strict `<`.
    pub fn distance_strict(self) -> bool {
        self.0 & Self::DISTANCE_STRICT != 0
    }

    /// Argument position of the distance bound.
    pub fn distance_arg(self) -> Option<usize> {
        self.nibble(Self::DISTANCE_SHIFT)
    }

    /// Argument position of the override for `key`.
    pub fn override_arg(self, key: BindingKey) -> Option<usize> {
        self.nibble(Self::shift_for(key))
    }

    fn shift_for(key: BindingKey) -> u32 {
        match key {
            BindingKey::TableName => 8,
            BindingKey::FromColumn => 12,
            BindingKey::ToColumn => 16,
            BindingKey::OrderByColumn => 20,
        }
    }

    fn nibble(self, shift: u32) -> Option<usize> {
        match (self.0 >> shift) & 0xf {
            0 => None,
            position => Some(position as usize),
        }
    }

    fn set_nibble(&mut self, shift: u32, position: c_int) {
        self.0 |= (position & 0xf) << shift;
    }
}

/// Result of planning: descriptor, per-candidate usage and estimated cost.
#[derive(Clone, Debug, PartialEq)]
pub struct PlanChoice {
    /// Packed descriptor handed back to filter as `idx_num`.
    pub descriptor: PlanDescriptor,
    /// One entry per candidate, in candidate order.
    pub usages: Vec<Usage>,
    /// Estimated cost reported to the host.
    pub cost: f64,
}

const BASE_COST: f64 = 10_000_000.0;
const EMPTY_PLAN_PENALTY: f64 = 1e30;

/// Chooses which candidates the traversal binds.
///
/// `root = ?` is mandatory; without it, or without a complete edge binding,
/// the descriptor is zero and the query yields no rows.
pub fn best_index(candidates: &[Candidate], declared: &TableBinding) -> PlanChoice {
    let mut descriptor = PlanDescriptor::default();
    let mut usages = vec![Usage::default(); candidates.len()];
    let mut cost = BASE_COST;
    let mut bound_overrides = [false; 4];
    let mut distance_bound = false;
    // position 0 belongs to the root
    let mut next_position: c_int = 1;

    for (i, candidate) in candidates.iter().enumerate() {
        if !candidate.usable {
            continue;
        }
        let Some(column) = Column::from_index(candidate.column) else {
            continue;
        };
        match (column, candidate.op) {
            (Column::Root, ConstraintOp::Eq) if !descriptor.has_root() => {
                descriptor.0 |= PlanDescriptor::ROOT;
                usages[i] = Usage {
                    argv_index: 1,
                    omit: true,
                };
                cost /= 100.0;
            }
            (Column::Distance, ConstraintOp::Lt | ConstraintOp::Le | ConstraintOp::Eq)
                if !distance_bound =>
            {
                distance_bound = true;
                descriptor.set_nibble(PlanDescriptor::DISTANCE_SHIFT, next_position);
                if candidate.op == ConstraintOp::Lt {
                    descriptor.0 |= PlanDescriptor::DISTANCE_STRICT;
                }
                next_position += 1;
                usages[i] = Usage {
                    argv_index: next_position,
                    omit: false,
                };
                cost /= 5.0;
            }
            (column, ConstraintOp::Eq) => {
                let Some(key) = column.binding_key() else {
                    continue;
                };
                let slot = key as usize;
                if bound_overrides[slot] {
                    continue;
                }
                bound_overrides[slot] = true;
                descriptor.set_nibble(PlanDescriptor::shift_for(key), next_position);
                next_position += 1;
                usages[i] = Usage {
                    argv_index: next_position,
                    omit: true,
                };
                if key == BindingKey::TableName {
                    cost /= 5.0;
                }
            }
            _ => {}
        }
    }

    let incomplete = [
        BindingKey::TableName,
        BindingKey::FromColumn,
        BindingKey::ToColumn,
    ]
    .into_iter()
    .any(|key| declared.get(key).is_none() && !bound_overrides[key as usize]);

    if !descriptor.has_root() || incomplete {
        cost *= EMPTY_PLAN_PENALTY;
        // argv slots must stay contiguous from 1 or the host rejects the plan
        usages.iter_mut().for_each(|usage| *usage = Usage::default());
        descriptor = PlanDescriptor::default();
    }

    PlanChoice {
        descriptor,
        usages,
        cost,
    }
}
