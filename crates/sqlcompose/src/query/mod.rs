//! Filter expression tree.
//!
//! A [`QueryGroup`] is a boolean tree of [`QueryField`] leaves (column,
//! operation, parameter) combined with AND/OR and an optional NOT. The tree
//! owns the parameter de-duplication rule ([`QueryGroup::fix`]) and renders
//! itself into a parenthesized WHERE-clause fragment.
//!
//! # Example
//! ```
//! use sqlcompose::{DbSetting, QueryField, QueryGroup};
//!
//! let mut group = QueryGroup::new(vec![
//!     QueryField::gt("Age", 10),
//!     QueryField::lt("Age", 20),
//! ]);
//! group.fix();
//! assert_eq!(
//!     group.get_string(0, &DbSetting::sql_server()),
//!     "( [Age] > @Age_0 AND [Age] < @Age_1 )"
//! );
//! ```

mod field;
mod group;

pub use field::{BoundParameter, QueryField, QueryFieldKey};
pub use group::{QueryGroup, QueryGroupBuilder, QueryGroupKey};

use serde::{Deserialize, Serialize};

/// Comparison applied by a [`QueryField`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Equal,
    NotEqual,
    LessThan,
    GreaterThan,
    LessThanOrEqual,
    GreaterThanOrEqual,
    Like,
    NotLike,
    Between,
    NotBetween,
    In,
    NotIn,
}

impl Operation {
    /// SQL operator text.
    pub const fn as_str(self) -> &'static str {
        match self {
            Operation::Equal => "=",
            Operation::NotEqual => "<>",
            Operation::LessThan => "<",
            Operation::GreaterThan => ">",
            Operation::LessThanOrEqual => "<=",
            Operation::GreaterThanOrEqual => ">=",
            Operation::Like => "LIKE",
            Operation::NotLike => "NOT LIKE",
            Operation::Between => "BETWEEN",
            Operation::NotBetween => "NOT BETWEEN",
            Operation::In => "IN",
            Operation::NotIn => "NOT IN",
        }
    }

    /// `Between` / `NotBetween`.
    pub const fn is_range(self) -> bool {
        matches!(self, Operation::Between | Operation::NotBetween)
    }

    /// `In` / `NotIn`.
    pub const fn is_list(self) -> bool {
        matches!(self, Operation::In | Operation::NotIn)
    }

    /// `Equal` / `NotEqual`.
    pub const fn is_equality(self) -> bool {
        matches!(self, Operation::Equal | Operation::NotEqual)
    }
}

/// How sibling conditions are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Conjunction {
    #[default]
    And,
    Or,
}

impl Conjunction {
    /// SQL keyword.
    pub const fn as_str(self) -> &'static str {
        match self {
            Conjunction::And => "AND",
            Conjunction::Or => "OR",
        }
    }
}
