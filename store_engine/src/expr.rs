//! Filter expression algebra
//!
//! Immutable value trees of comparisons and AND/OR groups, built with the
//! free functions below and compiled against a model's field/column map by
//! the query compiler. Trees are `Clone` and safe to reuse across calls.

use serde_json::Value;

/// Comparison operators available to filter expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cmp {
    Eq,        // =
    Ne,        // !=
    Gt,        // >
    Lt,        // <
    Gte,       // >=
    Lte,       // <=
    IsNull,    // IS NULL
    IsNotNull, // IS NOT NULL
}

impl Cmp {
    pub(crate) fn sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Gte => ">=",
            Self::Lte => "<=",
            Self::IsNull => "IS NULL",
            Self::IsNotNull => "IS NOT NULL",
        }
    }
}

/// Logical connective joining the children of an expression group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    And,
    Or,
}

impl Connective {
    pub(crate) fn sql(self) -> &'static str {
        match self {
            Self::And => " AND ",
            Self::Or => " OR ",
        }
    }
}

/// A field reference inside a comparison.
///
/// `Name` is a raw domain-field token resolved through the registry's
/// field/column map; `Column` is an already-resolved column token used as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    Name(String),
    Column(String),
}

/// Reference a column directly, bypassing field/column resolution
pub fn column(name: impl Into<String>) -> Field {
    Field::Column(name.into())
}

impl From<&str> for Field {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for Field {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

/// Filter expression: a single comparison or a connected group of children.
///
/// Grouping is explicit; the tree is the precedence. Sibling expressions at
/// the top level of a query join with AND in the order given.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Cmp {
        field: Field,
        op: Cmp,
        value: Option<Value>,
    },
    Group {
        connective: Connective,
        exprs: Vec<Expr>,
    },
}

fn cmp(field: impl Into<Field>, op: Cmp, value: Option<Value>) -> Expr {
    Expr::Cmp {
        field: field.into(),
        op,
        value,
    }
}

/// `field = value`
pub fn equal(field: impl Into<Field>, value: impl Into<Value>) -> Expr {
    cmp(field, Cmp::Eq, Some(value.into()))
}

/// `field != value`
pub fn not_equal(field: impl Into<Field>, value: impl Into<Value>) -> Expr {
    cmp(field, Cmp::Ne, Some(value.into()))
}

/// `field > value`
pub fn gt(field: impl Into<Field>, value: impl Into<Value>) -> Expr {
    cmp(field, Cmp::Gt, Some(value.into()))
}

/// `field < value`
pub fn lt(field: impl Into<Field>, value: impl Into<Value>) -> Expr {
    cmp(field, Cmp::Lt, Some(value.into()))
}

/// `field >= value`
pub fn gte(field: impl Into<Field>, value: impl Into<Value>) -> Expr {
    cmp(field, Cmp::Gte, Some(value.into()))
}

/// `field <= value`
pub fn lte(field: impl Into<Field>, value: impl Into<Value>) -> Expr {
    cmp(field, Cmp::Lte, Some(value.into()))
}

/// `field IS NULL`
pub fn is_null(field: impl Into<Field>) -> Expr {
    cmp(field, Cmp::IsNull, None)
}

/// `field IS NOT NULL`
pub fn is_not_null(field: impl Into<Field>) -> Expr {
    cmp(field, Cmp::IsNotNull, None)
}

/// Group expressions under AND
pub fn and(exprs: impl IntoIterator<Item = Expr>) -> Expr {
    Expr::Group {
        connective: Connective::And,
        exprs: exprs.into_iter().collect(),
    }
}

/// Group expressions under OR
pub fn or(exprs: impl IntoIterator<Item = Expr>) -> Expr {
    Expr::Group {
        connective: Connective::Or,
        exprs: exprs.into_iter().collect(),
    }
}
