//! Query compiler
//!
//! Walks a filter expression tree and produces an alias-qualified,
//! `$n`-parameterized WHERE clause plus the parameter vector, preserving
//! AND/OR grouping exactly as written. Placeholder numbering starts at a
//! caller-chosen index so a predicate composes with statements that bind
//! parameters of their own.

use serde_json::Value;

use crate::errors::StoreError;
use crate::expr::{Cmp, Connective, Expr, Field};
use crate::registry::FieldColumnMap;

/// A compiled filter: the WHERE-clause body (no `WHERE` keyword) and its
/// bind parameters in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub clause: String,
    pub params: Vec<Value>,
}

/// Compile an expression list against a field/column map.
///
/// Sibling expressions at the top level join with AND in the order given.
/// An empty list compiles to an empty clause.
pub fn compile(
    exprs: &[Expr],
    fields: &FieldColumnMap,
    alias: &str,
    first_param: usize,
) -> Result<Predicate, StoreError> {
    let mut params = Vec::new();
    let mut next_param = first_param;
    let clause = render_siblings(
        exprs,
        Connective::And,
        fields,
        alias,
        &mut params,
        &mut next_param,
    )?;

    Ok(Predicate { clause, params })
}

fn render_siblings(
    exprs: &[Expr],
    connective: Connective,
    fields: &FieldColumnMap,
    alias: &str,
    params: &mut Vec<Value>,
    next_param: &mut usize,
) -> Result<String, StoreError> {
    let parts = exprs
        .iter()
        .map(|expr| render(expr, fields, alias, params, next_param))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(parts.join(connective.sql()))
}

fn render(
    expr: &Expr,
    fields: &FieldColumnMap,
    alias: &str,
    params: &mut Vec<Value>,
    next_param: &mut usize,
) -> Result<String, StoreError> {
    match expr {
        Expr::Group { connective, exprs } => {
            let body = render_siblings(exprs, *connective, fields, alias, params, next_param)?;
            Ok(format!("({})", body))
        }
        Expr::Cmp { field, op, value } => {
            let column = resolve(field, fields)?;

            match (op, value) {
                (Cmp::IsNull | Cmp::IsNotNull, _) => {
                    Ok(format!("{}.{} {}", alias, column, op.sql()))
                }
                (_, Some(value)) => {
                    params.push(value.clone());
                    let placeholder = *next_param;
                    *next_param += 1;
                    Ok(format!("{}.{} {} ${}", alias, column, op.sql(), placeholder))
                }
                // Hand-built comparison leaves without a value degrade the
                // same way the equivalent SQL would.
                (Cmp::Eq, None) => Ok(format!("{}.{} IS NULL", alias, column)),
                (Cmp::Ne, None) => Ok(format!("{}.{} IS NOT NULL", alias, column)),
                (_, None) => Ok("1=0".to_string()),
            }
        }
    }
}

fn resolve<'a>(field: &'a Field, fields: &'a FieldColumnMap) -> Result<&'a str, StoreError> {
    match field {
        Field::Column(column) => Ok(column),
        Field::Name(name) => fields
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| StoreError::UnresolvedField(name.clone())),
    }
}
