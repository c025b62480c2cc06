//! Statement builders
//!
//! Generates the fixed statement shapes the store executes: selects with
//! optional row locking, inserts and updates from a [`TableRow`], existence
//! checks, and primary-key / foreign-key scoped deletes.
//!
//! Null values render as literal `NULL` rather than binding: a bound null
//! must carry a concrete wire type, which JSON values do not have, and
//! `column = NULL` on the cascade-delete path matches nothing, which is the
//! no-op wanted for an absent child.

use serde_json::Value;

use crate::model::{TableMetadata, TableRow};

/// Row-locking mode for `..ForUpdate` reads.
///
/// `skip_locked` makes lock acquisition non-blocking: contested rows are
/// skipped instead of waited on, so a racing worker fails fast with zero
/// rows. Locking always targets the aliased primary table, never joined
/// relation tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowLock {
    pub skip_locked: bool,
}

pub(crate) fn select_sql<M: TableMetadata>(
    clause: &str,
    lock: Option<RowLock>,
    limit_one: bool,
) -> String {
    let alias = M::table_alias();
    let columns = M::columns()
        .iter()
        .map(|column| format!("{}.{}", alias, column))
        .collect::<Vec<_>>()
        .join(", ");

    let mut sql = format!("SELECT {} FROM {} AS {}", columns, M::table_name(), alias);
    if !clause.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(clause);
    }
    if limit_one {
        sql.push_str(" LIMIT 1");
    }
    if let Some(lock) = lock {
        sql.push_str(" FOR UPDATE OF ");
        sql.push_str(alias);
        if lock.skip_locked {
            sql.push_str(" SKIP LOCKED");
        }
    }

    sql
}

pub(crate) fn insert_sql(row: &TableRow) -> (String, Vec<Value>) {
    let mut params = Vec::new();
    let mut placeholders = Vec::new();
    for value in &row.values {
        if value.is_null() {
            placeholders.push("NULL".to_string());
        } else {
            params.push(value.clone());
            placeholders.push(format!("${}", params.len()));
        }
    }

    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        row.table,
        row.columns.join(", "),
        placeholders.join(", ")
    );

    (sql, params)
}

// SET covers every non-key column; the primary key binds last, in the WHERE.
pub(crate) fn update_sql<M: TableMetadata>(row: &TableRow, pk_value: Value) -> (String, Vec<Value>) {
    let pk = M::primary_key_column();
    let mut assignments = Vec::new();
    let mut params = Vec::new();
    for (column, value) in row.columns.iter().zip(&row.values) {
        if *column == pk {
            continue;
        }
        if value.is_null() {
            assignments.push(format!("{} = NULL", column));
        } else {
            params.push(value.clone());
            assignments.push(format!("{} = ${}", column, params.len()));
        }
    }

    params.push(pk_value);
    let sql = format!(
        "UPDATE {} SET {} WHERE {} = ${}",
        M::table_name(),
        assignments.join(", "),
        pk,
        params.len()
    );

    (sql, params)
}

pub(crate) fn exists_sql<M: TableMetadata>() -> String {
    format!(
        "SELECT EXISTS (SELECT 1 FROM {} WHERE {} = $1)",
        M::table_name(),
        M::primary_key_column()
    )
}

pub(crate) fn delete_by_pk_sql<M: TableMetadata>() -> String {
    format!(
        "DELETE FROM {} WHERE {} = $1",
        M::table_name(),
        M::primary_key_column()
    )
}

pub(crate) fn delete_related_sql(
    table: &str,
    foreign_key: &[(&'static str, Value)],
) -> (String, Vec<Value>) {
    let mut conditions = Vec::new();
    let mut params = Vec::new();
    for (column, value) in foreign_key {
        if value.is_null() {
            conditions.push(format!("{} = NULL", column));
        } else {
            params.push(value.clone());
            conditions.push(format!("{} = ${}", column, params.len()));
        }
    }

    let sql = format!("DELETE FROM {} WHERE {}", table, conditions.join(" AND "));
    (sql, params)
}
