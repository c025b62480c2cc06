//! Parameter binding
//!
//! Filter values and row values travel through the engine as JSON; this shim
//! binds them to typed PostgreSQL parameters at the last moment. Strings are
//! probed for RFC3339 timestamps and UUIDs so `timestamptz` and `uuid`
//! columns bind with their native types.

use serde_json::Value;
use sqlx::postgres::PgArguments;
use sqlx::query::{Query, QueryAs};
use sqlx::Postgres;

// Shared across the Query/QueryAs/QueryScalar shapes, which have no common
// trait for `bind`.
macro_rules! bind_value {
    ($query:expr, $value:expr) => {
        match $value {
            serde_json::Value::String(s) => {
                if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(&s) {
                    $query.bind(dt.with_timezone(&chrono::Utc))
                } else if let Ok(id) = uuid::Uuid::parse_str(&s) {
                    $query.bind(id)
                } else {
                    $query.bind(s)
                }
            }
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    if i >= i32::MIN as i64 && i <= i32::MAX as i64 {
                        $query.bind(i as i32)
                    } else {
                        $query.bind(i)
                    }
                } else if let Some(f) = n.as_f64() {
                    $query.bind(f)
                } else {
                    $query.bind(n.to_string())
                }
            }
            serde_json::Value::Bool(b) => $query.bind(b),
            serde_json::Value::Null => $query.bind(Option::<String>::None),
            other => $query.bind(other.to_string()),
        }
    };
}

pub(crate) use bind_value;

pub(crate) fn bind_all<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: Vec<Value>,
) -> Query<'q, Postgres, PgArguments> {
    for param in params {
        query = bind_value!(query, param);
    }
    query
}

pub(crate) fn bind_all_as<'q, M>(
    mut query: QueryAs<'q, Postgres, M, PgArguments>,
    params: Vec<Value>,
) -> QueryAs<'q, Postgres, M, PgArguments> {
    for param in params {
        query = bind_value!(query, param);
    }
    query
}
