//! Convenience re-exports for common store-engine usage

// Expression constructors
pub use crate::expr::{
    and, column, equal, gt, gte, is_not_null, is_null, lt, lte, not_equal, or, Expr, Field,
};

// Model contract
pub use crate::model::{
    FetchRelated, Hooks, Model, Relation, RelationKind, TableMetadata, TableRow,
};

// Registry
pub use crate::registry::{FieldColumnMap, Mappings, Registry};

// Store and errors
pub use crate::errors::StoreError;
pub use crate::store::Store;

// Common external dependencies that are frequently used
pub use async_trait::async_trait;
pub use serde_json::json;
pub use sqlx::{FromRow, PgConnection, PgPool};
pub use uuid::Uuid;
