//! Store Engine - generic entity persistence for Storemap
//!
//! This crate is the data-mapping core: a validated registry of entity/model
//! pairs, a composable filter-expression algebra with a SQL compiler, and a
//! generic store that drives conversion, relation cascades, and the
//! transaction/hook protocol over PostgreSQL.
//!
//! Domain entities stay plain: each one is persisted through a registered
//! model type implementing [`Model`] and [`TableMetadata`], and the store
//! keeps the entity and its declared relations consistent across
//! multi-statement writes.

pub mod errors;
pub mod expr;
pub mod model;
pub mod prelude;
pub mod registry;
pub mod sql;
pub mod store;

pub use errors::StoreError;
pub use expr::{
    and, column, equal, gt, gte, is_not_null, is_null, lt, lte, not_equal, or, Cmp, Connective,
    Expr, Field,
};
pub use model::{FetchRelated, Hooks, Model, Relation, RelationKind, TableMetadata, TableRow};
pub use registry::{FieldColumnMap, Mappings, Registry};
pub use sql::{compile, Predicate, RowLock};
pub use store::Store;
