//! Model contract traits
//!
//! A model is the persistence-shaped counterpart of a domain entity: a flat
//! record carrying its own table metadata and declaring its relations as
//! data. The store never inspects entities directly; everything flows through
//! these traits.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgConnection;

use crate::store::Store;

/// Kind of a declared relation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    HasOne,
    HasMany,
    BelongsTo,
    /// Declared for completeness; the write path never persists these.
    ManyToMany,
}

/// One insertable row: a table, its column list, and the values in column
/// order. Values travel as JSON and are bound to typed parameters at
/// execution time.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub table: &'static str,
    pub columns: &'static [&'static str],
    pub values: Vec<Value>,
}

/// A model's declared relation, resolved against the model's current state.
///
/// `foreign_key` pairs each child-table column with the parent key value it
/// must match; children never need the parent's schema, only their own
/// foreign-key columns. `rows` holds the current child rows (empty when the
/// source entity had none).
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub name: &'static str,
    pub kind: RelationKind,
    pub table: &'static str,
    pub foreign_key: Vec<(&'static str, Value)>,
    pub rows: Vec<TableRow>,
}

/// Table metadata a model exposes about itself: names, the single
/// primary-key column, declared columns, and relation declarations.
pub trait TableMetadata {
    /// The table name in the database
    fn table_name() -> &'static str;

    /// Alias used to qualify column references in generated SQL
    fn table_alias() -> &'static str;

    /// The primary-key column name
    fn primary_key_column() -> &'static str;

    /// Declared columns, in the order `row()` produces values
    fn columns() -> &'static [&'static str];

    /// Current primary-key value
    fn primary_key_value(&self) -> Value;

    /// The model's own row
    fn row(&self) -> TableRow;

    /// Declared relations with their current child rows
    fn relations(&self) -> Vec<Relation>;
}

/// Two-way conversion between a model and its domain entity.
///
/// Both directions must be total for any value the other direction can
/// produce, with two allowances: `to_entity` may leave relation collections
/// empty for rows that had none, and `from_entity` skips `None`/empty
/// relation fields rather than emitting placeholder children. `from_entity`
/// derives child foreign-key values from the parent's primary key.
pub trait Model: TableMetadata + Default + Send + Sync {
    type Entity: Send + Sync + 'static;

    fn from_entity(&mut self, entity: &Self::Entity) -> anyhow::Result<()>;

    fn to_entity(&self) -> anyhow::Result<Self::Entity>;
}

/// Loads a fetched model's relation fields from the live connection.
///
/// The store invokes this for every fetched row, before entity conversion,
/// so every declared relation is populated eagerly.
#[async_trait]
pub trait FetchRelated {
    async fn fetch_related(&mut self, conn: &mut PgConnection) -> Result<(), sqlx::Error>;
}

/// Optional write hooks a model may expose.
///
/// Registered via [`crate::registry::Mappings::hooked_model`]; each hook runs
/// inside the active transaction, with a transaction-scoped store, before the
/// corresponding write statement executes. A hook error aborts the enclosing
/// transaction.
#[async_trait]
pub trait Hooks: Model {
    async fn before_save(&self, store: &Store, entity: &Self::Entity) -> anyhow::Result<()>;

    async fn before_delete(&self, store: &Store, entity: &Self::Entity) -> anyhow::Result<()>;
}
