//! Per-mapping engine
//!
//! Each registered entity/model pair is held behind the type-erased
//! [`EntityPort`]; the monomorphic [`Binding`] behind it drives conversion,
//! compiled filters, relation loading, and the write-path cascade. The store
//! hands entities across the erased boundary as `Any` and the binding
//! downcasts back to the concrete types it was registered with.

use std::any::{type_name, Any};
use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::PgConnection;
use tracing::debug;

use crate::errors::StoreError;
use crate::expr::Expr;
use crate::model::{FetchRelated, Hooks, Model, RelationKind, TableMetadata, TableRow};
use crate::registry::FieldColumnMap;
use crate::sql::bind::{bind_all, bind_all_as, bind_value};
use crate::sql::predicate::compile;
use crate::sql::statements::{
    delete_by_pk_sql, delete_related_sql, exists_sql, insert_sql, select_sql, update_sql, RowLock,
};
use crate::store::Store;

/// Type-erased face of one registered mapping.
#[async_trait]
pub(crate) trait EntityPort: Send + Sync {
    fn entity_type(&self) -> &'static str;
    fn model_type(&self) -> &'static str;
    fn declared_columns(&self) -> &'static [&'static str];
    fn primary_key_column(&self) -> &'static str;
    fn field_columns(&self) -> &FieldColumnMap;

    /// Fetch matching rows and append converted entities to `out`, which
    /// must be the `Vec` of the registered entity type.
    async fn select_into(
        &self,
        store: &Store,
        out: &mut (dyn Any + Send),
        exprs: &[Expr],
        lock: Option<RowLock>,
    ) -> Result<(), StoreError>;

    /// Fetch the first matching row and overwrite `out`, which must be the
    /// registered entity type. Zero rows is `NotFound` and leaves `out`
    /// untouched.
    async fn select_one_into(
        &self,
        store: &Store,
        out: &mut (dyn Any + Send),
        exprs: &[Expr],
        lock: Option<RowLock>,
    ) -> Result<(), StoreError>;

    /// Upsert the entity and replace its relation children. `store` must be
    /// transaction-scoped; the caller owns commit/rollback.
    async fn save(
        &self,
        store: &Store,
        entity: &(dyn Any + Send + Sync),
    ) -> Result<(), StoreError>;

    /// Delete the entity's row and its relation children. Same contract as
    /// `save`.
    async fn delete(
        &self,
        store: &Store,
        entity: &(dyn Any + Send + Sync),
    ) -> Result<(), StoreError>;
}

/// Hook capability, decided at registration: models registered through
/// `hooked_model` dispatch to their `Hooks` impl, everything else is inert.
#[async_trait]
pub(crate) trait HookDispatch<M: Model>: Send + Sync {
    async fn before_save(
        &self,
        model: &M,
        store: &Store,
        entity: &M::Entity,
    ) -> anyhow::Result<()>;

    async fn before_delete(
        &self,
        model: &M,
        store: &Store,
        entity: &M::Entity,
    ) -> anyhow::Result<()>;
}

struct HookedDispatch;

#[async_trait]
impl<M: Hooks> HookDispatch<M> for HookedDispatch {
    async fn before_save(
        &self,
        model: &M,
        store: &Store,
        entity: &M::Entity,
    ) -> anyhow::Result<()> {
        model.before_save(store, entity).await
    }

    async fn before_delete(
        &self,
        model: &M,
        store: &Store,
        entity: &M::Entity,
    ) -> anyhow::Result<()> {
        model.before_delete(store, entity).await
    }
}

pub(crate) struct Binding<M: Model> {
    field_columns: FieldColumnMap,
    hooks: Option<Box<dyn HookDispatch<M>>>,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> Binding<M> {
    pub(crate) fn new(field_columns: FieldColumnMap) -> Self {
        Self {
            field_columns,
            hooks: None,
            _model: PhantomData,
        }
    }

    pub(crate) fn new_hooked(field_columns: FieldColumnMap) -> Self
    where
        M: Hooks,
    {
        Self {
            field_columns,
            hooks: Some(Box::new(HookedDispatch)),
            _model: PhantomData,
        }
    }
}

impl<M> Binding<M>
where
    M: Model + FetchRelated + for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> + Unpin + 'static,
{
    async fn fetch(
        &self,
        store: &Store,
        exprs: &[Expr],
        lock: Option<RowLock>,
        limit_one: bool,
    ) -> Result<Vec<M>, StoreError> {
        let predicate = compile(exprs, &self.field_columns, M::table_alias(), 1)?;
        let sql = select_sql::<M>(&predicate.clause, lock, limit_one);
        debug!(sql = %sql, "selecting rows");

        let mut conn = store.conn().await?;
        let exec = conn.as_exec()?;

        let mut models = bind_all_as(sqlx::query_as::<_, M>(&sql), predicate.params)
            .fetch_all(&mut *exec)
            .await
            .map_err(|e| StoreError::backend("selecting rows", e))?;

        for model in &mut models {
            model
                .fetch_related(&mut *exec)
                .await
                .map_err(|e| StoreError::backend("loading relations", e))?;
        }

        Ok(models)
    }

    fn convert(&self, model: &M) -> Result<M::Entity, StoreError> {
        model
            .to_entity()
            .map_err(|e| StoreError::conversion(type_name::<M>(), e))
    }

    async fn exists(&self, model: &M, exec: &mut PgConnection) -> Result<bool, StoreError> {
        let sql = exists_sql::<M>();
        let query = sqlx::query_scalar::<_, bool>(&sql);
        let query = bind_value!(query, model.primary_key_value());
        query
            .fetch_one(&mut *exec)
            .await
            .map_err(|e| StoreError::backend("checking row existence", e))
    }

    async fn insert_row(
        &self,
        row: &TableRow,
        context: &'static str,
        exec: &mut PgConnection,
    ) -> Result<(), StoreError> {
        let (sql, params) = insert_sql(row);
        debug!(sql = %sql, "inserting row");
        bind_all(sqlx::query(&sql), params)
            .execute(&mut *exec)
            .await
            .map_err(|e| StoreError::backend(context, e))?;
        Ok(())
    }

    async fn update_row(&self, model: &M, exec: &mut PgConnection) -> Result<(), StoreError> {
        let (sql, params) = update_sql::<M>(&model.row(), model.primary_key_value());
        debug!(sql = %sql, "updating row");

        bind_all(sqlx::query(&sql), params)
            .execute(&mut *exec)
            .await
            .map_err(|e| StoreError::backend("updating model", e))?;
        Ok(())
    }

    async fn insert_related(&self, model: &M, exec: &mut PgConnection) -> Result<(), StoreError> {
        for relation in model.relations() {
            // Many-to-many persistence is unsupported.
            if relation.kind == RelationKind::ManyToMany {
                continue;
            }
            if relation.rows.is_empty() {
                continue;
            }

            debug!(
                relation = relation.name,
                rows = relation.rows.len(),
                "cascading insert"
            );
            for row in &relation.rows {
                self.insert_row(row, "inserting relation rows", exec).await?;
            }
        }

        Ok(())
    }

    // Runs for every declared relation, children present or not; a no-op
    // delete is not an error. A relation with no foreign-key pairs is
    // skipped: an unscoped DELETE is never the right reading of "delete this
    // parent's children".
    async fn delete_related(&self, model: &M, exec: &mut PgConnection) -> Result<(), StoreError> {
        for relation in model.relations() {
            if relation.foreign_key.is_empty() {
                continue;
            }

            let (sql, params) = delete_related_sql(relation.table, &relation.foreign_key);
            debug!(sql = %sql, relation = relation.name, "cascading delete");

            bind_all(sqlx::query(&sql), params)
                .execute(&mut *exec)
                .await
                .map_err(|e| StoreError::backend("deleting relation rows", e))?;
        }

        Ok(())
    }
}

#[async_trait]
impl<M> EntityPort for Binding<M>
where
    M: Model + FetchRelated + for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> + Unpin + 'static,
{
    fn entity_type(&self) -> &'static str {
        type_name::<M::Entity>()
    }

    fn model_type(&self) -> &'static str {
        type_name::<M>()
    }

    fn declared_columns(&self) -> &'static [&'static str] {
        M::columns()
    }

    fn primary_key_column(&self) -> &'static str {
        M::primary_key_column()
    }

    fn field_columns(&self) -> &FieldColumnMap {
        &self.field_columns
    }

    async fn select_into(
        &self,
        store: &Store,
        out: &mut (dyn Any + Send),
        exprs: &[Expr],
        lock: Option<RowLock>,
    ) -> Result<(), StoreError> {
        let out = out
            .downcast_mut::<Vec<M::Entity>>()
            .ok_or(StoreError::Shape {
                expected: type_name::<Vec<M::Entity>>(),
            })?;

        let models = self.fetch(store, exprs, lock, false).await?;
        for model in &models {
            out.push(self.convert(model)?);
        }

        Ok(())
    }

    async fn select_one_into(
        &self,
        store: &Store,
        out: &mut (dyn Any + Send),
        exprs: &[Expr],
        lock: Option<RowLock>,
    ) -> Result<(), StoreError> {
        let out = out.downcast_mut::<M::Entity>().ok_or(StoreError::Shape {
            expected: type_name::<M::Entity>(),
        })?;

        let mut models = self.fetch(store, exprs, lock, true).await?;
        let Some(model) = models.pop() else {
            return Err(StoreError::NotFound);
        };

        *out = self.convert(&model)?;
        Ok(())
    }

    async fn save(
        &self,
        store: &Store,
        entity: &(dyn Any + Send + Sync),
    ) -> Result<(), StoreError> {
        let entity = entity
            .downcast_ref::<M::Entity>()
            .ok_or(StoreError::Shape {
                expected: type_name::<M::Entity>(),
            })?;

        let mut model = M::default();
        model
            .from_entity(entity)
            .map_err(|e| StoreError::conversion(type_name::<M>(), e))?;

        // The hook runs before the connection is held so it can issue its own
        // store operations against the same transaction.
        if let Some(hooks) = &self.hooks {
            hooks
                .before_save(&model, store, entity)
                .await
                .map_err(StoreError::Hook)?;
        }

        let mut conn = store.conn().await?;
        let exec = conn.as_exec()?;

        if !self.exists(&model, exec).await? {
            self.insert_row(&model.row(), "inserting model", exec).await?;
            self.insert_related(&model, exec).await?;
        } else {
            self.update_row(&model, exec).await?;
            self.delete_related(&model, exec).await?;
            self.insert_related(&model, exec).await?;
        }

        Ok(())
    }

    async fn delete(
        &self,
        store: &Store,
        entity: &(dyn Any + Send + Sync),
    ) -> Result<(), StoreError> {
        let entity = entity
            .downcast_ref::<M::Entity>()
            .ok_or(StoreError::Shape {
                expected: type_name::<M::Entity>(),
            })?;

        let mut model = M::default();
        model
            .from_entity(entity)
            .map_err(|e| StoreError::conversion(type_name::<M>(), e))?;

        if let Some(hooks) = &self.hooks {
            hooks
                .before_delete(&model, store, entity)
                .await
                .map_err(StoreError::Hook)?;
        }

        let mut conn = store.conn().await?;
        let exec = conn.as_exec()?;

        let sql = delete_by_pk_sql::<M>();
        debug!(sql = %sql, "deleting row");
        let query = sqlx::query(&sql);
        let query = bind_value!(query, model.primary_key_value());
        query
            .execute(&mut *exec)
            .await
            .map_err(|e| StoreError::backend("deleting model", e))?;

        self.delete_related(&model, exec).await?;
        Ok(())
    }
}
