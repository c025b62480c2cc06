//! Store operation surface
//!
//! A `Store` pairs the immutable registry with a backend handle: either the
//! shared connection pool, or, for transaction-scoped stores, the open
//! transaction. Clones share the same backend; a transaction-scoped clone is
//! only ever passed down the call stack that opened it.

use std::any::Any;
use std::sync::Arc;

use serde_json::Value;
use sqlx::pool::PoolConnection;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use tokio::sync::{Mutex, MutexGuard};

use crate::errors::StoreError;
use crate::expr::{column, equal, Expr};
use crate::registry::Registry;
use crate::sql::statements::RowLock;

#[derive(Clone)]
pub struct Store {
    pub(crate) registry: Arc<Registry>,
    pub(crate) backend: Backend,
}

#[derive(Clone)]
pub(crate) enum Backend {
    Pool(PgPool),
    Tx(Arc<Mutex<Option<Transaction<'static, Postgres>>>>),
}

/// A live connection: pool-checked-out, or the guarded transaction handle.
/// Held for the duration of one operation's statement sequence.
pub(crate) enum StoreConn<'a> {
    Pool(PoolConnection<Postgres>),
    Tx(MutexGuard<'a, Option<Transaction<'static, Postgres>>>),
}

impl StoreConn<'_> {
    pub(crate) fn as_exec(&mut self) -> Result<&mut PgConnection, StoreError> {
        match self {
            Self::Pool(conn) => Ok(&mut **conn),
            Self::Tx(guard) => {
                let tx = guard.as_mut().ok_or(StoreError::TransactionClosed)?;
                Ok(&mut **tx)
            }
        }
    }
}

impl Store {
    pub fn new(pool: PgPool, registry: Registry) -> Self {
        Self {
            registry: Arc::new(registry),
            backend: Backend::Pool(pool),
        }
    }

    /// True for transaction-scoped stores (inside [`Store::transaction`],
    /// `save`, `delete`, or a hook).
    pub fn in_transaction(&self) -> bool {
        matches!(self.backend, Backend::Tx(_))
    }

    pub(crate) async fn conn(&self) -> Result<StoreConn<'_>, StoreError> {
        match &self.backend {
            Backend::Pool(pool) => {
                let conn = pool
                    .acquire()
                    .await
                    .map_err(|e| StoreError::backend("acquiring connection", e))?;
                Ok(StoreConn::Pool(conn))
            }
            Backend::Tx(cell) => Ok(StoreConn::Tx(cell.lock().await)),
        }
    }

    /// Fetch every row of the entity's table, relations eagerly loaded,
    /// appending to `out` in result order.
    pub async fn find_all<E>(&self, out: &mut Vec<E>) -> Result<(), StoreError>
    where
        E: Send + Sync + 'static,
    {
        self.find_by(out, &[]).await
    }

    /// Fetch rows matching the filter expressions, appending to `out` in
    /// result order. No sort is implied beyond the backend's default.
    pub async fn find_by<E>(&self, out: &mut Vec<E>, exprs: &[Expr]) -> Result<(), StoreError>
    where
        E: Send + Sync + 'static,
    {
        let port = self.registry.resolve::<E>()?;
        port.select_into(self, out as &mut (dyn Any + Send), exprs, None)
            .await
    }

    /// [`Store::find_by`] with rows locked `FOR UPDATE` on the primary table.
    pub async fn find_by_for_update<E>(
        &self,
        out: &mut Vec<E>,
        exprs: &[Expr],
        skip_locked: bool,
    ) -> Result<(), StoreError>
    where
        E: Send + Sync + 'static,
    {
        let port = self.registry.resolve::<E>()?;
        port.select_into(
            self,
            out as &mut (dyn Any + Send),
            exprs,
            Some(RowLock { skip_locked }),
        )
        .await
    }

    /// Fetch the first row matching the filters and overwrite `entity` in
    /// place. Zero rows is [`StoreError::NotFound`] and leaves `entity`
    /// untouched.
    pub async fn find_one_by<E>(&self, entity: &mut E, exprs: &[Expr]) -> Result<(), StoreError>
    where
        E: Send + Sync + 'static,
    {
        let port = self.registry.resolve::<E>()?;
        port.select_one_into(self, entity as &mut (dyn Any + Send), exprs, None)
            .await
    }

    /// [`Store::find_one_by`] with the row locked `FOR UPDATE`. With
    /// `skip_locked`, a row held by another transaction reads as zero rows,
    /// so a racing worker gets [`StoreError::NotFound`] instead of blocking.
    pub async fn find_one_by_for_update<E>(
        &self,
        entity: &mut E,
        exprs: &[Expr],
        skip_locked: bool,
    ) -> Result<(), StoreError>
    where
        E: Send + Sync + 'static,
    {
        let port = self.registry.resolve::<E>()?;
        port.select_one_into(
            self,
            entity as &mut (dyn Any + Send),
            exprs,
            Some(RowLock { skip_locked }),
        )
        .await
    }

    /// Fetch by primary key and overwrite `entity` in place.
    pub async fn find_by_id<E>(
        &self,
        entity: &mut E,
        id: impl Into<Value>,
    ) -> Result<(), StoreError>
    where
        E: Send + Sync + 'static,
    {
        let port = self.registry.resolve::<E>()?;
        let by_pk = equal(column(port.primary_key_column()), id.into());
        port.select_one_into(self, entity as &mut (dyn Any + Send), &[by_pk], None)
            .await
    }

    /// [`Store::find_by_id`] with the row locked `FOR UPDATE`.
    pub async fn find_by_id_for_update<E>(
        &self,
        entity: &mut E,
        id: impl Into<Value>,
        skip_locked: bool,
    ) -> Result<(), StoreError>
    where
        E: Send + Sync + 'static,
    {
        let port = self.registry.resolve::<E>()?;
        let by_pk = equal(column(port.primary_key_column()), id.into());
        port.select_one_into(
            self,
            entity as &mut (dyn Any + Send),
            &[by_pk],
            Some(RowLock { skip_locked }),
        )
        .await
    }

    /// Upsert the entity and its relations.
    ///
    /// Runs inside the caller's transaction when already in one, otherwise
    /// opens its own and commits on success. The parent row is written before
    /// any relation cascade; existing children are replaced, not merged.
    pub async fn save<E>(&self, entity: &E) -> Result<(), StoreError>
    where
        E: Send + Sync + 'static,
    {
        let port = self.registry.resolve::<E>()?;

        if self.in_transaction() {
            return port
                .save(self, entity as &(dyn Any + Send + Sync))
                .await;
        }

        let tx_store = self.begin().await?;
        match port
            .save(&tx_store, entity as &(dyn Any + Send + Sync))
            .await
        {
            Ok(()) => tx_store.commit().await,
            Err(err) => {
                tx_store.rollback_logged().await;
                Err(err)
            }
        }
    }

    /// Delete the entity's row and all of its relation children.
    ///
    /// Same transaction ownership rules as [`Store::save`].
    pub async fn delete<E>(&self, entity: &E) -> Result<(), StoreError>
    where
        E: Send + Sync + 'static,
    {
        let port = self.registry.resolve::<E>()?;

        if self.in_transaction() {
            return port
                .delete(self, entity as &(dyn Any + Send + Sync))
                .await;
        }

        let tx_store = self.begin().await?;
        match port
            .delete(&tx_store, entity as &(dyn Any + Send + Sync))
            .await
        {
            Ok(()) => tx_store.commit().await,
            Err(err) => {
                tx_store.rollback_logged().await;
                Err(err)
            }
        }
    }
}
