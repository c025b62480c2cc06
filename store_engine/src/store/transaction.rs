//! Transaction protocol
//!
//! One transaction per opening call; the handle lives in a shared cell so
//! transaction-scoped store clones (hooks included) execute against the same
//! transaction, while commit and rollback consume it exactly once. Dropping
//! every handle before commit rolls the transaction back, so cancelling a
//! future mid-transaction is safe.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::warn;

use super::core::{Backend, Store};
use crate::errors::StoreError;

impl Store {
    /// Run `f` with a transaction-scoped store. An error from `f` rolls the
    /// transaction back and propagates; success commits.
    ///
    /// Nesting is disallowed by design: calling this on a store that is
    /// already transaction-scoped returns
    /// [`StoreError::AlreadyInTransaction`] without doing any work.
    pub async fn transaction<F, Fut>(&self, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(Store) -> Fut,
        Fut: Future<Output = Result<(), StoreError>>,
    {
        let tx_store = self.begin().await?;
        match f(tx_store.clone()).await {
            Ok(()) => tx_store.commit().await,
            Err(err) => {
                tx_store.rollback_logged().await;
                Err(err)
            }
        }
    }

    pub(crate) async fn begin(&self) -> Result<Store, StoreError> {
        let Backend::Pool(pool) = &self.backend else {
            return Err(StoreError::AlreadyInTransaction);
        };

        let tx = pool
            .begin()
            .await
            .map_err(|e| StoreError::backend("beginning transaction", e))?;

        Ok(Store {
            registry: self.registry.clone(),
            backend: Backend::Tx(Arc::new(Mutex::new(Some(tx)))),
        })
    }

    pub(crate) async fn commit(&self) -> Result<(), StoreError> {
        let Backend::Tx(cell) = &self.backend else {
            return Err(StoreError::TransactionClosed);
        };

        let tx = cell
            .lock()
            .await
            .take()
            .ok_or(StoreError::TransactionClosed)?;
        tx.commit()
            .await
            .map_err(|e| StoreError::backend("committing transaction", e))
    }

    pub(crate) async fn rollback(&self) -> Result<(), StoreError> {
        let Backend::Tx(cell) = &self.backend else {
            return Err(StoreError::TransactionClosed);
        };

        let tx = cell
            .lock()
            .await
            .take()
            .ok_or(StoreError::TransactionClosed)?;
        tx.rollback()
            .await
            .map_err(|e| StoreError::backend("rolling back transaction", e))
    }

    // Rollback on the error path: the primary error is what propagates, so a
    // rollback failure is only logged.
    pub(crate) async fn rollback_logged(&self) {
        if let Err(err) = self.rollback().await {
            warn!(error = %err, "rollback after failed operation also failed");
        }
    }
}
