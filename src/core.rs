//! Core Storemap functionality
//!
//! This module contains the main Storemap coordinator, which owns the
//! database connection pool and the registry-backed store.

use std::time::Duration;

use config::DatabaseConfig;
use sqlx::PgPool;
use store_engine::{Registry, Store};

use crate::errors::StoremapError;

/// Coordinator owning the connection pool and the generic store
pub struct Storemap {
    pool: PgPool,
    store: Store,
}

impl Storemap {
    /// Connect to PostgreSQL and build the store from a validated registry
    pub async fn connect(
        config: DatabaseConfig,
        registry: Registry,
    ) -> Result<Self, StoremapError> {
        let connection_string = config.connection_string();

        let mut pool_options = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds));

        // Set max lifetime if specified
        if config.max_lifetime_seconds > 0 {
            pool_options =
                pool_options.max_lifetime(Duration::from_secs(config.max_lifetime_seconds));
        }

        let pool = pool_options.connect(&connection_string).await?;

        Ok(Self::with_pool(pool, registry))
    }

    /// Build a Storemap over an existing pool
    pub fn with_pool(pool: PgPool, registry: Registry) -> Self {
        let store = Store::new(pool.clone(), registry);
        Self { pool, store }
    }

    /// The registry-backed store
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Get database pool reference
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database connection health
    pub async fn health_check(&self) -> Result<(), StoremapError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}
