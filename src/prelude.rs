//! Convenience re-exports for common Storemap usage
//!
//! This prelude re-exports the most commonly used items from the storemap
//! workspace, making it easier to import everything you need with a single
//! use statement.
//!
//! # Example
//!
//! ```rust
//! use storemap::prelude::*;
//! ```

// Core Storemap components
pub use crate::core::Storemap;
pub use crate::errors::StoremapError;

// Re-export centralized config
pub use config::{AppConfig, ConfigError, DatabaseConfig};

// Re-export commonly used store-engine types for convenience
pub use store_engine::prelude::*;

// Re-export the engine crate itself
pub use store_engine;

// Common external dependencies
pub use anyhow;
pub use async_trait;
pub use sqlx;
pub use tokio;

// Commonly used sqlx types
pub use sqlx::{FromRow, PgPool, Postgres, Row, Transaction};
