//! Error types for the Storemap crate
//!
//! This module contains all error types that can be returned by Storemap operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoremapError {
    #[error("Database connection error: {0}")]
    DatabaseConnection(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Configuration(#[from] config::ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] store_engine::StoreError),
}
