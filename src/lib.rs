//! # Storemap
//!
//! A generic data-mapping layer for PostgreSQL. Domain entities stay plain;
//! each one is persisted through a registered storage model, queried with
//! composable filter expressions, and written together with its declared
//! relations inside a single transaction.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use storemap::prelude::*;
//!
//! # fn registry() -> Registry { Mappings::new().build() }
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig::new(
//!         "localhost".to_string(), 5432, "storemap".to_string(),
//!         "postgres".to_string(), "password".to_string(),
//!         1, 5, 30, 600, 3600,
//!     );
//!
//!     // Mappings::new().model::<CustomerRecord>(..).build() in real code
//!     let storemap = Storemap::connect(config, registry()).await?;
//!
//!     let mut customers = Vec::new();
//!     storemap
//!         .store()
//!         .find_by(&mut customers, &[equal("GivenName", "John")])
//!         .await?;
//!     # let _: Vec<()> = customers;
//!
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod errors;
pub mod prelude;

// Re-export the main public types for convenience
pub use crate::core::Storemap;
pub use errors::StoremapError;

// Re-export centralized config
pub use config::{AppConfig, ConfigError, DatabaseConfig};

// Re-export the engine crate used by the public API
pub use store_engine;

// Re-export external dependencies used in public API
pub use async_trait;
pub use sqlx;
