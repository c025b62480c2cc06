//! The generic store
//!
//! `core` holds the public operation surface, `transaction` the
//! begin/commit/rollback protocol, and `binding` the per-mapping engine that
//! drives conversion, compiled filters, and relation cascades.

pub(crate) mod binding;
pub mod core;
pub mod transaction;

pub use self::core::Store;
