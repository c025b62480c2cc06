use thiserror::Error;

/// Errors returned by store operations.
///
/// `NotFound` is a distinguished condition, not a generic failure: single-row
/// lookups return it for zero rows so callers can branch on existence with
/// [`StoreError::is_not_found`] instead of matching message text.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no mapping registered for entity type {0}")]
    NoMapping(&'static str),

    #[error("unable to resolve a column for field {0}")]
    UnresolvedField(String),

    #[error("entity value is not a {expected}")]
    Shape { expected: &'static str },

    #[error("not found")]
    NotFound,

    #[error("already in a transaction")]
    AlreadyInTransaction,

    #[error("transaction already committed or rolled back")]
    TransactionClosed,

    #[error("converting {model}: {source}")]
    Conversion {
        model: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("hook failed: {0}")]
    Hook(#[source] anyhow::Error),

    #[error("{context}: {source}")]
    Backend {
        context: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

impl StoreError {
    /// True when the error is the zero-row condition of a single-entity lookup.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    pub(crate) fn backend(context: &'static str, source: sqlx::Error) -> Self {
        Self::Backend { context, source }
    }

    pub(crate) fn conversion(model: &'static str, source: anyhow::Error) -> Self {
        Self::Conversion { model, source }
    }
}
