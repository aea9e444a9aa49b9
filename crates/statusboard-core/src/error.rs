//! Error types for the lifecycle layer.

use statusboard_db::StoreError;

/// Errors returned by the lifecycle managers and the service registry.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The request was malformed; nothing was written.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A mutation targeted a record that does not exist.
    #[error("{kind} {id} not found")]
    NotFound {
        /// Record family, e.g. `incident`.
        kind: &'static str,
        /// The missing id.
        id: i64,
    },

    /// Storage failed; the owning transaction was rolled back.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// No pooled connection could be obtained.
    #[error("database pool error: {0}")]
    Pool(#[from] r2d2::Error),
}

impl CoreError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
