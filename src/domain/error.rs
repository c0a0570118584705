//! Domain errors

use thiserror::Error;

/// Failures reported by a [`UserStore`](crate::domain::UserStore).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Already exists: user with username={0}")]
    DuplicateUsername(String),

    #[error("Not found: user with username={0}")]
    NotFound(String),

    /// Backend error or timeout. The message is for logs only.
    #[error("Persistence: {0}")]
    Persistence(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
