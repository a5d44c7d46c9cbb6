use common::SessionId;
use thiserror::Error;

/// Errors that can occur when talking to a store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The session was saved by someone else since it was loaded.
    #[error(
        "Version conflict for session {session_id}: expected version {expected}, found {actual}"
    )]
    VersionConflict {
        session_id: SessionId,
        expected: u64,
        actual: u64,
    },

    /// The backing service could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
