use crate::storage::KeyValueStoreError;

/// Errors surfaced by a migration run.
///
/// Malformed persisted data never produces one of these; it is logged and read as absent.
#[crate::tally_error]
pub enum MigrationError {
    /// The operation is not allowed right now
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// The host store failed
    #[error(transparent)]
    KeyValueStore(#[from] KeyValueStoreError),

    /// JSON serialization failed
    #[error("JSON error: {message}")]
    JsonError {
        /// The error message from serde_json
        message: String,
    },
}

impl From<serde_json::Error> for MigrationError {
    fn from(e: serde_json::Error) -> Self {
        Self::JsonError {
            message: e.to_string(),
        }
    }
}

/// Result type for migration operations
pub type MigrationResult<T> = std::result::Result<T, MigrationError>;
