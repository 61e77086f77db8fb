use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backend could not be reached or rejected the operation.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// Human readable description of the failed operation.
        message: String,
        /// Backend-specific failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// Backend answered but the stored payload could not be interpreted.
    #[error("corrupted record `{key}`: {reason}")]
    Corrupted {
        /// Key of the offending record.
        key: String,
        /// What was wrong with it.
        reason: String,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Construct a corruption error for a record that failed validation after loading.
    pub fn corrupted(key: impl Into<String>, reason: impl Into<String>) -> Self {
        StorageError::Corrupted {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
