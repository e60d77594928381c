//! Error types for the scheduling and storage core

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the scheduler and the review store
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid quality {0:?}: expected an integer between 0 and 5")]
    InvalidQuality(String),

    #[error("Storage unavailable at {path:?}: {source}")]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Storage error: {0}")]
    Storage(rusqlite::Error),

    #[error("Invalid timestamp {0:?}")]
    InvalidTimestamp(String),
}

impl Error {
    /// Wrap an open/create failure for the database at `path`
    pub(crate) fn unavailable<E>(path: impl Into<PathBuf>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::StorageUnavailable {
            path: path.into(),
            source: Box::new(source),
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(code, ref message)
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                let detail = message.clone().unwrap_or_else(|| code.to_string());
                Error::ConstraintViolation(detail)
            }
            other => Error::Storage(other),
        }
    }
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;
