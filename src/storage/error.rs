use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("write abandoned before it started")]
    Abandoned,

    #[error("storage task failed: {0}")]
    Task(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

/// Failure of the persistence stage.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("persist timed out after {0:?}")]
    Timeout(Duration),

    #[error("persist failed: {0}")]
    Storage(#[from] StoreError),
}
