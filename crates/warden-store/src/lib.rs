//! Persistence layer for sitewarden
//!
//! Provides the shared key-value store read by the tracker, the evaluator,
//! the enforcer and the extension UI:
//! - Time records (day -> domain -> seconds)
//! - Daily limits and the permanent block list
//! - User settings and the global enable flag

mod record;
mod sqlite;
mod traits;

pub use record::*;
pub use sqlite::*;
pub use traits::*;

use thiserror::Error;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

impl From<StoreError> for warden_util::WardenError {
    fn from(e: StoreError) -> Self {
        warden_util::WardenError::store(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
