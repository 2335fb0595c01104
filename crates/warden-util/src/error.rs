//! Error types for sitewarden

use thiserror::Error;

/// Error returned to the extension when a request cannot be served
#[derive(Debug, Error)]
pub enum WardenError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("API version {0} not supported")]
    UnsupportedVersion(u32),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Host error: {0}")]
    HostError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl WardenError {
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::StoreError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, WardenError>;
