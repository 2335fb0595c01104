//! Native-messaging transport for wardend
//!
//! Provides:
//! - Length-prefixed JSON framing (u32, native byte order)
//! - Envelopes for browser events, UI requests and host calls
//! - A duplex channel correlating host calls with their replies
//! - `NativeBrowser`, the browser host backed by that channel

mod browser;
mod channel;
mod codec;
mod protocol;

pub use browser::*;
pub use channel::*;
pub use codec::*;
pub use protocol::*;

use thiserror::Error;

/// IPC errors
#[derive(Debug, Error)]
pub enum IpcError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("No reply within {0:?}")]
    Timeout(std::time::Duration),

    #[error("Frame of {0} bytes exceeds the size limit")]
    FrameTooLarge(usize),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),
}

pub type IpcResult<T> = Result<T, IpcError>;
