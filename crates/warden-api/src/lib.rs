//! Protocol types for sitewarden
//!
//! This crate defines the contract between the background service, the
//! enforcement script running in each page, and the extension UI:
//! - Commands (requests from the UI or a page) and responses
//! - Block directives pushed into pages
//! - Browser events forwarded by the extension shim
//! - Settings and notification content shared with the UI

mod commands;
mod events;
mod types;

pub use commands::*;
pub use events::*;
pub use types::*;

/// Current API version
pub const API_VERSION: u32 = 1;
