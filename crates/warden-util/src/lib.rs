//! Shared utilities for sitewarden
//!
//! This crate provides:
//! - ID types (Domain, PageId, WindowId, SessionId)
//! - Time utilities (mock-able wall clock, monotonic time, day keys, midnight)
//! - Error types
//! - Default paths for config and data directories

mod error;
mod ids;
mod paths;
mod time;

pub use error::*;
pub use ids::*;
pub use paths::*;
pub use time::*;
