//! Browser host trait interfaces for sitewarden
//!
//! This crate defines the boundary between the tracking/enforcement core and
//! the browser. The core only ever talks to a [`BrowserHost`]; the native
//! messaging adapter and the test mock implement it.

mod mock;
mod traits;

pub use mock::*;
pub use traits::*;
