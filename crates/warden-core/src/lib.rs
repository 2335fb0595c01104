//! Session tracking and block-decision engine for sitewarden
//!
//! This crate is the heart of sitewarden, containing:
//! - Domain extraction (which addresses are trackable)
//! - Session state machine (Idle <-> Tracking) with exactly-once flushes
//! - Limit evaluation (allowed / warning / blocked)
//! - Block enforcement (targeted checks, sweeps, unblock reloads)
//! - The scheduler driving periodic flushes, sweeps and the daily reset

mod domain;
mod enforcer;
mod engine;
mod evaluator;
mod events;
mod scheduler;
mod session;

pub use domain::*;
pub use enforcer::*;
pub use engine::*;
pub use evaluator::*;
pub use events::*;
pub use scheduler::*;
pub use session::*;
