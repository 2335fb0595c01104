//! Core events emitted by the engine

use warden_api::{BlockDirective, Notification};
use warden_util::{Domain, PageId, SessionId};

/// Events emitted by the core engine
#[derive(Debug, Clone, PartialEq)]
pub enum CoreEvent {
    /// A domain started accruing time
    SessionStarted {
        session_id: SessionId,
        domain: Domain,
    },

    /// The tracked session was closed without starting another
    SessionEnded {
        session_id: SessionId,
        domain: Domain,
    },

    /// Seconds were credited to a domain
    TimeRecorded {
        domain: Domain,
        day: String,
        seconds: u64,
        total: u64,
    },

    /// Elapsed time was dropped because tracking is turned off
    TimeDiscarded {
        domain: Domain,
        seconds: u64,
    },

    /// Warning threshold crossed
    Warning {
        domain: Domain,
        minutes_left: u64,
    },

    /// A notification was handed to the browser
    Notified(Notification),

    /// A page received a block directive
    PageBlocked {
        page_id: PageId,
        directive: BlockDirective,
    },

    /// A page should be blocked but could not be reached
    PageUnreachable {
        page_id: PageId,
        domain: Domain,
    },

    /// A page was reloaded after its domain was unblocked
    PageReloaded {
        page_id: PageId,
    },

    /// Periodic sweep finished
    SweepCompleted {
        pages_checked: usize,
        pages_blocked: usize,
    },

    /// Today's usage was cleared
    DailyReset,

    /// The kill switch changed
    EnabledChanged {
        enabled: bool,
    },
}
