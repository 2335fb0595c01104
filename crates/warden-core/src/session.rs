//! Tracking session state machine

use chrono::{DateTime, Local};
use warden_util::{Domain, MonotonicInstant, SessionId};

/// The domain currently accruing time
#[derive(Debug, Clone)]
pub struct ActiveSession {
    pub session_id: SessionId,

    /// Domain receiving the time
    pub domain: Domain,

    /// Wall-clock start time (for display/logging)
    pub started_at: DateTime<Local>,

    /// Monotonic time the clock was last armed (for accounting)
    pub armed_at_mono: MonotonicInstant,
}

impl ActiveSession {
    /// Whole seconds accrued since the clock was last armed
    pub fn accrued_seconds(&self, now_mono: MonotonicInstant) -> u64 {
        now_mono.duration_since(self.armed_at_mono).as_secs()
    }
}

/// Time to be credited to a domain, captured when a session is flushed.
///
/// The session clock is re-armed at the moment the slice is taken, so each
/// slice covers a disjoint window of wall time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushSlice {
    pub session_id: SessionId,
    pub domain: Domain,
    pub seconds: u64,
}

/// Idle / Tracking state machine.
///
/// All transitions are synchronous: the slice a transition returns is the
/// only record of the time it closed off, and the caller persists it.
#[derive(Debug, Default)]
pub struct SessionTracker {
    current: Option<ActiveSession>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&ActiveSession> {
        self.current.as_ref()
    }

    pub fn current_domain(&self) -> Option<&Domain> {
        self.current.as_ref().map(|s| &s.domain)
    }

    pub fn is_tracking(&self) -> bool {
        self.current.is_some()
    }

    /// Begin tracking `domain`, closing any previous session.
    ///
    /// Returns the slice of the session that was closed.
    pub fn start(
        &mut self,
        domain: Domain,
        now: DateTime<Local>,
        now_mono: MonotonicInstant,
    ) -> Option<FlushSlice> {
        let closed = self.stop(now_mono);

        self.current = Some(ActiveSession {
            session_id: SessionId::new(),
            domain,
            started_at: now,
            armed_at_mono: now_mono,
        });

        closed
    }

    /// Take the time accrued so far and re-arm the clock.
    ///
    /// Returns `None` when idle. A second call at the same instant yields a
    /// zero-second slice.
    pub fn flush(&mut self, now_mono: MonotonicInstant) -> Option<FlushSlice> {
        let session = self.current.as_mut()?;
        let seconds = session.accrued_seconds(now_mono);
        session.armed_at_mono = now_mono;

        Some(FlushSlice {
            session_id: session.session_id.clone(),
            domain: session.domain.clone(),
            seconds,
        })
    }

    /// Flush and return to idle
    pub fn stop(&mut self, now_mono: MonotonicInstant) -> Option<FlushSlice> {
        let slice = self.flush(now_mono);
        self.current = None;
        slice
    }
}
