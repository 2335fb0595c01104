//! Shared types for the sitewarden protocol

use serde::{Deserialize, Serialize};
use warden_util::{Domain, PageId, WindowId};

/// Why a page is being blocked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockReason {
    /// Domain is on the block list
    PermanentlyBlocked,
    /// Domain has used up its daily time budget
    TimeLimitExceeded,
}

/// Time accounting attached to a time-limit block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeInfo {
    /// Seconds spent on the domain today
    pub spent: u64,
    /// Daily budget in seconds
    pub limit: u64,
    /// Daily budget in minutes, as configured
    pub limit_minutes: u32,
}

/// Instruction telling a page to replace its content with a block notice.
///
/// Once applied, the page stays blocked until it is reloaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDirective {
    pub domain: Domain,
    pub reason: BlockReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_info: Option<TimeInfo>,
}

impl BlockDirective {
    pub fn permanent(domain: Domain) -> Self {
        Self {
            domain,
            reason: BlockReason::PermanentlyBlocked,
            time_info: None,
        }
    }

    pub fn time_limit(domain: Domain, time_info: TimeInfo) -> Self {
        Self {
            domain,
            reason: BlockReason::TimeLimitExceeded,
            time_info: Some(time_info),
        }
    }
}

/// Messages delivered to the enforcement script inside a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum PageMessage {
    Block(BlockDirective),
}

/// User settings stored under the `settings` key.
///
/// Missing fields take their first-run values, so older records still load.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Show limit/warning notifications
    pub notifications: bool,
    /// Fraction of the daily budget at which a warning is shown, in [0, 1]
    pub warning_threshold: f64,
    /// Record time at all (blocking still applies when false)
    pub tracking_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            notifications: true,
            warning_threshold: 0.9,
            tracking_enabled: true,
        }
    }
}

/// Desktop notification content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    /// The daily budget for a domain has been used up
    LimitReached { domain: Domain, limit_minutes: u32 },
    /// The warning threshold was crossed
    TimeRemaining { domain: Domain, minutes_left: u64 },
}

impl Notification {
    pub fn title(&self) -> &'static str {
        match self {
            Notification::LimitReached { .. } => "Time Limit Reached",
            Notification::TimeRemaining { .. } => "Time Limit Warning",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Notification::LimitReached {
                domain,
                limit_minutes,
            } => format!(
                "You've reached your {}-minute daily limit for {}",
                limit_minutes, domain
            ),
            Notification::TimeRemaining {
                domain,
                minutes_left,
            } => format!("{} minutes remaining for {}", minutes_left, domain),
        }
    }

    /// Display priority (higher is more urgent)
    pub fn priority(&self) -> u8 {
        match self {
            Notification::LimitReached { .. } => 2,
            Notification::TimeRemaining { .. } => 1,
        }
    }

    pub fn domain(&self) -> &Domain {
        match self {
            Notification::LimitReached { domain, .. } | Notification::TimeRemaining { domain, .. } => {
                domain
            }
        }
    }
}

/// An open page as reported by the browser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page_id: PageId,
    pub window_id: WindowId,
    /// Absent while the browser has not committed an address yet
    #[serde(default)]
    pub url: Option<String>,
    /// Whether this is the selected page of its window
    #[serde(default)]
    pub active: bool,
}

impl PageInfo {
    pub fn new(page_id: PageId, window_id: WindowId, url: impl Into<String>) -> Self {
        Self {
            page_id,
            window_id,
            url: Some(url.into()),
            active: false,
        }
    }

    pub fn activated(mut self) -> Self {
        self.active = true;
        self
    }
}
