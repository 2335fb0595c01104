//! Limit evaluation
//!
//! Pure decision logic over a snapshot of the store. No I/O happens here;
//! the engine and enforcer load a [`PolicySnapshot`] and act on the result.

use std::collections::BTreeMap;
use warden_api::{BlockDirective, Notification, Settings, TimeInfo};
use warden_store::{BlockList, Limits, StoreKey, StoreRecord};
use warden_util::Domain;

/// Store keys a snapshot is built from
pub const POLICY_KEYS: &[StoreKey] = &[
    StoreKey::TimeData,
    StoreKey::Limits,
    StoreKey::BlockedSites,
    StoreKey::Settings,
];

/// Where a domain stands against its block list entry and daily budget
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Allowed,
    /// Past the warning threshold but still within budget
    Warning { minutes_left: u64 },
    Blocked(BlockDirective),
}

impl Outcome {
    pub fn is_blocked(&self) -> bool {
        matches!(self, Outcome::Blocked(_))
    }
}

/// An outcome plus the notification it warrants, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub outcome: Outcome,
    pub notification: Option<Notification>,
}

/// Block list, budgets and today's usage, read at one point in time
#[derive(Debug, Clone, Default)]
pub struct PolicySnapshot {
    pub blocked_sites: BlockList,
    pub limits: Limits,
    pub settings: Settings,
    /// Seconds spent per domain on the snapshot's day
    pub usage: BTreeMap<Domain, u64>,
}

impl PolicySnapshot {
    /// Build a snapshot for `day` from a record read with [`POLICY_KEYS`]
    pub fn from_record(record: &StoreRecord, day: &str) -> Self {
        Self {
            blocked_sites: record.blocked_sites(),
            limits: record.limits(),
            settings: record.settings(),
            usage: record.time_data().day(day),
        }
    }

    /// Whether any domain could possibly be blocked
    pub fn has_restrictions(&self) -> bool {
        !self.blocked_sites.is_empty() || !self.limits.is_empty()
    }

    pub fn seconds_spent(&self, domain: &Domain) -> u64 {
        self.usage.get(domain).copied().unwrap_or(0)
    }

    /// Block decision only: the block list wins over any budget
    pub fn block_decision(&self, domain: &Domain) -> Option<BlockDirective> {
        if self.blocked_sites.contains(domain) {
            return Some(BlockDirective::permanent(domain.clone()));
        }

        let limit_minutes = self.limits.get(domain)?;
        let limit = u64::from(limit_minutes) * 60;
        let spent = self.seconds_spent(domain);

        (spent >= limit).then(|| {
            BlockDirective::time_limit(
                domain.clone(),
                TimeInfo {
                    spent,
                    limit,
                    limit_minutes,
                },
            )
        })
    }

    /// Full evaluation, including the warning band and notifications
    pub fn evaluate(&self, domain: &Domain) -> Evaluation {
        if let Some(directive) = self.block_decision(domain) {
            let notification = match directive.time_info {
                Some(info) if self.settings.notifications => Some(Notification::LimitReached {
                    domain: domain.clone(),
                    limit_minutes: info.limit_minutes,
                }),
                _ => None,
            };
            return Evaluation {
                outcome: Outcome::Blocked(directive),
                notification,
            };
        }

        let allowed = Evaluation {
            outcome: Outcome::Allowed,
            notification: None,
        };

        let Some(limit_minutes) = self.limits.get(domain) else {
            return allowed;
        };
        let limit = u64::from(limit_minutes) * 60;
        let spent = self.seconds_spent(domain);

        if (spent as f64) / (limit as f64) < self.settings.warning_threshold {
            return allowed;
        }

        let minutes_left = limit.saturating_sub(spent) / 60;
        let notification = self
            .settings
            .notifications
            .then(|| Notification::TimeRemaining {
                domain: domain.clone(),
                minutes_left,
            });

        Evaluation {
            outcome: Outcome::Warning { minutes_left },
            notification,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_api::BlockReason;

    fn snapshot(spent: u64, limit_minutes: u32) -> PolicySnapshot {
        let domain = Domain::new("video.example");
        PolicySnapshot {
            limits: [(domain.clone(), limit_minutes)].into_iter().collect(),
            usage: [(domain, spent)].into_iter().collect(),
            ..Default::default()
        }
    }

    fn video() -> Domain {
        Domain::new("video.example")
    }

    #[test]
    fn test_below_threshold_is_allowed() {
        let eval = snapshot(539, 10).evaluate(&video());
        assert_eq!(eval.outcome, Outcome::Allowed);
        assert!(eval.notification.is_none());
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let eval = snapshot(540, 10).evaluate(&video());
        assert_eq!(eval.outcome, Outcome::Warning { minutes_left: 1 });
        assert_eq!(
            eval.notification,
            Some(Notification::TimeRemaining {
                domain: video(),
                minutes_left: 1,
            })
        );

        let eval = snapshot(590, 10).evaluate(&video());
        assert_eq!(eval.outcome, Outcome::Warning { minutes_left: 0 });
    }

    #[test]
    fn test_budget_exhausted_blocks() {
        let eval = snapshot(600, 10).evaluate(&video());
        let Outcome::Blocked(directive) = eval.outcome else {
            panic!("expected block");
        };
        assert_eq!(directive.reason, BlockReason::TimeLimitExceeded);
        assert_eq!(
            directive.time_info,
            Some(TimeInfo {
                spent: 600,
                limit: 600,
                limit_minutes: 10,
            })
        );
        assert_eq!(
            eval.notification,
            Some(Notification::LimitReached {
                domain: video(),
                limit_minutes: 10,
            })
        );
    }

    #[test]
    fn test_block_list_wins_over_budget() {
        let mut snap = snapshot(0, 10);
        snap.blocked_sites.insert(video());

        let eval = snap.evaluate(&video());
        assert_eq!(eval.outcome, Outcome::Blocked(BlockDirective::permanent(video())));
        assert!(eval.notification.is_none());
    }

    #[test]
    fn test_notifications_can_be_disabled() {
        let mut snap = snapshot(600, 10);
        snap.settings.notifications = false;
        let eval = snap.evaluate(&video());
        assert!(eval.outcome.is_blocked());
        assert!(eval.notification.is_none());

        let mut snap = snapshot(560, 10);
        snap.settings.notifications = false;
        let eval = snap.evaluate(&video());
        assert_eq!(eval.outcome, Outcome::Warning { minutes_left: 0 });
        assert!(eval.notification.is_none());
    }

    #[test]
    fn test_unlimited_domains() {
        let snap = snapshot(100_000, 0);
        assert_eq!(snap.evaluate(&video()).outcome, Outcome::Allowed);
        assert_eq!(
            snap.evaluate(&Domain::new("other.example")).outcome,
            Outcome::Allowed
        );
        assert!(snap.block_decision(&video()).is_none());
    }

    #[test]
    fn test_from_record_uses_requested_day() {
        let mut time_data = warden_store::TimeData::new();
        time_data.add("2025-03-01", &video(), 900);
        time_data.add("2025-03-02", &video(), 30);

        let record = StoreRecord {
            time_data: Some(time_data),
            limits: Some([(video(), 10)].into_iter().collect()),
            ..Default::default()
        };

        let snap = PolicySnapshot::from_record(&record, "2025-03-02");
        assert_eq!(snap.seconds_spent(&video()), 30);
        assert!(snap.has_restrictions());
        assert!(snap.block_decision(&video()).is_none());

        let snap = PolicySnapshot::from_record(&record, "2025-03-01");
        assert!(snap.block_decision(&video()).is_some());
    }

    #[test]
    fn test_empty_snapshot_has_no_restrictions() {
        assert!(!PolicySnapshot::default().has_restrictions());
    }
}
