//! Periodic task scheduling

use chrono::{DateTime, Local};
use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use warden_config::ScheduleConfig;
use warden_util::until_next_midnight;

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Work the service loop should perform next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduledTask {
    /// Clear today's usage
    DailyReset,
    /// Credit the tracked session so far
    PeriodicFlush,
    /// Check every open page against the block state
    PeriodicSweep,
}

/// Drives the three recurring timers.
///
/// Ticks missed while the loop was busy are skipped, never replayed.
#[derive(Debug)]
pub struct Scheduler {
    daily_reset: Interval,
    flush: Interval,
    sweep: Interval,
}

impl Scheduler {
    /// Scheduler whose first daily reset fires `until_reset` from now
    pub fn new(config: ScheduleConfig, until_reset: Duration) -> Self {
        let start = Instant::now();
        Self {
            daily_reset: timer(start + until_reset, DAY),
            flush: timer(start + config.flush_interval, config.flush_interval),
            sweep: timer(start + config.sweep_interval, config.sweep_interval),
        }
    }

    /// Scheduler whose daily reset is aligned to the next local midnight
    pub fn starting_at(config: ScheduleConfig, now: &DateTime<Local>) -> Self {
        Self::new(config, until_next_midnight(now))
    }

    /// Wait for the next due task
    pub async fn next(&mut self) -> ScheduledTask {
        tokio::select! {
            biased;
            _ = self.daily_reset.tick() => ScheduledTask::DailyReset,
            _ = self.flush.tick() => ScheduledTask::PeriodicFlush,
            _ = self.sweep.tick() => ScheduledTask::PeriodicSweep,
        }
    }
}

fn timer(first: Instant, period: Duration) -> Interval {
    let mut interval = interval_at(first, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}
