//! Integration tests for wardend
//!
//! These drive `CoreEngine` end to end against a SQLite store and the mock
//! browser, the same way the service loop does.

use chrono::{DateTime, Local, TimeZone};
use std::sync::Arc;
use std::time::Duration;
use warden_api::{
    BlockReason, BrowserEvent, Command, LoadStatus, PageInfo, Request, ResponsePayload,
    ResponseResult,
};
use warden_config::ServiceConfig;
use warden_core::{CoreEngine, CoreEvent, ScheduledTask};
use warden_host_api::MockBrowser;
use warden_store::{BlockList, Limits, SqliteStore, Store, StoreKey, StoreRecord};
use warden_util::{day_key, Domain, MonotonicInstant, PageId, WindowId};

struct Fixture {
    store: Arc<SqliteStore>,
    browser: Arc<MockBrowser>,
    engine: CoreEngine,
    t0: MonotonicInstant,
    now: DateTime<Local>,
}

impl Fixture {
    async fn new() -> Self {
        Self::with_store(Arc::new(SqliteStore::in_memory().unwrap())).await
    }

    async fn with_store(store: Arc<SqliteStore>) -> Self {
        let browser = Arc::new(MockBrowser::new());
        let engine = CoreEngine::load(store.clone(), browser.clone(), &ServiceConfig::default())
            .await
            .unwrap();
        Self {
            store,
            browser,
            engine,
            t0: MonotonicInstant::now(),
            now: Local.with_ymd_and_hms(2025, 6, 15, 14, 0, 0).unwrap(),
        }
    }

    fn mono(&self, secs: u64) -> MonotonicInstant {
        self.t0 + Duration::from_secs(secs)
    }

    async fn activate(&mut self, page: &PageInfo, secs: u64) -> Vec<CoreEvent> {
        let (now, mono) = (self.now, self.mono(secs));
        self.engine
            .handle_browser_event(
                BrowserEvent::ActivePageChanged { page: page.clone() },
                now,
                mono,
            )
            .await
    }

    async fn tick_flush(&mut self, secs: u64) -> Vec<CoreEvent> {
        let (now, mono) = (self.now, self.mono(secs));
        self.engine
            .run_task(ScheduledTask::PeriodicFlush, now, mono)
            .await
    }

    async fn request(&mut self, command: Command, secs: u64) -> ResponseResult {
        let (now, mono) = (self.now, self.mono(secs));
        self.engine
            .handle_request(Request::new(1, command), now, mono)
            .await
            .result
    }

    async fn seconds(&self, domain: &str) -> u64 {
        self.seconds_on(&day_key(&self.now), domain).await
    }

    async fn seconds_on(&self, day: &str, domain: &str) -> u64 {
        let record = self.store.get(&[StoreKey::TimeData]).await.unwrap();
        record.time_data().seconds(day, &Domain::new(domain))
    }

    async fn write(&self, record: StoreRecord) {
        self.store.set(record).await.unwrap();
    }
}

fn page(id: i64, url: &str) -> PageInfo {
    PageInfo::new(PageId::new(id), WindowId::new(1), url).activated()
}

fn blocked(domains: &[&str]) -> StoreRecord {
    StoreRecord {
        blocked_sites: Some(domains.iter().map(|d| Domain::new(*d)).collect::<BlockList>()),
        ..Default::default()
    }
}

fn limited(domain: &str, minutes: u32) -> StoreRecord {
    StoreRecord {
        limits: Some([(Domain::new(domain), minutes)].into_iter().collect::<Limits>()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_totals_equal_sum_of_disjoint_windows() {
    let mut f = Fixture::new().await;
    let a = page(1, "https://a.com/");
    let b = page(2, "https://b.com/");

    f.activate(&a, 0).await;
    f.tick_flush(60).await;
    f.tick_flush(75).await;
    f.activate(&b, 100).await;
    f.tick_flush(160).await;
    f.activate(&a, 170).await;
    f.request(Command::SaveSession, 201).await;
    f.activate(&b, 230).await;

    assert_eq!(f.seconds("a.com").await, 100 + 60);
    assert_eq!(f.seconds("b.com").await, 70);
}

#[tokio::test]
async fn test_second_flush_adds_nothing() {
    let mut f = Fixture::new().await;
    f.activate(&page(1, "https://a.com/"), 0).await;

    f.tick_flush(42).await;
    let events = f.tick_flush(42).await;

    assert!(events.is_empty());
    assert_eq!(f.seconds("a.com").await, 42);
}

#[tokio::test]
async fn test_session_across_midnight_goes_to_flush_day() {
    let mut f = Fixture::new().await;
    f.now = Local.with_ymd_and_hms(2025, 6, 15, 23, 59, 30).unwrap();
    f.activate(&page(1, "https://a.com/"), 0).await;

    f.now = Local.with_ymd_and_hms(2025, 6, 16, 0, 0, 30).unwrap();
    f.tick_flush(60).await;

    assert_eq!(f.seconds_on("2025-06-15", "a.com").await, 0);
    assert_eq!(f.seconds_on("2025-06-16", "a.com").await, 60);
}

#[tokio::test]
async fn test_warning_then_block_at_budget() {
    let mut f = Fixture::new().await;
    f.write(limited("video.example", 10)).await;
    let video = page(1, "https://video.example/watch");
    f.browser.add_page(video.clone());

    f.activate(&video, 0).await;

    let events = f.tick_flush(539).await;
    assert!(!events.iter().any(|e| matches!(e, CoreEvent::Warning { .. })));
    assert!(f.browser.notifications().is_empty());

    let events = f.tick_flush(540).await;
    assert!(events.contains(&CoreEvent::Warning {
        domain: Domain::new("video.example"),
        minutes_left: 1,
    }));
    assert!(!f.browser.is_blocked(PageId::new(1)));

    f.tick_flush(600).await;
    assert!(f.browser.is_blocked(PageId::new(1)));

    let (_, directive) = f.browser.delivered().pop().unwrap();
    assert_eq!(directive.reason, BlockReason::TimeLimitExceeded);
    assert_eq!(directive.time_info.unwrap().limit_minutes, 10);

    let notifications = f.browser.notifications();
    assert_eq!(
        notifications.last().map(|n| n.message()),
        Some("You've reached your 10-minute daily limit for video.example".to_string())
    );
}

#[tokio::test]
async fn test_block_list_precedes_limits() {
    let mut f = Fixture::new().await;
    f.write(blocked(&["x.com"])).await;
    f.write(limited("x.com", 30)).await;

    let result = f
        .request(
            Command::CheckPage {
                url: "https://x.com/".into(),
            },
            0,
        )
        .await;
    let ResponseResult::Ok(ResponsePayload::PageStatus { block: Some(directive) }) = result else {
        panic!("expected a block directive");
    };
    assert_eq!(directive.reason, BlockReason::PermanentlyBlocked);
    assert!(directive.time_info.is_none());
}

#[tokio::test]
async fn test_unblock_reloads_each_page_once() {
    let mut f = Fixture::new().await;
    f.browser.add_page(page(1, "https://x.com/a"));
    f.browser.add_page(PageInfo::new(PageId::new(2), WindowId::new(2), "https://x.com/b"));
    f.browser.add_page(PageInfo::new(PageId::new(3), WindowId::new(2), "https://y.com/"));

    f.request(
        Command::SiteBlocked {
            domain: Some(Domain::new("x.com")),
        },
        0,
    )
    .await;
    assert!(f.browser.is_blocked(PageId::new(1)));
    assert!(f.browser.is_blocked(PageId::new(2)));
    assert!(!f.browser.is_blocked(PageId::new(3)));

    let result = f
        .request(
            Command::SiteUnblocked {
                domain: Some(Domain::new("x.com")),
            },
            1,
        )
        .await;

    assert!(matches!(result, ResponseResult::Ok(ResponsePayload::Success)));
    assert_eq!(f.browser.reloads(), vec![PageId::new(1), PageId::new(2)]);
    assert!(!f.browser.is_blocked(PageId::new(1)));

    let record = f.store.get(&[StoreKey::BlockedSites]).await.unwrap();
    assert!(record.blocked_sites().is_empty());

    // The reloaded pages stay up on the next sweep
    let (now, mono) = (f.now, f.mono(6));
    f.engine.run_task(ScheduledTask::PeriodicSweep, now, mono).await;
    assert!(!f.browser.is_blocked(PageId::new(1)));
}

#[tokio::test]
async fn test_block_added_by_request_reaches_new_pages() {
    let mut f = Fixture::new().await;

    let result = f
        .request(
            Command::SiteBlocked {
                domain: Some(Domain::new("News.Example")),
            },
            0,
        )
        .await;
    assert!(matches!(result, ResponseResult::Ok(ResponsePayload::Success)));

    f.browser.add_page(page(4, "https://news.example/today"));
    let (now, mono) = (f.now, f.mono(5));
    f.engine.run_task(ScheduledTask::PeriodicSweep, now, mono).await;

    assert!(f.browser.is_blocked(PageId::new(4)));
    let (_, directive) = f.browser.delivered().pop().unwrap();
    assert_eq!(directive.reason, BlockReason::PermanentlyBlocked);
}

#[tokio::test]
async fn test_limit_set_by_request_is_enforced() {
    let mut f = Fixture::new().await;
    let video = page(1, "https://video.example/");
    f.browser.add_page(video.clone());

    f.activate(&video, 0).await;
    f.tick_flush(90).await;

    // A budget below what was already spent blocks at once
    f.request(
        Command::SetLimit {
            domain: Domain::new("video.example"),
            minutes: 1,
        },
        95,
    )
    .await;
    assert!(f.browser.is_blocked(PageId::new(1)));

    let ResponseResult::Ok(ResponsePayload::Configuration { limits, .. }) =
        f.request(Command::GetConfiguration, 96).await
    else {
        panic!("expected the configuration");
    };
    assert_eq!(limits.get(&Domain::new("video.example")), Some(&1));
}

#[tokio::test]
async fn test_disable_stops_accrual_and_enable_sweeps() {
    let mut f = Fixture::new().await;
    let a = page(1, "https://a.com/");
    f.browser.add_page(a.clone());
    f.activate(&a, 0).await;

    f.request(Command::ToggleExtension { enabled: false }, 30).await;
    assert_eq!(f.seconds("a.com").await, 30);

    // Nothing accrues while disabled, whatever the browser does
    f.activate(&a, 40).await;
    f.tick_flush(400).await;
    assert_eq!(f.seconds("a.com").await, 30);

    // Configuration changes are kept while disabled, but nothing is enforced
    f.request(
        Command::SiteBlocked {
            domain: Some(Domain::new("a.com")),
        },
        450,
    )
    .await;
    assert!(!f.browser.is_blocked(PageId::new(1)));
    f.browser.clear_records();

    f.request(Command::ToggleExtension { enabled: true }, 500).await;
    assert!(f.browser.list_calls() > 0);
    assert!(f.browser.is_blocked(PageId::new(1)));
    assert_eq!(f.seconds("a.com").await, 30);
}

#[tokio::test]
async fn test_sweep_without_restrictions_lists_nothing() {
    let mut f = Fixture::new().await;
    f.browser.add_page(page(1, "https://a.com/"));

    let (now, mono) = (f.now, f.mono(5));
    let events = f
        .engine
        .run_task(ScheduledTask::PeriodicSweep, now, mono)
        .await;

    assert_eq!(
        events,
        vec![CoreEvent::SweepCompleted {
            pages_checked: 0,
            pages_blocked: 0,
        }]
    );
    assert_eq!(f.browser.list_calls(), 0);
}

#[tokio::test]
async fn test_page_without_listener_is_injected_once() {
    let mut f = Fixture::new().await;
    f.write(blocked(&["x.com"])).await;
    let late = PageInfo::new(PageId::new(9), WindowId::new(1), "https://x.com/");
    f.browser.add_page_without_listener(late.clone());

    let (now, mono) = (f.now, f.mono(0));
    f.engine
        .handle_browser_event(
            BrowserEvent::PageUpdated {
                page: late,
                status: Some(LoadStatus::Loading),
                url_changed: true,
            },
            now,
            mono,
        )
        .await;

    assert_eq!(f.browser.injections(), vec![PageId::new(9)]);
    assert!(f.browser.is_blocked(PageId::new(9)));
}

#[tokio::test]
async fn test_state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sitewarden.db");

    {
        let mut f = Fixture::with_store(Arc::new(SqliteStore::open(&path).unwrap())).await;
        f.activate(&page(1, "https://a.com/"), 0).await;
        f.request(Command::ToggleExtension { enabled: false }, 90).await;
    }

    let mut f = Fixture::with_store(Arc::new(SqliteStore::open(&path).unwrap())).await;
    assert!(!f.engine.is_enabled());
    assert_eq!(f.seconds("a.com").await, 90);

    let ResponseResult::Ok(ResponsePayload::TodayData { data }) =
        f.request(Command::GetTodayData, 0).await
    else {
        panic!("expected today's data");
    };
    assert_eq!(data.get(&Domain::new("a.com")), Some(&90));
}

#[tokio::test]
async fn test_daily_reset_clears_usage() {
    let mut f = Fixture::new().await;
    f.activate(&page(1, "https://a.com/"), 0).await;
    f.tick_flush(50).await;

    let (now, mono) = (f.now, f.mono(50));
    let events = f.engine.run_task(ScheduledTask::DailyReset, now, mono).await;

    assert_eq!(events, vec![CoreEvent::DailyReset]);
    assert_eq!(f.seconds("a.com").await, 0);
}
