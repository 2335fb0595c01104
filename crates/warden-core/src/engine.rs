//! Core tracking engine

use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use warden_api::{
    BlockDirective, BrowserEvent, Command, LoadStatus, PageInfo, Request, Response,
    ResponsePayload, API_VERSION,
};
use warden_config::ServiceConfig;
use warden_host_api::BrowserHost;
use warden_store::{BlockList, Limits, Store, StoreKey, StoreRecord, StoreResult, TimeData};
use warden_util::{day_key, Domain, MonotonicInstant, PageId, WardenError};

use crate::{
    BlockEnforcer, CoreEvent, DomainExtractor, FlushSlice, Outcome, ScheduledTask, SessionTracker,
};

/// The core tracking engine.
///
/// Owns the session state machine and the cached kill switch. Every handler
/// checks the kill switch first and does nothing while disabled, except the
/// daily reset, the commands that read or flip the switch itself, and the
/// store writes of configuration commands.
pub struct CoreEngine {
    store: Arc<dyn Store>,
    host: Arc<dyn BrowserHost>,
    enforcer: BlockEnforcer,
    tracker: SessionTracker,
    enabled: bool,
}

impl CoreEngine {
    /// Create a new engine, enabled and idle
    pub fn new(
        store: Arc<dyn Store>,
        host: Arc<dyn BrowserHost>,
        extractor: DomainExtractor,
    ) -> Self {
        let enforcer = BlockEnforcer::new(store.clone(), host.clone(), extractor);
        Self {
            store,
            host,
            enforcer,
            tracker: SessionTracker::new(),
            enabled: true,
        }
    }

    /// Write first-run defaults and pick up the persisted kill switch
    pub async fn load(
        store: Arc<dyn Store>,
        host: Arc<dyn BrowserHost>,
        config: &ServiceConfig,
    ) -> StoreResult<Self> {
        store.ensure_defaults(config.default_settings).await?;
        let record = store.get(&[StoreKey::ExtensionEnabled]).await?;

        let extractor = DomainExtractor::new(config.untracked_schemes.iter().cloned());
        let mut engine = Self::new(store, host, extractor);
        engine.enabled = record.extension_enabled();

        info!(enabled = engine.enabled, "Core engine initialized");
        Ok(engine)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn tracker(&self) -> &SessionTracker {
        &self.tracker
    }

    pub fn current_domain(&self) -> Option<&Domain> {
        self.tracker.current_domain()
    }

    /// React to a browser event
    pub async fn handle_browser_event(
        &mut self,
        event: BrowserEvent,
        now: DateTime<Local>,
        now_mono: MonotonicInstant,
    ) -> Vec<CoreEvent> {
        if !self.enabled {
            return Vec::new();
        }

        match event {
            BrowserEvent::ActivePageChanged { page } => {
                self.on_focus_or_navigation(&page, now, now_mono).await
            }

            BrowserEvent::PageUpdated {
                page,
                status,
                url_changed,
            } => {
                if status == Some(LoadStatus::Complete) && page.active {
                    self.on_focus_or_navigation(&page, now, now_mono).await
                } else if url_changed || status.is_some() {
                    self.check_page(&page, now).await
                } else {
                    Vec::new()
                }
            }

            BrowserEvent::WindowFocused { window_id } => {
                match self.host.active_page(window_id).await {
                    Ok(Some(page)) => self.on_focus_or_navigation(&page, now, now_mono).await,
                    Ok(None) => Vec::new(),
                    Err(e) => {
                        warn!(window_id = %window_id, error = %e, "Failed to query active page");
                        Vec::new()
                    }
                }
            }

            BrowserEvent::FocusLost => self.focus_lost(now, now_mono).await,
        }
    }

    /// A page became the one in front of the user: close the previous
    /// session, start tracking this page's domain, and evaluate it.
    pub async fn on_focus_or_navigation(
        &mut self,
        page: &PageInfo,
        now: DateTime<Local>,
        now_mono: MonotonicInstant,
    ) -> Vec<CoreEvent> {
        if !self.enabled {
            return Vec::new();
        }

        let domain = self.extract(page);
        let mut events = self.session_ended_event().into_iter().collect::<Vec<_>>();

        let closed = match &domain {
            Some(domain) => self.tracker.start(domain.clone(), now, now_mono),
            None => self.tracker.stop(now_mono),
        };

        if let Some(session) = self.tracker.current() {
            debug!(
                session_id = %session.session_id,
                domain = %session.domain,
                page_id = %page.page_id,
                "Tracking started"
            );
            events.push(CoreEvent::SessionStarted {
                session_id: session.session_id.clone(),
                domain: session.domain.clone(),
            });
        }

        if let Some(slice) = closed {
            // Staying on the same domain: the evaluation below covers it
            if domain.as_ref() == Some(&slice.domain) {
                events.extend(self.persist_slice(slice, now).await);
            } else {
                events.extend(self.record_slice(slice, now).await);
            }
        }

        if let Some(domain) = domain {
            events.extend(self.evaluate(&domain, Some(page.page_id), now).await);
        }

        events
    }

    /// The browser lost focus: credit the session and go idle
    pub async fn focus_lost(
        &mut self,
        now: DateTime<Local>,
        now_mono: MonotonicInstant,
    ) -> Vec<CoreEvent> {
        if !self.enabled {
            return Vec::new();
        }

        let mut events: Vec<_> = self.session_ended_event().into_iter().collect();
        if let Some(slice) = self.tracker.stop(now_mono) {
            events.extend(self.record_slice(slice, now).await);
        }
        events
    }

    /// Credit the time accrued by the current session so far.
    ///
    /// The slice is taken and the clock re-armed before anything is awaited,
    /// so overlapping flushes can never count the same interval twice.
    pub async fn flush(
        &mut self,
        now: DateTime<Local>,
        now_mono: MonotonicInstant,
    ) -> Vec<CoreEvent> {
        if !self.enabled {
            return Vec::new();
        }

        match self.tracker.flush(now_mono) {
            Some(slice) => self.record_slice(slice, now).await,
            None => Vec::new(),
        }
    }

    /// Check every open page
    pub async fn sweep(&self, now: DateTime<Local>) -> Vec<CoreEvent> {
        if !self.enabled {
            return Vec::new();
        }
        self.enforcer.sweep(now).await
    }

    /// Clear all recorded usage. Runs even while disabled.
    pub async fn daily_reset(&mut self) -> Vec<CoreEvent> {
        let result = self
            .store
            .set(StoreRecord {
                time_data: Some(TimeData::new()),
                ..Default::default()
            })
            .await;

        match result {
            Ok(()) => {
                info!("Daily usage reset");
                vec![CoreEvent::DailyReset]
            }
            Err(e) => {
                warn!(error = %e, "Daily reset failed");
                Vec::new()
            }
        }
    }

    /// Flip the kill switch.
    ///
    /// Disabling credits the running session first and then goes idle.
    /// Enabling sweeps right away so existing pages are checked.
    pub async fn set_enabled(
        &mut self,
        enabled: bool,
        now: DateTime<Local>,
        now_mono: MonotonicInstant,
    ) -> StoreResult<Vec<CoreEvent>> {
        let mut events = Vec::new();

        if !enabled {
            events.extend(self.focus_lost(now, now_mono).await);
            self.enabled = false;
        }

        self.store
            .set(StoreRecord {
                extension_enabled: Some(enabled),
                ..Default::default()
            })
            .await?;

        if enabled {
            self.enabled = true;
            events.extend(self.sweep(now).await);
        }

        info!(enabled, "Kill switch changed");
        events.push(CoreEvent::EnabledChanged { enabled });
        Ok(events)
    }

    /// A domain was removed from the block list: reload its pages
    pub async fn site_unblocked(&self, domain: &Domain) -> Vec<CoreEvent> {
        if !self.enabled {
            return Vec::new();
        }
        self.enforcer.reload_domain(domain).await
    }

    /// Block decision for an address, as asked by a freshly loaded page
    pub async fn check_url(&self, url: &str, now: DateTime<Local>) -> Option<BlockDirective> {
        if !self.enabled {
            return None;
        }
        let domain = self.enforcer.extractor().extract(url)?;
        self.enforcer.decision_for(&domain, now).await
    }

    /// Seconds per domain recorded for the day of `now`
    pub async fn today_data(&self, now: DateTime<Local>) -> StoreResult<BTreeMap<Domain, u64>> {
        let record = self.store.get(&[StoreKey::TimeData]).await?;
        Ok(record.time_data().day(&day_key(&now)))
    }

    /// Run a scheduler task
    pub async fn run_task(
        &mut self,
        task: ScheduledTask,
        now: DateTime<Local>,
        now_mono: MonotonicInstant,
    ) -> Vec<CoreEvent> {
        match task {
            ScheduledTask::DailyReset => self.daily_reset().await,
            ScheduledTask::PeriodicFlush => self.flush(now, now_mono).await,
            ScheduledTask::PeriodicSweep => self.sweep(now).await,
        }
    }

    /// Answer a request from the extension's user interface
    pub async fn handle_request(
        &mut self,
        request: Request,
        now: DateTime<Local>,
        now_mono: MonotonicInstant,
    ) -> Response {
        let request_id = request.request_id;

        if request.api_version != API_VERSION {
            return Response::error(
                request_id,
                WardenError::UnsupportedVersion(request.api_version).into(),
            );
        }

        match self.handle_command(request.command, now, now_mono).await {
            Ok(payload) => Response::success(request_id, payload),
            Err(e) => {
                debug!(request_id, error = %e, "Request failed");
                Response::error(request_id, e.into())
            }
        }
    }

    async fn handle_command(
        &mut self,
        command: Command,
        now: DateTime<Local>,
        now_mono: MonotonicInstant,
    ) -> warden_util::Result<ResponsePayload> {
        let events = match command {
            Command::SaveSession => self.flush(now, now_mono).await,

            Command::GetTodayData => {
                let data = self.today_data(now).await?;
                return Ok(ResponsePayload::TodayData { data });
            }

            Command::ToggleExtension { enabled } => {
                self.set_enabled(enabled, now, now_mono).await?
            }

            Command::SiteBlocked { domain } => {
                if let Some(domain) = domain {
                    self.edit_block_list(domain, true).await?;
                }
                self.sweep(now).await
            }

            Command::SiteUnblocked { domain: None } => {
                return Err(WardenError::invalid_request(
                    "siteUnblocked requires a domain",
                ));
            }
            Command::SiteUnblocked {
                domain: Some(domain),
            } => {
                self.edit_block_list(domain.clone(), false).await?;
                self.site_unblocked(&domain).await
            }

            Command::SetLimit { domain, minutes } => {
                info!(domain = %domain, minutes, "Daily limit set");
                self.edit_limits(move |limits| limits.set(domain, minutes))
                    .await?;
                self.sweep(now).await
            }

            Command::RemoveLimit { domain } => {
                info!(domain = %domain, "Daily limit removed");
                self.edit_limits(move |limits| {
                    limits.remove(&domain);
                })
                .await?;
                Vec::new()
            }

            Command::UpdateSettings { settings } => {
                if !(0.0..=1.0).contains(&settings.warning_threshold) {
                    return Err(WardenError::invalid_request(format!(
                        "warningThreshold must be between 0 and 1, got {}",
                        settings.warning_threshold
                    )));
                }
                self.store
                    .set(StoreRecord {
                        settings: Some(settings),
                        ..Default::default()
                    })
                    .await?;
                info!(settings = ?settings, "Settings updated");
                Vec::new()
            }

            Command::GetConfiguration => {
                let record = self
                    .store
                    .get(&[StoreKey::BlockedSites, StoreKey::Limits, StoreKey::Settings])
                    .await?;
                return Ok(ResponsePayload::Configuration {
                    blocked_sites: record.blocked_sites().iter().cloned().collect(),
                    limits: record
                        .limits()
                        .iter()
                        .map(|(domain, minutes)| (domain.clone(), minutes))
                        .collect(),
                    settings: record.settings(),
                });
            }

            Command::CheckPage { url } => {
                let block = self.check_url(&url, now).await;
                return Ok(ResponsePayload::PageStatus { block });
            }

            Command::GetStatus => {
                return Ok(ResponsePayload::Status {
                    enabled: self.enabled,
                    tracking: self.current_domain().cloned(),
                });
            }
        };

        for event in &events {
            debug!(event = ?event, "Command produced event");
        }
        Ok(ResponsePayload::Success)
    }

    fn extract(&self, page: &PageInfo) -> Option<Domain> {
        page.url
            .as_deref()
            .and_then(|url| self.enforcer.extractor().extract(url))
    }

    fn session_ended_event(&self) -> Option<CoreEvent> {
        self.tracker.current().map(|session| {
            debug!(
                session_id = %session.session_id,
                domain = %session.domain,
                started_at = %session.started_at,
                "Tracking ended"
            );
            CoreEvent::SessionEnded {
                session_id: session.session_id.clone(),
                domain: session.domain.clone(),
            }
        })
    }

    /// Add or remove a block-list entry in one store transaction
    async fn edit_block_list(&self, domain: Domain, blocked: bool) -> StoreResult<()> {
        info!(domain = %domain, blocked, "Block list changed");
        self.store
            .update(
                &[StoreKey::BlockedSites],
                Box::new(move |record| {
                    let sites = record.blocked_sites.get_or_insert_with(BlockList::default);
                    if blocked {
                        sites.insert(domain);
                    } else {
                        sites.remove(&domain);
                    }
                }),
            )
            .await
            .map(|_| ())
    }

    async fn edit_limits<F>(&self, edit: F) -> StoreResult<()>
    where
        F: FnOnce(&mut Limits) + Send + 'static,
    {
        self.store
            .update(
                &[StoreKey::Limits],
                Box::new(move |record| edit(record.limits.get_or_insert_with(Limits::default))),
            )
            .await
            .map(|_| ())
    }

    /// Targeted block check of a page that is not (yet) in front
    async fn check_page(&self, page: &PageInfo, now: DateTime<Local>) -> Vec<CoreEvent> {
        match self.extract(page) {
            Some(domain) => self.enforcer.check_page(page.page_id, &domain, now).await,
            None => Vec::new(),
        }
    }

    /// Persist a slice, then evaluate its domain if time was credited
    async fn record_slice(&self, slice: FlushSlice, now: DateTime<Local>) -> Vec<CoreEvent> {
        let domain = slice.domain.clone();
        let mut events = self.persist_slice(slice, now).await;
        if events
            .iter()
            .any(|e| matches!(e, CoreEvent::TimeRecorded { .. }))
        {
            events.extend(self.evaluate(&domain, None, now).await);
        }
        events
    }

    /// Credit a slice in one store transaction
    async fn persist_slice(&self, slice: FlushSlice, now: DateTime<Local>) -> Vec<CoreEvent> {
        let FlushSlice {
            session_id,
            domain,
            seconds,
        } = slice;

        if seconds == 0 {
            return Vec::new();
        }

        let day = day_key(&now);
        let (key, target) = (day.clone(), domain.clone());
        let result = self
            .store
            .update(
                &[StoreKey::TimeData, StoreKey::Settings],
                Box::new(move |record| {
                    if record.settings().tracking_enabled {
                        record
                            .time_data
                            .get_or_insert_with(TimeData::default)
                            .add(&key, &target, seconds);
                    }
                }),
            )
            .await;

        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!(session_id = %session_id, domain = %domain, seconds, error = %e, "Failed to record time");
                return Vec::new();
            }
        };

        if !record.settings().tracking_enabled {
            debug!(domain = %domain, seconds, "Tracking disabled, time discarded");
            return vec![CoreEvent::TimeDiscarded { domain, seconds }];
        }

        let total = record
            .time_data
            .as_ref()
            .map(|t| t.seconds(&day, &domain))
            .unwrap_or(seconds);
        debug!(session_id = %session_id, domain = %domain, seconds, total, "Time recorded");

        vec![CoreEvent::TimeRecorded {
            domain,
            day,
            seconds,
            total,
        }]
    }

    /// Evaluate a domain: warn, notify and block every page showing it.
    ///
    /// `focused` is the page that just came to the front, if any.
    async fn evaluate(
        &self,
        domain: &Domain,
        focused: Option<PageId>,
        now: DateTime<Local>,
    ) -> Vec<CoreEvent> {
        let snapshot = match self.enforcer.snapshot(now).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(domain = %domain, error = %e, "Failed to read limits");
                return Vec::new();
            }
        };

        let evaluation = snapshot.evaluate(domain);
        let mut events = Vec::new();

        if let Outcome::Warning { minutes_left } = evaluation.outcome {
            info!(domain = %domain, minutes_left, "Approaching daily limit");
            events.push(CoreEvent::Warning {
                domain: domain.clone(),
                minutes_left,
            });
        }

        if let Some(notification) = evaluation.notification {
            match self.host.notify(&notification).await {
                Ok(()) => events.push(CoreEvent::Notified(notification)),
                Err(e) => warn!(domain = %domain, error = %e, "Failed to show notification"),
            }
        }

        if let Outcome::Blocked(directive) = evaluation.outcome {
            info!(domain = %domain, reason = ?directive.reason, "Domain blocked");
            events.extend(self.enforcer.block_domain(&directive, focused).await);
        }

        events
    }
}
