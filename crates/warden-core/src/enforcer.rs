//! Block enforcement against open pages

use chrono::{DateTime, Local};
use std::sync::Arc;
use tracing::{debug, info, warn};
use warden_api::BlockDirective;
use warden_host_api::{BrowserHost, HostError};
use warden_store::{Store, StoreResult};
use warden_util::{day_key, Domain, PageId};

use crate::{CoreEvent, DomainExtractor, POLICY_KEYS, PolicySnapshot};

/// Pushes block directives to pages.
///
/// Every failure talking to the browser is logged and swallowed: a page that
/// cannot be reached is simply left alone until the next check.
pub struct BlockEnforcer {
    store: Arc<dyn Store>,
    host: Arc<dyn BrowserHost>,
    extractor: DomainExtractor,
}

impl BlockEnforcer {
    pub fn new(store: Arc<dyn Store>, host: Arc<dyn BrowserHost>, extractor: DomainExtractor) -> Self {
        Self {
            store,
            host,
            extractor,
        }
    }

    pub fn extractor(&self) -> &DomainExtractor {
        &self.extractor
    }

    /// Read the block list, budgets and usage for the day of `now`
    pub async fn snapshot(&self, now: DateTime<Local>) -> StoreResult<PolicySnapshot> {
        let record = self.store.get(POLICY_KEYS).await?;
        Ok(PolicySnapshot::from_record(&record, &day_key(&now)))
    }

    /// Block decision for a single domain; store failures allow the page
    pub async fn decision_for(&self, domain: &Domain, now: DateTime<Local>) -> Option<BlockDirective> {
        match self.snapshot(now).await {
            Ok(snapshot) => snapshot.block_decision(domain),
            Err(e) => {
                warn!(error = %e, domain = %domain, "Failed to read block state");
                None
            }
        }
    }

    /// Targeted check of one page
    pub async fn check_page(
        &self,
        page_id: PageId,
        domain: &Domain,
        now: DateTime<Local>,
    ) -> Vec<CoreEvent> {
        match self.decision_for(domain, now).await {
            Some(directive) => vec![self.deliver(page_id, &directive).await],
            None => Vec::new(),
        }
    }

    /// Check every open page
    pub async fn sweep(&self, now: DateTime<Local>) -> Vec<CoreEvent> {
        let snapshot = match self.snapshot(now).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "Sweep skipped: failed to read block state");
                return Vec::new();
            }
        };

        if !snapshot.has_restrictions() {
            return vec![CoreEvent::SweepCompleted {
                pages_checked: 0,
                pages_blocked: 0,
            }];
        }

        let pages = match self.host.list_pages().await {
            Ok(pages) => pages,
            Err(e) => {
                warn!(error = %e, "Sweep skipped: failed to list pages");
                return Vec::new();
            }
        };

        let mut events = Vec::new();
        let mut pages_checked = 0;
        let mut pages_blocked = 0;

        for page in &pages {
            let Some(domain) = page.url.as_deref().and_then(|u| self.extractor.extract(u)) else {
                continue;
            };
            pages_checked += 1;

            if let Some(directive) = snapshot.block_decision(&domain) {
                let event = self.deliver(page.page_id, &directive).await;
                if matches!(event, CoreEvent::PageBlocked { .. }) {
                    pages_blocked += 1;
                }
                events.push(event);
            }
        }

        debug!(pages_checked, pages_blocked, "Sweep completed");
        events.push(CoreEvent::SweepCompleted {
            pages_checked,
            pages_blocked,
        });
        events
    }

    /// Push `directive` to every open page of its domain.
    ///
    /// `focused` is included even when the page list does not report it yet.
    pub async fn block_domain(
        &self,
        directive: &BlockDirective,
        focused: Option<PageId>,
    ) -> Vec<CoreEvent> {
        let mut pages = self.pages_of(&directive.domain).await;
        if let Some(page_id) = focused
            && !pages.contains(&page_id)
        {
            pages.push(page_id);
        }

        let mut events = Vec::new();
        for page_id in pages {
            events.push(self.deliver(page_id, directive).await);
        }
        events
    }

    /// Reload every open page of `domain` so a lifted block takes effect
    pub async fn reload_domain(&self, domain: &Domain) -> Vec<CoreEvent> {
        let mut events = Vec::new();
        for page_id in self.pages_of(domain).await {
            match self.host.reload(page_id).await {
                Ok(()) => events.push(CoreEvent::PageReloaded { page_id }),
                Err(e) => debug!(page_id = %page_id, error = %e, "Reload failed"),
            }
        }

        info!(domain = %domain, reloaded = events.len(), "Unblocked domain reloaded");
        events
    }

    async fn pages_of(&self, domain: &Domain) -> Vec<PageId> {
        match self.host.list_pages().await {
            Ok(pages) => pages
                .into_iter()
                .filter(|p| {
                    p.url
                        .as_deref()
                        .and_then(|u| self.extractor.extract(u))
                        .is_some_and(|d| &d == domain)
                })
                .map(|p| p.page_id)
                .collect(),
            Err(e) => {
                warn!(error = %e, domain = %domain, "Failed to list pages");
                Vec::new()
            }
        }
    }

    /// Send a directive; when the page has no listener, attach one and retry once
    async fn deliver(&self, page_id: PageId, directive: &BlockDirective) -> CoreEvent {
        let delivered = match self.host.send_block(page_id, directive).await {
            Ok(()) => true,
            Err(HostError::NoReceiver) => {
                debug!(page_id = %page_id, "No enforcement script, injecting");
                match self.host.inject_enforcer(page_id).await {
                    Ok(()) => match self.host.send_block(page_id, directive).await {
                        Ok(()) => true,
                        Err(e) => {
                            debug!(page_id = %page_id, error = %e, "Retry after injection failed");
                            false
                        }
                    },
                    Err(e) => {
                        debug!(page_id = %page_id, error = %e, "Injection failed");
                        false
                    }
                }
            }
            Err(e) => {
                debug!(page_id = %page_id, error = %e, "Block delivery failed");
                false
            }
        };

        if delivered {
            info!(
                page_id = %page_id,
                domain = %directive.domain,
                reason = ?directive.reason,
                "Page blocked"
            );
            CoreEvent::PageBlocked {
                page_id,
                directive: directive.clone(),
            }
        } else {
            warn!(page_id = %page_id, domain = %directive.domain, "Page could not be blocked");
            CoreEvent::PageUnreachable {
                page_id,
                domain: directive.domain.clone(),
            }
        }
    }
}
