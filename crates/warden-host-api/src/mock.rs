//! Mock browser host for testing

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use warden_api::{BlockDirective, Notification, PageInfo};
use warden_util::{PageId, WindowId};

use crate::{BrowserHost, HostError, HostResult};

#[derive(Debug, Default)]
struct MockState {
    pages: Vec<PageInfo>,
    /// Pages with an attached enforcement script
    listening: HashSet<PageId>,
    /// Pages that refuse injection
    protected: HashSet<PageId>,
    /// Pages whose content has been replaced by a block notice
    blocked: HashSet<PageId>,
    delivered: Vec<(PageId, BlockDirective)>,
    injections: Vec<PageId>,
    reloads: Vec<PageId>,
    notifications: Vec<Notification>,
}

/// In-memory browser used by unit and integration tests.
///
/// Pages start with a listening enforcement script unless added with
/// [`MockBrowser::add_page_without_listener`]. Delivering a block directive
/// puts the page into its terminal blocked state until it is reloaded.
#[derive(Debug, Default)]
pub struct MockBrowser {
    state: Mutex<MockState>,
    list_calls: AtomicUsize,
}

impl MockBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Open a page whose enforcement script is already attached
    pub fn add_page(&self, page: PageInfo) {
        let mut state = self.state();
        state.listening.insert(page.page_id);
        state.pages.push(page);
    }

    /// Open a page whose enforcement script has not attached yet
    pub fn add_page_without_listener(&self, page: PageInfo) {
        self.state().pages.push(page);
    }

    /// Open a protected page: no listener, and injection is refused
    pub fn add_protected_page(&self, page: PageInfo) {
        let mut state = self.state();
        state.protected.insert(page.page_id);
        state.pages.push(page);
    }

    pub fn close_page(&self, page_id: PageId) {
        let mut state = self.state();
        state.pages.retain(|p| p.page_id != page_id);
        state.listening.remove(&page_id);
        state.blocked.remove(&page_id);
    }

    /// Whether the page is currently showing a block notice
    pub fn is_blocked(&self, page_id: PageId) -> bool {
        self.state().blocked.contains(&page_id)
    }

    pub fn delivered(&self) -> Vec<(PageId, BlockDirective)> {
        self.state().delivered.clone()
    }

    pub fn injections(&self) -> Vec<PageId> {
        self.state().injections.clone()
    }

    pub fn reloads(&self) -> Vec<PageId> {
        self.state().reloads.clone()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.state().notifications.clone()
    }

    /// Number of times the page list was requested
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Forget recorded calls, keeping pages and their state
    pub fn clear_records(&self) {
        let mut state = self.state();
        state.delivered.clear();
        state.injections.clear();
        state.reloads.clear();
        state.notifications.clear();
        self.list_calls.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl BrowserHost for MockBrowser {
    async fn list_pages(&self) -> HostResult<Vec<PageInfo>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.state().pages.clone())
    }

    async fn active_page(&self, window_id: WindowId) -> HostResult<Option<PageInfo>> {
        Ok(self
            .state()
            .pages
            .iter()
            .find(|p| p.window_id == window_id && p.active)
            .cloned())
    }

    async fn send_block(&self, page_id: PageId, directive: &BlockDirective) -> HostResult<()> {
        let mut state = self.state();
        if !state.pages.iter().any(|p| p.page_id == page_id) {
            return Err(HostError::PageNotFound(page_id));
        }
        if !state.listening.contains(&page_id) {
            return Err(HostError::NoReceiver);
        }

        state.blocked.insert(page_id);
        state.delivered.push((page_id, directive.clone()));
        Ok(())
    }

    async fn inject_enforcer(&self, page_id: PageId) -> HostResult<()> {
        let mut state = self.state();
        if state.protected.contains(&page_id) {
            return Err(HostError::InjectionRefused(format!(
                "cannot script protected page {}",
                page_id
            )));
        }
        if !state.pages.iter().any(|p| p.page_id == page_id) {
            return Err(HostError::PageNotFound(page_id));
        }

        state.listening.insert(page_id);
        state.injections.push(page_id);
        Ok(())
    }

    async fn reload(&self, page_id: PageId) -> HostResult<()> {
        let mut state = self.state();
        if !state.pages.iter().any(|p| p.page_id == page_id) {
            return Err(HostError::PageNotFound(page_id));
        }

        state.blocked.remove(&page_id);
        state.reloads.push(page_id);
        Ok(())
    }

    async fn notify(&self, notification: &Notification) -> HostResult<()> {
        self.state().notifications.push(notification.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_util::Domain;

    fn page(id: i64) -> PageInfo {
        PageInfo::new(PageId::new(id), WindowId::new(1), "https://a.com/")
    }

    #[tokio::test]
    async fn block_requires_listener() {
        let browser = MockBrowser::new();
        browser.add_page_without_listener(page(1));
        let directive = BlockDirective::permanent(Domain::new("a.com"));

        let result = browser.send_block(PageId::new(1), &directive).await;
        assert!(matches!(result, Err(HostError::NoReceiver)));

        browser.inject_enforcer(PageId::new(1)).await.unwrap();
        browser.send_block(PageId::new(1), &directive).await.unwrap();
        assert!(browser.is_blocked(PageId::new(1)));
    }

    #[tokio::test]
    async fn protected_page_refuses_injection() {
        let browser = MockBrowser::new();
        browser.add_protected_page(page(2));

        let result = browser.inject_enforcer(PageId::new(2)).await;
        assert!(matches!(result, Err(HostError::InjectionRefused(_))));
        assert!(browser.injections().is_empty());
    }

    #[tokio::test]
    async fn reload_clears_block() {
        let browser = MockBrowser::new();
        browser.add_page(page(3));
        browser
            .send_block(PageId::new(3), &BlockDirective::permanent(Domain::new("a.com")))
            .await
            .unwrap();

        browser.reload(PageId::new(3)).await.unwrap();
        assert!(!browser.is_blocked(PageId::new(3)));
        assert_eq!(browser.reloads(), vec![PageId::new(3)]);
    }

    #[tokio::test]
    async fn active_page_by_window() {
        let browser = MockBrowser::new();
        browser.add_page(page(4));
        browser.add_page(page(5).activated());

        let active = browser.active_page(WindowId::new(1)).await.unwrap().unwrap();
        assert_eq!(active.page_id, PageId::new(5));
        assert!(browser.active_page(WindowId::new(9)).await.unwrap().is_none());
    }
}
