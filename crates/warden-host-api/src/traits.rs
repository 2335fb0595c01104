//! Browser host traits

use async_trait::async_trait;
use thiserror::Error;
use warden_api::{BlockDirective, Notification, PageInfo};
use warden_util::{PageId, WindowId};

/// Errors from browser host operations
#[derive(Debug, Error)]
pub enum HostError {
    /// The page exists but no enforcement script is listening in it
    #[error("No receiver in page")]
    NoReceiver,

    /// The browser refused to inject into the page (internal/protected page)
    #[error("Injection refused: {0}")]
    InjectionRefused(String),

    #[error("Page not found: {0}")]
    PageNotFound(PageId),

    #[error("Browser disconnected")]
    Disconnected,

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type HostResult<T> = Result<T, HostError>;

/// Operations the core needs from the browser
#[async_trait]
pub trait BrowserHost: Send + Sync {
    /// Every open page in every window
    async fn list_pages(&self) -> HostResult<Vec<PageInfo>>;

    /// The selected page of a window, if any
    async fn active_page(&self, window_id: WindowId) -> HostResult<Option<PageInfo>>;

    /// Deliver a block directive to a page's enforcement script.
    ///
    /// Fails with [`HostError::NoReceiver`] when the script is not attached.
    async fn send_block(&self, page_id: PageId, directive: &BlockDirective) -> HostResult<()>;

    /// Attach the enforcement script to a page
    async fn inject_enforcer(&self, page_id: PageId) -> HostResult<()>;

    /// Reload a page
    async fn reload(&self, page_id: PageId) -> HostResult<()>;

    /// Show a desktop notification
    async fn notify(&self, notification: &Notification) -> HostResult<()>;

    /// Optional: check if the host connection is healthy
    fn is_healthy(&self) -> bool {
        true
    }
}
