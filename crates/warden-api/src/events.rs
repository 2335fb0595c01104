//! Browser events forwarded by the extension shim

use serde::{Deserialize, Serialize};
use warden_util::WindowId;

use crate::PageInfo;

/// Page load progress as reported by the browser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    Loading,
    Complete,
}

/// Events from the browser that drive tracking and enforcement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BrowserEvent {
    /// The selected page of the focused window changed
    ActivePageChanged { page: PageInfo },

    /// A page started or finished loading, or changed address
    PageUpdated {
        page: PageInfo,
        status: Option<LoadStatus>,
        #[serde(default)]
        url_changed: bool,
    },

    /// A browser window gained focus
    WindowFocused { window_id: WindowId },

    /// No browser window has focus any more
    FocusLost,
}
