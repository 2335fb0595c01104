//! Envelopes exchanged with the extension shim

use serde::{Deserialize, Serialize};
use serde_json::Value;
use warden_api::{BrowserEvent, Notification, PageMessage, Request, Response};
use warden_host_api::HostError;
use warden_util::{PageId, WindowId};

/// Messages from the extension shim to the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Inbound {
    /// A browser event forwarded by the shim
    Event { event: BrowserEvent },
    /// A request from the popup or a page
    Request { request: Request },
    /// The outcome of an earlier host call
    Reply { call_id: u64, reply: HostReply },
}

/// Messages from the host to the extension shim
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outbound {
    /// Ask the shim to perform a browser operation
    Call { call_id: u64, call: HostCall },
    /// Answer to an inbound request
    Response { response: Response },
}

/// Browser operations the shim performs on the host's behalf
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum HostCall {
    ListPages,
    ActivePage { window_id: WindowId },
    /// Deliver a message to the enforcement script of a page
    SendMessage { page_id: PageId, message: PageMessage },
    InjectEnforcer { page_id: PageId },
    Reload { page_id: PageId },
    Notify {
        title: String,
        message: String,
        priority: u8,
    },
}

impl HostCall {
    pub fn notify(notification: &Notification) -> Self {
        HostCall::Notify {
            title: notification.title().to_string(),
            message: notification.message(),
            priority: notification.priority(),
        }
    }
}

/// Outcome of a host call as reported by the shim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HostReply {
    Ok {
        #[serde(default)]
        value: Value,
    },
    /// No script in the page is listening for messages
    NoReceiver,
    /// The browser refused to script the page
    InjectionRefused { message: String },
    PageNotFound { page_id: PageId },
    Failed { message: String },
}

impl HostReply {
    /// The reply's value, or the error it stands for
    pub fn into_value(self) -> Result<Value, HostError> {
        match self {
            HostReply::Ok { value } => Ok(value),
            HostReply::NoReceiver => Err(HostError::NoReceiver),
            HostReply::InjectionRefused { message } => Err(HostError::InjectionRefused(message)),
            HostReply::PageNotFound { page_id } => Err(HostError::PageNotFound(page_id)),
            HostReply::Failed { message } => Err(HostError::Internal(message)),
        }
    }
}
