//! Browser host backed by the native-messaging channel

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use warden_api::{BlockDirective, Notification, PageInfo, PageMessage};
use warden_host_api::{BrowserHost, HostError, HostResult};
use warden_util::{PageId, WindowId};

use crate::{HostCall, IpcError, NativeChannel};

/// `BrowserHost` that forwards every operation to the extension shim
pub struct NativeBrowser {
    channel: Arc<NativeChannel>,
}

impl NativeBrowser {
    pub fn new(channel: Arc<NativeChannel>) -> Self {
        Self { channel }
    }

    async fn invoke(&self, call: HostCall) -> HostResult<Value> {
        let reply = self.channel.call(call).await.map_err(|e| match e {
            IpcError::ConnectionClosed => HostError::Disconnected,
            other => HostError::Protocol(other.to_string()),
        })?;
        reply.into_value()
    }

    async fn invoke_as<T: DeserializeOwned>(&self, call: HostCall) -> HostResult<T> {
        let value = self.invoke(call).await?;
        serde_json::from_value(value).map_err(|e| HostError::Protocol(e.to_string()))
    }
}

#[async_trait]
impl BrowserHost for NativeBrowser {
    async fn list_pages(&self) -> HostResult<Vec<PageInfo>> {
        self.invoke_as(HostCall::ListPages).await
    }

    async fn active_page(&self, window_id: WindowId) -> HostResult<Option<PageInfo>> {
        self.invoke_as(HostCall::ActivePage { window_id }).await
    }

    async fn send_block(&self, page_id: PageId, directive: &BlockDirective) -> HostResult<()> {
        self.invoke(HostCall::SendMessage {
            page_id,
            message: PageMessage::Block(directive.clone()),
        })
        .await
        .map(|_| ())
    }

    async fn inject_enforcer(&self, page_id: PageId) -> HostResult<()> {
        self.invoke(HostCall::InjectEnforcer { page_id })
            .await
            .map(|_| ())
    }

    async fn reload(&self, page_id: PageId) -> HostResult<()> {
        self.invoke(HostCall::Reload { page_id }).await.map(|_| ())
    }

    async fn notify(&self, notification: &Notification) -> HostResult<()> {
        self.invoke(HostCall::notify(notification)).await.map(|_| ())
    }

    fn is_healthy(&self) -> bool {
        !self.channel.is_closed()
    }
}
