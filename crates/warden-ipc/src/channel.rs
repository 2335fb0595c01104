//! Duplex channel over the native-messaging stream

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};
use warden_api::{BrowserEvent, Request, Response};
use warden_util::WardenError;

use crate::{read_frame, write_message, HostCall, HostReply, Inbound, IpcError, IpcResult, Outbound};

/// How long a host call waits for the extension's reply
pub const CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Message from the extension for the service loop
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelMessage {
    Event(BrowserEvent),
    Request(Request),
}

#[derive(Default)]
struct PendingCalls {
    closed: bool,
    waiters: HashMap<u64, oneshot::Sender<HostReply>>,
}

type Pending = Arc<Mutex<PendingCalls>>;

fn lock(pending: &Pending) -> MutexGuard<'_, PendingCalls> {
    pending.lock().unwrap_or_else(|e| e.into_inner())
}

/// Native-messaging channel.
///
/// A reader task decodes inbound frames, routing replies to their waiting
/// callers and everything else to the service loop. A writer task owns the
/// output stream. When the input ends, every outstanding call fails; a call
/// the extension never answers fails after [`CALL_TIMEOUT`].
pub struct NativeChannel {
    outbound_tx: mpsc::UnboundedSender<Outbound>,
    pending: Pending,
    next_call_id: AtomicU64,
}

impl NativeChannel {
    /// Spawn the reader and writer tasks.
    ///
    /// The receiver yields events and requests until the input stream ends.
    pub fn start<R, W>(
        reader: R,
        writer: W,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<ChannelMessage>)
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let pending = Pending::default();

        tokio::spawn(read_loop(reader, inbound_tx, pending.clone()));
        tokio::spawn(write_loop(writer, outbound_rx, pending.clone()));

        let channel = Arc::new(Self {
            outbound_tx,
            pending,
            next_call_id: AtomicU64::new(1),
        });
        (channel, inbound_rx)
    }

    /// Ask the extension to perform `call` and wait for its reply
    pub async fn call(&self, call: HostCall) -> IpcResult<HostReply> {
        let call_id = self.next_call_id.fetch_add(1, Ordering::Relaxed);
        let (reply_tx, reply_rx) = oneshot::channel();

        {
            let mut pending = lock(&self.pending);
            if pending.closed {
                return Err(IpcError::ConnectionClosed);
            }
            pending.waiters.insert(call_id, reply_tx);
        }

        if self.outbound_tx.send(Outbound::Call { call_id, call }).is_err() {
            lock(&self.pending).waiters.remove(&call_id);
            return Err(IpcError::ConnectionClosed);
        }

        match tokio::time::timeout(CALL_TIMEOUT, reply_rx).await {
            Ok(reply) => reply.map_err(|_| IpcError::ConnectionClosed),
            Err(_) => {
                lock(&self.pending).waiters.remove(&call_id);
                warn!(call_id, "Host call timed out");
                Err(IpcError::Timeout(CALL_TIMEOUT))
            }
        }
    }

    /// Queue the answer to an inbound request
    pub fn respond(&self, response: Response) -> IpcResult<()> {
        self.outbound_tx
            .send(Outbound::Response { response })
            .map_err(|_| IpcError::ConnectionClosed)
    }

    /// Whether the input stream has ended
    pub fn is_closed(&self) -> bool {
        lock(&self.pending).closed || self.outbound_tx.is_closed()
    }
}

async fn read_loop<R>(
    mut reader: R,
    inbound_tx: mpsc::UnboundedSender<ChannelMessage>,
    pending: Pending,
) where
    R: AsyncRead + Unpin,
{
    loop {
        let frame = match read_frame(&mut reader).await {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                info!("Browser closed the connection");
                break;
            }
            Err(e) => {
                error!(error = %e, "Failed to read frame");
                break;
            }
        };

        let message = match serde_json::from_slice::<Inbound>(&frame) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "Invalid message");
                continue;
            }
        };

        let forwarded = match message {
            Inbound::Event { event } => inbound_tx.send(ChannelMessage::Event(event)),
            Inbound::Request { request } => inbound_tx.send(ChannelMessage::Request(request)),
            Inbound::Reply { call_id, reply } => {
                match lock(&pending).waiters.remove(&call_id) {
                    Some(waiter) => {
                        let _ = waiter.send(reply);
                    }
                    None => debug!(call_id, "Reply for unknown call"),
                }
                Ok(())
            }
        };

        if forwarded.is_err() {
            debug!("Service loop gone, stopping reader");
            break;
        }
    }

    let mut pending = lock(&pending);
    pending.closed = true;
    pending.waiters.clear();
}

async fn write_loop<W>(mut writer: W, mut outbound_rx: mpsc::UnboundedReceiver<Outbound>, pending: Pending)
where
    W: AsyncWrite + Unpin,
{
    while let Some(message) = outbound_rx.recv().await {
        match write_message(&mut writer, &message).await {
            Ok(()) => {}
            Err(IpcError::Io(e)) => {
                error!(error = %e, "Write error");
                break;
            }
            Err(e) => {
                warn!(error = %e, "Dropping unsendable message");
                match message {
                    Outbound::Call { call_id, .. } => {
                        if let Some(waiter) = lock(&pending).waiters.remove(&call_id) {
                            let _ = waiter.send(HostReply::Failed {
                                message: e.to_string(),
                            });
                        }
                    }
                    Outbound::Response { response } => {
                        let fallback = Outbound::Response {
                            response: Response::error(
                                response.request_id,
                                WardenError::internal(format!("response not sent: {}", e)).into(),
                            ),
                        };
                        if let Err(e) = write_message(&mut writer, &fallback).await {
                            error!(error = %e, "Failed to send error response");
                            break;
                        }
                    }
                }
            }
        }
    }
}
