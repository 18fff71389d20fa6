// ── Per-device connection ──
//
// One websocket per connected device. A spawned listener task owns the
// read half and appends every frame to the device's `MessageLog`; the
// foreground shares the write half to issue commands. Replies are matched
// back to their command by `requestId`; an export is also answered by an
// uncorrelated `EVENT_EXPORT_READY`.

use std::sync::Arc;
use std::time::Duration;

use anova_api::wire::{OutboundFrame, event};
use anova_api::{Credential, DeviceSocket, SocketEvent, SocketReader, SocketWriter};
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::{Mutex, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::config::SessionConfig;
use crate::error::CoreError;
use crate::model::{Device, Message};
use crate::stream::MessageLog;

type PendingReplies = DashMap<String, PendingReply>;

struct PendingReply {
    reply_tx: oneshot::Sender<Arc<Message>>,
    export: bool,
}

/// The request an `EVENT_EXPORT_READY` without a `requestId` answers.
fn export_waiter(pending: &PendingReplies) -> Option<String> {
    pending
        .iter()
        .find(|entry| entry.value().export)
        .map(|entry| entry.key().clone())
}

/// Whole seconds, rounded up so a short wait never reports `0s`.
fn timeout_secs(wait: Duration) -> u64 {
    wait.as_secs() + u64::from(wait.subsec_nanos() > 0)
}

// ── ConnectionState ──────────────────────────────────────────────────

/// Lifecycle of a device connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ConnectionState {
    Disconnected,
    /// Socket open, nothing received yet.
    Connected,
    /// At least one message received.
    Streaming,
}

// ── CommandReceipt ───────────────────────────────────────────────────

/// Handle for a sent command.
///
/// Dropping the receipt is fine; the reply still lands in the message log.
pub struct CommandReceipt {
    request_id: String,
    reply_rx: oneshot::Receiver<Arc<Message>>,
    pending: Arc<PendingReplies>,
    timeout: Duration,
}

impl CommandReceipt {
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Wait for the correlated reply using the session's default timeout.
    pub async fn reply(self) -> Result<Arc<Message>, CoreError> {
        let timeout = self.timeout;
        self.reply_within(timeout).await
    }

    /// Wait at most `wait` for the device's reply to this command.
    pub async fn reply_within(self, wait: Duration) -> Result<Arc<Message>, CoreError> {
        let Self {
            request_id,
            reply_rx,
            pending,
            ..
        } = self;
        match tokio::time::timeout(wait, reply_rx).await {
            Ok(Ok(message)) => Ok(message),
            Ok(Err(_)) => Err(CoreError::ConnectionError {
                reason: "connection closed before the device replied".into(),
            }),
            Err(_) => {
                pending.remove(&request_id);
                Err(CoreError::Timeout {
                    timeout_secs: timeout_secs(wait),
                })
            }
        }
    }
}

impl std::fmt::Debug for CommandReceipt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandReceipt")
            .field("request_id", &self.request_id)
            .finish_non_exhaustive()
    }
}

// ── Connection ───────────────────────────────────────────────────────

pub(crate) struct Connection {
    device: Arc<Device>,
    writer: Arc<SocketWriter>,
    state: Arc<watch::Sender<ConnectionState>>,
    pending: Arc<PendingReplies>,
    cancel: CancellationToken,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl Connection {
    /// Open the socket and spawn the listener.
    pub(crate) async fn open(
        device: Arc<Device>,
        config: &SessionConfig,
        credential: &Credential,
        log: MessageLog,
        cancel: CancellationToken,
    ) -> Result<Self, CoreError> {
        let (writer, reader) = DeviceSocket::open(&config.socket(), credential).await?;
        let (state, _) = watch::channel(ConnectionState::Connected);
        let state = Arc::new(state);
        let pending = Arc::new(PendingReplies::new());

        let handle = tokio::spawn(listener_task(Listener {
            device: Arc::clone(&device),
            reader,
            log,
            pending: Arc::clone(&pending),
            state: Arc::clone(&state),
            idle_warning: config.idle_warning,
            cancel: cancel.clone(),
        }));

        info!(device = %device.id, "device connection open");

        Ok(Self {
            device,
            writer: Arc::new(writer),
            state,
            pending,
            cancel,
            listener: Mutex::new(Some(handle)),
        })
    }

    pub(crate) fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub(crate) fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    pub(crate) fn is_live(&self) -> bool {
        self.state() != ConnectionState::Disconnected
    }

    /// Send one command frame and register for its reply.
    pub(crate) async fn send(
        &self,
        frame: &OutboundFrame<Value>,
        reply_timeout: Duration,
    ) -> Result<CommandReceipt, CoreError> {
        self.dispatch(frame, reply_timeout, false).await
    }

    /// Send an export request. Its reply is either the correlated response
    /// or the next `EVENT_EXPORT_READY`.
    pub(crate) async fn send_export(
        &self,
        frame: &OutboundFrame<Value>,
        reply_timeout: Duration,
    ) -> Result<CommandReceipt, CoreError> {
        self.dispatch(frame, reply_timeout, true).await
    }

    async fn dispatch(
        &self,
        frame: &OutboundFrame<Value>,
        reply_timeout: Duration,
        export: bool,
    ) -> Result<CommandReceipt, CoreError> {
        if !self.is_live() {
            return Err(CoreError::NotConnected {
                device: self.device.name.clone(),
            });
        }

        // Register first so a fast reply cannot slip past.
        let (reply_tx, reply_rx) = oneshot::channel();
        self.pending
            .insert(frame.request_id.clone(), PendingReply { reply_tx, export });

        if let Err(e) = self.writer.send_json(frame).await {
            self.pending.remove(&frame.request_id);
            return Err(e.into());
        }
        debug!(
            device = %self.device.id,
            command = frame.command,
            request_id = %frame.request_id,
            "command sent"
        );

        Ok(CommandReceipt {
            request_id: frame.request_id.clone(),
            reply_rx,
            pending: Arc::clone(&self.pending),
            timeout: reply_timeout,
        })
    }

    /// Stop the listener and close the socket. Buffered messages stay in
    /// the log.
    pub(crate) async fn close(&self, grace: Duration) {
        self.cancel.cancel();
        self.writer.close().await;

        if let Some(handle) = self.listener.lock().await.take() {
            let abort = handle.abort_handle();
            if tokio::time::timeout(grace, handle).await.is_err() {
                warn!(device = %self.device.id, "listener did not stop in time, aborting");
                abort.abort();
            }
        }

        self.state.send_replace(ConnectionState::Disconnected);
        self.pending.clear();
        info!(device = %self.device.id, "device connection closed");
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ── Listener task ────────────────────────────────────────────────────

struct Listener {
    device: Arc<Device>,
    reader: SocketReader,
    log: MessageLog,
    pending: Arc<PendingReplies>,
    state: Arc<watch::Sender<ConnectionState>>,
    idle_warning: Duration,
    cancel: CancellationToken,
}

async fn listener_task(mut listener: Listener) {
    let device_id = listener.device.id.clone();

    loop {
        let event = tokio::select! {
            biased;
            () = listener.cancel.cancelled() => {
                debug!(device = %device_id, "listener cancelled");
                break;
            }
            event = tokio::time::timeout(listener.idle_warning, listener.reader.next_event()) => event,
        };

        let frame = match event {
            Err(_) => {
                warn!(
                    device = %device_id,
                    idle_secs = listener.idle_warning.as_secs(),
                    "no messages received recently"
                );
                continue;
            }
            Ok(None) => {
                info!(device = %device_id, "device stream ended");
                break;
            }
            Ok(Some(Err(e))) => {
                warn!(device = %device_id, error = %e, "device stream error");
                break;
            }
            Ok(Some(Ok(SocketEvent::Closed { code, reason }))) => {
                info!(device = %device_id, ?code, %reason, "device stream closed by remote");
                break;
            }
            Ok(Some(Ok(SocketEvent::Frame(frame)))) => frame,
        };

        let reply_to = frame
            .request_id
            .as_deref()
            .filter(|id| listener.pending.contains_key(*id))
            .map(str::to_owned)
            .or_else(|| {
                if frame.command.as_deref() == Some(event::EXPORT_READY) {
                    export_waiter(&listener.pending)
                } else {
                    None
                }
            });
        if reply_to.is_none() {
            if let Some(other) = frame.device_id() {
                if other != device_id.as_str() {
                    trace!(device = %device_id, other, "skipping frame for another device");
                    continue;
                }
            }
        }

        let message = listener.log.append(frame);
        trace!(
            device = %device_id,
            seq = message.seq,
            command = message.command_or_unknown(),
            "message received"
        );

        listener.state.send_if_modified(|state| {
            if *state == ConnectionState::Connected {
                *state = ConnectionState::Streaming;
                true
            } else {
                false
            }
        });

        if let Some(request_id) = reply_to {
            if let Some((_, waiter)) = listener.pending.remove(&request_id) {
                let _ = waiter.reply_tx.send(Arc::clone(&message));
            }
        }
    }

    listener.state.send_replace(ConnectionState::Disconnected);
    listener.pending.clear();
}
