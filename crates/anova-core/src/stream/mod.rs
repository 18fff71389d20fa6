// ── Message log and streams ──
//
// Per-device append-only log shared between a connection's listener task
// (the only writer) and any number of readers. Readers either take
// snapshots or follow the log through a `MessageStream`.

use std::pin::Pin;
use std::sync::{Arc, PoisonError, RwLock};
use std::task::{Context, Poll};

use anova_api::InboundFrame;
use futures_core::Stream;
use tokio::sync::watch;

use crate::model::Message;

struct LogInner {
    messages: RwLock<Vec<Arc<Message>>>,
    /// Current length, bumped after every append.
    len_tx: watch::Sender<usize>,
}

/// Ordered, append-only message log for one device.
///
/// Cloning is cheap and every clone observes the same log. Entries are
/// never reordered or mutated; a reconnect keeps appending to the same log.
#[derive(Clone)]
pub struct MessageLog {
    inner: Arc<LogInner>,
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageLog {
    pub fn new() -> Self {
        let (len_tx, _) = watch::channel(0);
        Self {
            inner: Arc::new(LogInner {
                messages: RwLock::new(Vec::new()),
                len_tx,
            }),
        }
    }

    /// Append a received frame, assigning it the next sequence number.
    pub(crate) fn append(&self, frame: InboundFrame) -> Arc<Message> {
        let (message, len) = {
            let mut messages = self
                .inner
                .messages
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            let seq = u64::try_from(messages.len()).unwrap_or(u64::MAX);
            let message = Arc::new(Message::from_frame(seq, frame));
            messages.push(Arc::clone(&message));
            (message, messages.len())
        };
        self.inner.len_tx.send_replace(len);
        message
    }

    pub fn len(&self) -> usize {
        *self.inner.len_tx.borrow()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every message received so far, in arrival order.
    pub fn snapshot(&self) -> Vec<Arc<Message>> {
        self.since(0)
    }

    /// The last `n` messages (fewer if the log is shorter).
    pub fn tail(&self, n: usize) -> Vec<Arc<Message>> {
        let messages = self
            .inner
            .messages
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let start = messages.len().saturating_sub(n);
        messages.get(start..).map(<[_]>::to_vec).unwrap_or_default()
    }

    /// Messages with `seq >= from`.
    pub fn since(&self, from: usize) -> Vec<Arc<Message>> {
        let messages = self
            .inner
            .messages
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        messages.get(from..).map(<[_]>::to_vec).unwrap_or_default()
    }

    /// Follow the log from its first message, then live.
    pub fn stream(&self) -> MessageStream {
        self.stream_from(0)
    }

    /// Follow the log from position `from`, then live.
    ///
    /// The stream never ends on its own; drop it to stop following.
    pub fn stream_from(&self, from: usize) -> MessageStream {
        let log = self.clone();
        let mut len_rx = self.inner.len_tx.subscribe();
        let inner = async_stream::stream! {
            let mut next = from;
            loop {
                let batch = log.since(next);
                if batch.is_empty() {
                    // The sender lives in `log`, so this only fails if the
                    // log itself is gone.
                    if len_rx.changed().await.is_err() {
                        break;
                    }
                    continue;
                }
                next += batch.len();
                for message in batch {
                    yield message;
                }
            }
        };
        MessageStream {
            inner: Box::pin(inner),
        }
    }
}

/// Lazy, unbounded sequence of a device's messages.
pub struct MessageStream {
    inner: Pin<Box<dyn Stream<Item = Arc<Message>> + Send>>,
}

impl Stream for MessageStream {
    type Item = Arc<Message>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}
