//! Device gateway websocket.
//!
//! [`DeviceSocket::open`] performs the authenticated upgrade and splits the
//! stream into a [`SocketWriter`] (shared, FIFO-serialized writes) and a
//! [`SocketReader`] (owned by exactly one listener task). Control frames are
//! handled here; callers only ever see text frames and the close event.
//!
//! # Example
//!
//! ```rust,ignore
//! use anova_api::{Credential, DeviceSocket, SocketConfig, SocketEvent};
//!
//! let credential = Credential::parse("anova-...")?;
//! let (writer, mut reader) = DeviceSocket::open(&SocketConfig::default(), &credential).await?;
//!
//! while let Some(event) = reader.next_event().await {
//!     if let SocketEvent::Frame(frame) = event? {
//!         println!("{}", frame.command_or_unknown());
//!     }
//! }
//! writer.close().await;
//! ```

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::auth::Credential;
use crate::error::Error;
use crate::transport::SocketConfig;
use crate::wire::InboundFrame;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ── SocketEvent ──────────────────────────────────────────────────────

/// Something the reader observed on the wire.
#[derive(Debug, Clone)]
pub enum SocketEvent {
    /// A text frame from the gateway.
    Frame(InboundFrame),
    /// The gateway closed the connection (close frame or end of stream).
    Closed { code: Option<u16>, reason: String },
}

// ── DeviceSocket ─────────────────────────────────────────────────────

/// Entry point for opening gateway connections.
pub struct DeviceSocket;

impl DeviceSocket {
    /// Connect and authenticate. Fails with [`Error::Authentication`] when
    /// the gateway refuses the token during the upgrade.
    pub async fn open(
        config: &SocketConfig,
        credential: &Credential,
    ) -> Result<(SocketWriter, SocketReader), Error> {
        tracing::info!(endpoint = %config.endpoint, "connecting to device gateway");

        let request = config.build_request(credential)?;
        let (ws_stream, _response) =
            tokio::time::timeout(config.connect_timeout, tokio_tungstenite::connect_async(request))
                .await
                .map_err(|_| Error::Timeout {
                    timeout_secs: config.connect_timeout_secs(),
                })??;

        tracing::info!("device gateway connected");

        let (sink, stream) = ws_stream.split();
        Ok((
            SocketWriter {
                sink: Mutex::new(sink),
            },
            SocketReader { stream },
        ))
    }
}

// ── SocketWriter ─────────────────────────────────────────────────────

/// Write half of a gateway connection.
///
/// Writes go through a `tokio::sync::Mutex`, whose FIFO fairness keeps
/// frames in issuance order when several tasks send at once.
pub struct SocketWriter {
    sink: Mutex<SplitSink<WsStream, Message>>,
}

impl SocketWriter {
    /// Serialize `frame` as JSON and send it as one text frame.
    pub async fn send_json<T: Serialize>(&self, frame: &T) -> Result<(), Error> {
        let text = serde_json::to_string(frame)?;
        tracing::debug!(bytes = text.len(), "sending frame");
        self.sink
            .lock()
            .await
            .send(Message::text(text))
            .await
            .map_err(|e| Error::WebSocketSend(e.to_string()))
    }

    /// Send a close frame. Errors are logged, not returned: the peer may
    /// already be gone.
    pub async fn close(&self) {
        if let Err(e) = self.sink.lock().await.close().await {
            tracing::debug!(error = %e, "websocket close failed");
        }
    }
}

// ── SocketReader ─────────────────────────────────────────────────────

/// Read half of a gateway connection.
pub struct SocketReader {
    stream: SplitStream<WsStream>,
}

impl SocketReader {
    /// Next text frame or close event. `None` once the stream is exhausted.
    ///
    /// Pings are answered by tungstenite while reading; binary and pong
    /// frames are skipped.
    pub async fn next_event(&mut self) -> Option<Result<SocketEvent, Error>> {
        loop {
            let frame = match self.stream.next().await? {
                Ok(frame) => frame,
                Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                    return Some(Ok(SocketEvent::Closed {
                        code: None,
                        reason: "connection closed".into(),
                    }));
                }
                Err(e) => return Some(Err(e.into())),
            };

            match frame {
                Message::Text(text) => {
                    return Some(Ok(SocketEvent::Frame(InboundFrame::parse(text.as_str()))));
                }
                Message::Close(frame) => {
                    let (code, reason) = frame.map_or((None, String::new()), |cf| {
                        (Some(u16::from(cf.code)), cf.reason.to_string())
                    });
                    tracing::info!(?code, %reason, "websocket close frame received");
                    return Some(Ok(SocketEvent::Closed { code, reason }));
                }
                Message::Ping(_) => tracing::trace!("websocket ping"),
                _ => {}
            }
        }
    }
}
