// ── Runtime session configuration ──
//
// These types describe *how* to talk to the device gateway. They never
// touch disk: the CLI builds a `SessionConfig` from its profile and hands
// it in together with the token.

use std::time::Duration;

use anova_api::SocketConfig;
use url::Url;

/// Configuration for one [`Session`](crate::Session).
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Gateway URL (defaults to `wss://devices.anovaculinary.io`).
    pub endpoint: Url,
    /// Upper bound on the websocket handshake.
    pub connect_timeout: Duration,
    /// How long discovery waits for device lists.
    pub discovery_timeout: Duration,
    /// How long callers wait for a command reply.
    pub command_timeout: Duration,
    /// How long callers wait for a telemetry export reply.
    pub export_timeout: Duration,
    /// Listener logs a warning after this much silence.
    pub idle_warning: Duration,
    /// How long `close` waits for a listener to wind down.
    pub close_grace: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let socket = SocketConfig::default();
        Self {
            endpoint: socket.endpoint,
            connect_timeout: socket.connect_timeout,
            discovery_timeout: Duration::from_secs(5),
            command_timeout: Duration::from_secs(10),
            export_timeout: Duration::from_secs(30),
            idle_warning: Duration::from_secs(30),
            close_grace: Duration::from_secs(2),
        }
    }
}

impl SessionConfig {
    pub fn with_endpoint(endpoint: Url) -> Self {
        Self {
            endpoint,
            ..Self::default()
        }
    }

    pub(crate) fn socket(&self) -> SocketConfig {
        SocketConfig {
            endpoint: self.endpoint.clone(),
            connect_timeout: self.connect_timeout,
            ..SocketConfig::default()
        }
    }
}
