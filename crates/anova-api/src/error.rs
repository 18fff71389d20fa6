use thiserror::Error;

/// Top-level error type for the `anova-api` crate.
///
/// Covers every failure mode of the device websocket: credential shape,
/// handshake, transport, and frame decoding. `anova-core` maps these into
/// user-facing domain errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Token does not carry the `anova-` prefix.
    #[error("Invalid token format: personal access tokens start with 'anova-'")]
    InvalidCredentialFormat,

    /// The service rejected the token during the websocket upgrade.
    #[error("Authentication rejected by the Anova service (HTTP {status})")]
    Authentication { status: u16 },

    // ── Transport ───────────────────────────────────────────────────
    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Connect or reply wait exceeded its deadline.
    #[error("Timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── WebSocket ───────────────────────────────────────────────────
    /// WebSocket connection failed.
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),

    /// WebSocket closed unexpectedly.
    #[error("WebSocket closed (code {code}): {reason}")]
    WebSocketClosed { code: u16, reason: String },

    /// Writing a frame failed.
    #[error("WebSocket send failed: {0}")]
    WebSocketSend(String),

    // ── Data ────────────────────────────────────────────────────────
    /// Outbound frame could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Inbound payload did not match the expected shape.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the service refused the credential.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentialFormat | Self::Authentication { .. }
        )
    }

    /// Returns `true` if this is a transient error worth retrying by hand.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::WebSocketConnect(_) | Self::WebSocketClosed { .. }
        )
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for Error {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error as WsError;

        match err {
            WsError::Http(response) => {
                let status = response.status().as_u16();
                if status == 401 || status == 403 {
                    Self::Authentication { status }
                } else {
                    Self::WebSocketConnect(format!("HTTP {status} during upgrade"))
                }
            }
            WsError::ConnectionClosed | WsError::AlreadyClosed => Self::WebSocketClosed {
                code: 1000,
                reason: "connection closed".into(),
            },
            other => Self::WebSocketConnect(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failures_are_classified() {
        assert!(Error::InvalidCredentialFormat.is_auth_failure());
        assert!(Error::Authentication { status: 401 }.is_auth_failure());
        assert!(!Error::Timeout { timeout_secs: 5 }.is_auth_failure());
    }

    #[test]
    fn transient_errors_are_classified() {
        assert!(Error::WebSocketConnect("refused".into()).is_transient());
        assert!(
            Error::WebSocketClosed {
                code: 1006,
                reason: String::new()
            }
            .is_transient()
        );
        assert!(!Error::InvalidCredentialFormat.is_transient());
    }
}
