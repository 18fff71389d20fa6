// ── Core error types ──
//
// User-facing errors from anova-core. Consumers never see websocket
// handshake details or JSON decode failures directly; the
// `From<anova_api::Error>` impl translates them into domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Credential ───────────────────────────────────────────────────
    #[error("Invalid token format: personal access tokens start with 'anova-'")]
    InvalidCredentialFormat,

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    // ── Discovery ────────────────────────────────────────────────────
    #[error("No devices found for this account")]
    NoDevicesFound,

    #[error("Device not found: {identifier}")]
    DeviceNotFound { identifier: String },

    // ── Connection ───────────────────────────────────────────────────
    #[error("Connection error: {reason}")]
    ConnectionError { reason: String },

    #[error("Device {device} is not connected")]
    NotConnected { device: String },

    #[error("Timed out after {timeout_secs}s waiting for the device")]
    Timeout { timeout_secs: u64 },

    // ── Commands ─────────────────────────────────────────────────────
    #[error("Invalid parameters: {message}")]
    InvalidParameters { message: String },

    #[error("Telemetry export unavailable for {device}: {reason}")]
    ExportUnavailable { device: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidParameters {
            message: message.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<anova_api::Error> for CoreError {
    fn from(err: anova_api::Error) -> Self {
        match err {
            anova_api::Error::InvalidCredentialFormat => CoreError::InvalidCredentialFormat,
            anova_api::Error::Authentication { status } => CoreError::AuthenticationFailed {
                message: format!("the service rejected the token (HTTP {status})"),
            },
            anova_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            anova_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            anova_api::Error::WebSocketConnect(reason) => CoreError::ConnectionError { reason },
            anova_api::Error::WebSocketClosed { code, reason } => CoreError::ConnectionError {
                reason: format!("websocket closed (code {code}): {reason}"),
            },
            anova_api::Error::WebSocketSend(reason) => CoreError::ConnectionError {
                reason: format!("send failed: {reason}"),
            },
            anova_api::Error::Serialization(e) => {
                CoreError::Internal(format!("Serialization error: {e}"))
            }
            anova_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_map_to_domain_variants() {
        assert!(matches!(
            CoreError::from(anova_api::Error::InvalidCredentialFormat),
            CoreError::InvalidCredentialFormat
        ));
        assert!(matches!(
            CoreError::from(anova_api::Error::Authentication { status: 403 }),
            CoreError::AuthenticationFailed { .. }
        ));
        assert!(matches!(
            CoreError::from(anova_api::Error::WebSocketConnect("refused".into())),
            CoreError::ConnectionError { .. }
        ));
        assert!(matches!(
            CoreError::from(anova_api::Error::Timeout { timeout_secs: 15 }),
            CoreError::Timeout { timeout_secs: 15 }
        ));
    }
}
