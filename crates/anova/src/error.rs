//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text and a process exit code.

use miette::Diagnostic;
use thiserror::Error;

use anova_config::ConfigError;
use anova_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const INTERRUPTED: i32 = 130;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Authentication ───────────────────────────────────────────────
    #[error("Invalid personal access token")]
    #[diagnostic(
        code(anova::invalid_token),
        help(
            "Personal access tokens start with 'anova-'.\n\
             Create one in the Anova app under More > Developer > Personal Access Tokens."
        )
    )]
    InvalidToken,

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(anova::auth_failed),
        help("The token may have been revoked. Store a new one with: anova config set-token")
    )]
    AuthFailed { message: String },

    #[error("No token configured for profile '{profile}'")]
    #[diagnostic(
        code(anova::no_credentials),
        help(
            "Store one with: anova config set-token\n\
             Or pass --token / set the ANOVA_TOKEN environment variable."
        )
    )]
    NoCredentials { profile: String },

    // ── Devices ──────────────────────────────────────────────────────
    #[error("No devices found for this account")]
    #[diagnostic(
        code(anova::no_devices),
        help("Pair a cooker or oven in the Anova app, then try again.")
    )]
    NoDevices,

    #[error("Device '{identifier}' not found")]
    #[diagnostic(
        code(anova::device_not_found),
        help("Run: anova devices to see available devices")
    )]
    DeviceNotFound { identifier: String },

    #[error("More than one device on the account")]
    #[diagnostic(
        code(anova::device_required),
        help("Choose one with --device <id or name>. Available: {available}")
    )]
    DeviceRequired { available: String },

    // ── Connection ───────────────────────────────────────────────────
    #[error("Connection to the device gateway failed: {reason}")]
    #[diagnostic(
        code(anova::connection_failed),
        help("Check your network connection, or the gateway URL given with --endpoint.")
    )]
    ConnectionFailed { reason: String },

    #[error("{device} is not connected")]
    #[diagnostic(code(anova::not_connected))]
    NotConnected { device: String },

    #[error("Timed out after {seconds}s waiting for the device")]
    #[diagnostic(
        code(anova::timeout),
        help("Make sure the device is powered on and online in the Anova app.")
    )]
    Timeout { seconds: u64 },

    // ── Commands ─────────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(anova::validation))]
    Validation { field: String, reason: String },

    #[error("Telemetry export unavailable for {device}: {reason}")]
    #[diagnostic(
        code(anova::export_unavailable),
        help("Exports only cover days with recorded cook sessions.")
    )]
    ExportUnavailable { device: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(anova::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: anova config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("{message}")]
    #[diagnostic(code(anova::config))]
    Config { message: String },

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Interrupted")]
    #[diagnostic(code(anova::interrupted))]
    Interrupted,

    // ── Internal ─────────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    #[diagnostic(code(anova::internal))]
    Internal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidToken | Self::AuthFailed { .. } | Self::NoCredentials { .. } => {
                exit_code::AUTH
            }
            Self::NoDevices | Self::DeviceNotFound { .. } | Self::ProfileNotFound { .. } => {
                exit_code::NOT_FOUND
            }
            Self::ConnectionFailed { .. } | Self::NotConnected { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Interrupted => exit_code::INTERRUPTED,
            Self::Validation { .. } | Self::DeviceRequired { .. } => exit_code::USAGE,
            Self::ExportUnavailable { .. }
            | Self::Config { .. }
            | Self::Internal(_)
            | Self::Io(_) => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidCredentialFormat => Self::InvalidToken,
            CoreError::AuthenticationFailed { message } => Self::AuthFailed { message },
            CoreError::NoDevicesFound => Self::NoDevices,
            CoreError::DeviceNotFound { identifier } => Self::DeviceNotFound { identifier },
            CoreError::ConnectionError { reason } => Self::ConnectionFailed { reason },
            CoreError::NotConnected { device } => Self::NotConnected { device },
            CoreError::Timeout { timeout_secs } => Self::Timeout {
                seconds: timeout_secs,
            },
            CoreError::InvalidParameters { message } => Self::Validation {
                field: "parameters".into(),
                reason: message,
            },
            CoreError::ExportUnavailable { device, reason } => {
                Self::ExportUnavailable { device, reason }
            }
            CoreError::Config { message } => Self::Config { message },
            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::ProfileNotFound { name } => Self::ProfileNotFound {
                name,
                available: "(none)".into(),
            },
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config {
                message: other.to_string(),
            },
        }
    }
}
