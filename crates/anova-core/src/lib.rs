//! Session relay between a caller and Anova cookers and ovens.
//!
//! This crate owns the domain layer on top of [`anova_api`]:
//!
//! - **[`Session`]**: holds the credential and discovered devices, opens one
//!   streaming connection per device, and issues commands over it.
//! - **[`MessageLog`] / [`MessageStream`]**: per-device, append-only record
//!   of everything the device sent, readable as a snapshot or followed live.
//! - **[`model`]**: devices, cook parameters and their validation,
//!   messages, and telemetry export ranges.
//!
//! Each connection runs a background listener task that appends to the
//! message log while the foreground keeps sending commands. The log is the
//! only state the two share.

pub mod config;
pub mod connection;
mod convert;
pub mod error;
pub mod model;
pub mod session;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────
pub use config::SessionConfig;
pub use connection::{CommandReceipt, ConnectionState};
pub use error::CoreError;
pub use session::Session;
pub use stream::{MessageLog, MessageStream};

// ── Model re-exports ────────────────────────────────────────────
pub use model::{
    CookCommand, CookMode, CookParams, Device, DeviceId, DeviceKind, ExportRange, Message,
    MessageKind, OvenCook, OvenGeneration, SousVideCook, StateSummary, TelemetryExport,
    Temperature, TemperatureUnit,
};
pub use model::cook::{OvenMode, TemperatureRange};
