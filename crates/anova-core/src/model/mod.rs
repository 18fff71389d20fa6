// ── Domain model ──
//
// Canonical types shared by the session layer and its consumers.

pub mod cook;
pub mod device;
pub mod message;
pub mod telemetry;

pub use cook::{CookCommand, CookMode, CookParams, OvenCook, SousVideCook, Temperature, TemperatureUnit};
pub use device::{Device, DeviceId, DeviceKind, OvenGeneration};
pub use message::{Message, MessageKind, StateSummary};
pub use telemetry::{ExportRange, TelemetryExport};
