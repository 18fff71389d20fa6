// ── Wire format ──
//
// JSON frames exchanged with the device gateway. Every frame has the shape
// `{ "command": "...", "requestId": "...", "payload": ... }`. Cooker (APC)
// commands address the device by `cookerId`; oven (APO) commands wrap the
// payload in an `{ id, payload, type }` envelope. These types mirror the
// vendor format 1:1 -- domain types live in `anova-core`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

/// Outbound command tags.
pub mod command {
    pub const APC_START: &str = "CMD_APC_START";
    pub const APC_STOP: &str = "CMD_APC_STOP";
    pub const APC_SET_TEMPERATURE_UNIT: &str = "CMD_APC_SET_TEMPERATURE_UNIT";
    pub const APO_START: &str = "CMD_APO_START";
    pub const APO_STOP: &str = "CMD_APO_STOP";
    pub const APO_SET_TEMPERATURE_UNIT: &str = "CMD_APO_SET_TEMPERATURE_UNIT";
    pub const EXPORT_TELEMETRY: &str = "CMD_EXPORT_TELEMETRY";
}

/// Inbound event tags.
pub mod event {
    pub const APC_WIFI_LIST: &str = "EVENT_APC_WIFI_LIST";
    pub const APO_WIFI_LIST: &str = "EVENT_APO_WIFI_LIST";
    pub const EXPORT_READY: &str = "EVENT_EXPORT_READY";
}

/// Tag the gateway uses for replies correlated by `requestId`.
pub const RESPONSE: &str = "RESPONSE";

// ── Inbound ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    #[serde(default)]
    command: Option<String>,
    #[serde(default)]
    request_id: Option<String>,
    #[serde(default)]
    payload: Value,
}

/// A text frame received from the gateway.
///
/// Parsing never fails: frames that are not JSON objects keep only their
/// raw text so nothing the service sends is silently dropped.
#[derive(Debug, Clone, Serialize)]
pub struct InboundFrame {
    pub command: Option<String>,
    pub request_id: Option<String>,
    pub payload: Value,
    pub raw: String,
}

impl InboundFrame {
    pub fn parse(text: &str) -> Self {
        match serde_json::from_str::<Envelope>(text) {
            Ok(env) => Self {
                command: env.command,
                request_id: env.request_id,
                payload: env.payload,
                raw: text.to_owned(),
            },
            Err(e) => {
                tracing::debug!(error = %e, "non-JSON websocket frame");
                Self {
                    command: None,
                    request_id: None,
                    payload: Value::Null,
                    raw: text.to_owned(),
                }
            }
        }
    }

    pub fn command_or_unknown(&self) -> &str {
        self.command.as_deref().unwrap_or("UNKNOWN")
    }

    /// Device this frame is about, when the payload names one.
    pub fn device_id(&self) -> Option<&str> {
        self.payload
            .get("cookerId")
            .or_else(|| self.payload.get("deviceId"))
            .and_then(Value::as_str)
    }

    /// Decode a `EVENT_*_WIFI_LIST` payload.
    pub fn wifi_list(&self) -> Result<Vec<WifiListEntry>, Error> {
        serde_json::from_value(self.payload.clone()).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: self.raw.clone(),
        })
    }
}

/// One device record inside a WiFi list event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WifiListEntry {
    pub cooker_id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Hardware tag, e.g. `a5`, `oven_v1`, `oven_v2`.
    #[serde(rename = "type", default)]
    pub hardware: Option<String>,
}

/// Reply payload for a telemetry export.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportReply {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub urls: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
}

// ── Outbound ─────────────────────────────────────────────────────────

/// A command frame ready for serialization.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundFrame<P> {
    pub command: &'static str,
    pub request_id: String,
    pub payload: P,
}

// ── Cooker (APC) payloads ──

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApcStart {
    pub cooker_id: String,
    #[serde(rename = "type")]
    pub hardware: String,
    pub target_temperature: f64,
    pub unit: &'static str,
    /// Seconds.
    pub timer: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApcStop {
    pub cooker_id: String,
    #[serde(rename = "type")]
    pub hardware: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApcSetUnit {
    pub cooker_id: String,
    #[serde(rename = "type")]
    pub hardware: String,
    pub unit: &'static str,
}

// ── Oven (APO) payloads ──

/// Oven command envelope: `{ id, payload?, type }`.
#[derive(Debug, Clone, Serialize)]
pub struct ApoEnvelope<P> {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<P>,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApoSetUnit {
    pub temperature_unit: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BulbMode {
    Dry,
    Wet,
}

#[derive(Debug, Clone, Serialize)]
pub struct Setpoint {
    pub celsius: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fahrenheit: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulbSetpoint {
    pub setpoint: Setpoint,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemperatureBulbs {
    pub mode: BulbMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dry: Option<BulbSetpoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wet: Option<BulbSetpoint>,
}

impl TemperatureBulbs {
    pub fn new(mode: BulbMode, setpoint: Setpoint) -> Self {
        let bulb = Some(BulbSetpoint { setpoint });
        match mode {
            BulbMode::Dry => Self {
                mode,
                dry: bulb,
                wet: None,
            },
            BulbMode::Wet => Self {
                mode,
                dry: None,
                wet: bulb,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Element {
    pub on: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HeatingElements {
    pub top: Element,
    pub bottom: Element,
    pub rear: Element,
}

impl HeatingElements {
    pub const fn new(top: bool, bottom: bool, rear: bool) -> Self {
        Self {
            top: Element { on: top },
            bottom: Element { on: bottom },
            rear: Element { on: rear },
        }
    }

    pub fn is_bottom_only(&self) -> bool {
        self.bottom.on && !self.top.on && !self.rear.on
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Fan {
    pub speed: u8,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ExhaustVent {
    pub state: &'static str,
}

impl ExhaustVent {
    pub const CLOSED: Self = Self { state: "closed" };
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Vent {
    pub open: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SteamMode {
    Idle,
    RelativeHumidity,
    SteamPercentage,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct HumiditySetpoint {
    pub setpoint: u8,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SteamGenerators {
    pub mode: SteamMode,
    pub relative_humidity: HumiditySetpoint,
}

impl SteamGenerators {
    pub fn relative(setpoint: u8) -> Self {
        Self {
            mode: SteamMode::RelativeHumidity,
            relative_humidity: HumiditySetpoint { setpoint },
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Timer {
    pub initial: u64,
}

/// `{"=": "completed"}`
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Equals {
    #[serde(rename = "=")]
    pub value: &'static str,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct TimerCondition {
    #[serde(rename = "nodes.timer.mode")]
    pub timer_mode: Equals,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ExitConditions {
    pub and: TimerCondition,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct StageExit {
    pub conditions: ExitConditions,
}

impl StageExit {
    /// Leave the stage once its timer completes.
    pub const TIMER_COMPLETED: Self = Self {
        conditions: ExitConditions {
            and: TimerCondition {
                timer_mode: Equals { value: "completed" },
            },
        },
    };
}

/// What an `oven_v2` stage does while active.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageAction {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub fan: Fan,
    pub heating_elements: HeatingElements,
    pub exhaust_vent: ExhaustVent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steam_generators: Option<SteamGenerators>,
    pub temperature_bulbs: TemperatureBulbs,
    pub timer: Timer,
}

/// Stage in the `oven_v2` cook format.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageV2 {
    pub id: String,
    #[serde(rename = "do")]
    pub action: StageAction,
    pub exit: StageExit,
    pub title: String,
    pub description: String,
    pub rack_position: u8,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApoCookV2 {
    pub stages: Vec<StageV2>,
    pub cook_id: String,
    pub cooker_id: String,
    pub cookable_id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub hardware: String,
    pub origin_source: &'static str,
    pub cookable_type: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageKind {
    Preheat,
    Cook,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageTransition {
    Automatic,
    Manual,
}

/// Stage in the original (v1) oven cook format.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageV1 {
    pub step_type: &'static str,
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: StageKind,
    pub user_action_required: bool,
    pub temperature_bulbs: TemperatureBulbs,
    pub heating_elements: HeatingElements,
    pub fan: Fan,
    pub vent: Vent,
    pub rack_position: u8,
    pub stage_transition_type: StageTransition,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steam_generators: Option<SteamGenerators>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApoCookV1 {
    pub cook_id: String,
    pub stages: Vec<StageV1>,
}

// ── Telemetry export ──

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportWindow {
    pub device_id: String,
    /// `YYYY-MM-DD`
    pub start_time: String,
    /// `YYYY-MM-DD`
    pub end_time: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportEnvelope {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub payload: ExportWindow,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parse_state_event() {
        let frame = InboundFrame::parse(
            r#"{"command":"EVENT_APC_STATE","payload":{"cookerId":"c1","temperature":54.5}}"#,
        );
        assert_eq!(frame.command.as_deref(), Some("EVENT_APC_STATE"));
        assert_eq!(frame.device_id(), Some("c1"));
        assert!(frame.request_id.is_none());
        assert_eq!(frame.payload["temperature"], 54.5);
    }

    #[test]
    fn parse_response_keeps_request_id() {
        let frame = InboundFrame::parse(
            r#"{"command":"RESPONSE","requestId":"r-1","payload":{"status":"ok"}}"#,
        );
        assert_eq!(frame.command_or_unknown(), RESPONSE);
        assert_eq!(frame.request_id.as_deref(), Some("r-1"));
    }

    #[test]
    fn parse_non_json_keeps_raw_text() {
        let frame = InboundFrame::parse("hello");
        assert!(frame.command.is_none());
        assert_eq!(frame.command_or_unknown(), "UNKNOWN");
        assert_eq!(frame.raw, "hello");
    }

    #[test]
    fn decode_wifi_list() {
        let frame = InboundFrame::parse(
            &json!({
                "command": event::APO_WIFI_LIST,
                "payload": [
                    {"cookerId": "oven-1", "name": "Kitchen Oven", "type": "oven_v2"},
                    {"cookerId": "oven-2"}
                ]
            })
            .to_string(),
        );
        let list = frame.wifi_list().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].hardware.as_deref(), Some("oven_v2"));
        assert!(list[1].name.is_none());
    }

    #[test]
    fn wifi_list_rejects_wrong_shape() {
        let frame = InboundFrame::parse(r#"{"command":"EVENT_APC_WIFI_LIST","payload":{"x":1}}"#);
        assert!(matches!(frame.wifi_list(), Err(Error::Deserialization { .. })));
    }

    #[test]
    fn stage_exit_serializes_to_timer_condition() {
        let value = serde_json::to_value(StageExit::TIMER_COMPLETED).unwrap();
        assert_eq!(
            value,
            json!({"conditions": {"and": {"nodes.timer.mode": {"=": "completed"}}}})
        );
    }

    #[test]
    fn bulbs_only_emit_active_side() {
        let bulbs = TemperatureBulbs::new(
            BulbMode::Wet,
            Setpoint {
                celsius: 60.0,
                fahrenheit: None,
            },
        );
        let value = serde_json::to_value(bulbs).unwrap();
        assert_eq!(value, json!({"mode": "wet", "wet": {"setpoint": {"celsius": 60.0}}}));
    }

    #[test]
    fn steam_mode_is_kebab_case() {
        let value = serde_json::to_value(SteamGenerators::relative(40)).unwrap();
        assert_eq!(
            value,
            json!({"mode": "relative-humidity", "relativeHumidity": {"setpoint": 40}})
        );
    }
}
