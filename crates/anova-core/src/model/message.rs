// ── Received messages ──

use anova_api::InboundFrame;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use strum::Display;

/// One frame received from a device, as stored in the message log.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    /// Position in the device's log, starting at 0.
    pub seq: u64,
    pub received_at: DateTime<Utc>,
    /// Vendor command tag (`EVENT_*`, `RESPONSE`, `CMD_*`); `None` for raw frames.
    pub command: Option<String>,
    pub request_id: Option<String>,
    pub payload: Value,
    #[serde(skip)]
    pub raw: String,
}

/// Coarse classification used for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum MessageKind {
    /// `EVENT_*STATE*`: periodic device state.
    State,
    /// Any other `EVENT_*`.
    Event,
    /// `RESPONSE*` or an echoed `CMD_*`.
    Response,
    /// Untagged or unrecognized frame.
    Raw,
}

/// Temperature and status pulled out of a state event.
#[derive(Debug, Clone, PartialEq)]
pub struct StateSummary {
    /// Always Celsius, as reported by the device.
    pub temperature_c: Option<f64>,
    pub status: Option<String>,
}

impl Message {
    pub(crate) fn from_frame(seq: u64, frame: InboundFrame) -> Self {
        Self {
            seq,
            received_at: Utc::now(),
            command: frame.command,
            request_id: frame.request_id,
            payload: frame.payload,
            raw: frame.raw,
        }
    }

    pub fn command_or_unknown(&self) -> &str {
        self.command.as_deref().unwrap_or("UNKNOWN")
    }

    pub fn kind(&self) -> MessageKind {
        let Some(command) = self.command.as_deref() else {
            return MessageKind::Raw;
        };
        if command.starts_with("EVENT_") {
            if command.contains("STATE") {
                MessageKind::State
            } else {
                MessageKind::Event
            }
        } else if command.starts_with("RESPONSE") || command.starts_with("CMD_") {
            MessageKind::Response
        } else {
            MessageKind::Raw
        }
    }

    /// `None` unless this is a state event with an object payload.
    pub fn state_summary(&self) -> Option<StateSummary> {
        if self.kind() != MessageKind::State {
            return None;
        }
        let payload = self.payload.as_object()?;
        let status = payload
            .get("status")
            .or_else(|| payload.get("state"))
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            });
        Some(StateSummary {
            temperature_c: payload.get("temperature").and_then(Value::as_f64),
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(text: &str) -> Message {
        Message::from_frame(0, InboundFrame::parse(text))
    }

    #[test]
    fn classifies_by_command_tag() {
        assert_eq!(
            message(r#"{"command":"EVENT_APC_STATE","payload":{}}"#).kind(),
            MessageKind::State
        );
        assert_eq!(
            message(r#"{"command":"EVENT_APO_WIFI_LIST","payload":[]}"#).kind(),
            MessageKind::Event
        );
        assert_eq!(
            message(r#"{"command":"RESPONSE","requestId":"r1","payload":{}}"#).kind(),
            MessageKind::Response
        );
        assert_eq!(
            message(r#"{"command":"CMD_APC_START","payload":{}}"#).kind(),
            MessageKind::Response
        );
        assert_eq!(message(r#"{"hello":1}"#).kind(), MessageKind::Raw);
        assert_eq!(message("not json").kind(), MessageKind::Raw);
    }

    #[test]
    fn state_summary_reads_temperature_and_status() {
        let msg = message(
            r#"{"command":"EVENT_APC_STATE","payload":{"temperature":54.5,"status":"cooking"}}"#,
        );
        assert_eq!(
            msg.state_summary(),
            Some(StateSummary {
                temperature_c: Some(54.5),
                status: Some("cooking".into()),
            })
        );
    }

    #[test]
    fn state_summary_falls_back_to_state_field() {
        let msg = message(r#"{"command":"EVENT_APO_STATE","payload":{"state":"idle"}}"#);
        let summary = msg.state_summary().unwrap_or_else(|| panic!("no summary"));
        assert_eq!(summary.temperature_c, None);
        assert_eq!(summary.status.as_deref(), Some("idle"));
    }

    #[test]
    fn non_state_messages_have_no_summary() {
        assert!(message(r#"{"command":"RESPONSE","payload":{}}"#).state_summary().is_none());
        assert!(message(r#"{"command":"EVENT_APC_STATE","payload":[1]}"#).state_summary().is_none());
    }
}
