// ── Domain ↔ wire conversion ──
//
// Bridges `anova_api` wire types and the domain model. Outbound frames are
// built here so the session layer never touches vendor field names.

use std::time::Duration;

use anova_api::ListedDevice;
use anova_api::wire::{
    ApcSetUnit, ApcStart, ApcStop, ApoCookV1, ApoCookV2, ApoEnvelope, ApoSetUnit, BulbMode,
    ExhaustVent, ExportEnvelope, ExportReply, ExportWindow, Fan, HeatingElements, OutboundFrame,
    Setpoint, StageAction, StageExit, StageKind, StageTransition, StageV1, StageV2,
    SteamGenerators, TemperatureBulbs, Timer, Vent, command,
};
use serde::Serialize;
use serde_json::Value;
use url::Url;
use uuid::Uuid;

use crate::error::CoreError;
use crate::model::cook::{OvenCook, OvenMode, SousVideCook};
use crate::model::{
    CookCommand, Device, DeviceId, DeviceKind, Message, OvenGeneration, TelemetryExport,
    TemperatureUnit,
};

const RACK_POSITION: u8 = 3;
const ORIGIN_SOURCE: &str = "api";
const COOKABLE_TYPE: &str = "manual";

pub(crate) fn new_request_id() -> String {
    Uuid::new_v4().to_string()
}

// ── Discovery ────────────────────────────────────────────────────────

impl From<ListedDevice> for Device {
    fn from(listed: ListedDevice) -> Self {
        let name = listed
            .entry
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| listed.accessory.default_device_name().to_owned());
        Device {
            id: DeviceId::new(listed.entry.cooker_id),
            name,
            kind: DeviceKind::from_accessory(listed.accessory),
            hardware: listed.entry.hardware.unwrap_or_default(),
        }
    }
}

// ── Outbound frames ──────────────────────────────────────────────────

fn frame<P: Serialize>(
    command: &'static str,
    request_id: &str,
    payload: P,
) -> Result<OutboundFrame<Value>, CoreError> {
    let payload = serde_json::to_value(payload)
        .map_err(|e| CoreError::Internal(format!("failed to encode {command}: {e}")))?;
    Ok(OutboundFrame {
        command,
        request_id: request_id.to_owned(),
        payload,
    })
}

fn apo_envelope<P: Serialize>(
    command: &'static str,
    device: &Device,
    request_id: &str,
    payload: Option<P>,
) -> Result<OutboundFrame<Value>, CoreError> {
    frame(
        command,
        request_id,
        ApoEnvelope {
            id: device.id.to_string(),
            payload,
            kind: command,
        },
    )
}

/// Start frame for `cook` on `device`. The command family must match.
pub(crate) fn start_frame(
    device: &Device,
    cook: &CookCommand,
    request_id: &str,
) -> Result<OutboundFrame<Value>, CoreError> {
    match (cook, device.oven_generation()) {
        (CookCommand::Cooker(cook), None) => {
            frame(command::APC_START, request_id, apc_start(device, cook))
        }
        (CookCommand::Oven(cook), Some(OvenGeneration::V2)) => apo_envelope(
            command::APO_START,
            device,
            request_id,
            Some(apo_cook_v2(device, cook)),
        ),
        (CookCommand::Oven(cook), Some(OvenGeneration::V1)) => apo_envelope(
            command::APO_START,
            device,
            request_id,
            Some(apo_cook_v1(cook)),
        ),
        (cook, _) => Err(CoreError::invalid(format!(
            "a {} cook cannot be sent to {} '{}'",
            cook.kind(),
            device.kind,
            device.name
        ))),
    }
}

pub(crate) fn stop_frame(device: &Device, request_id: &str) -> Result<OutboundFrame<Value>, CoreError> {
    match device.kind {
        DeviceKind::Cooker => frame(
            command::APC_STOP,
            request_id,
            ApcStop {
                cooker_id: device.id.to_string(),
                hardware: device.hardware.clone(),
            },
        ),
        DeviceKind::Oven => apo_envelope::<()>(command::APO_STOP, device, request_id, None),
    }
}

pub(crate) fn unit_frame(
    device: &Device,
    unit: TemperatureUnit,
    request_id: &str,
) -> Result<OutboundFrame<Value>, CoreError> {
    match device.kind {
        DeviceKind::Cooker => frame(
            command::APC_SET_TEMPERATURE_UNIT,
            request_id,
            ApcSetUnit {
                cooker_id: device.id.to_string(),
                hardware: device.hardware.clone(),
                unit: unit.code(),
            },
        ),
        DeviceKind::Oven => apo_envelope(
            command::APO_SET_TEMPERATURE_UNIT,
            device,
            request_id,
            Some(ApoSetUnit {
                temperature_unit: unit.code(),
            }),
        ),
    }
}

pub(crate) fn export_frame(
    device: &Device,
    start: String,
    end: String,
    request_id: &str,
) -> Result<OutboundFrame<Value>, CoreError> {
    frame(
        command::EXPORT_TELEMETRY,
        request_id,
        ExportEnvelope {
            id: new_request_id(),
            kind: command::EXPORT_TELEMETRY,
            payload: ExportWindow {
                device_id: device.id.to_string(),
                start_time: start,
                end_time: end,
            },
        },
    )
}

// ── Cook bodies ──

fn apc_start(device: &Device, cook: &SousVideCook) -> ApcStart {
    ApcStart {
        cooker_id: device.id.to_string(),
        hardware: device.hardware.clone(),
        target_temperature: cook.temperature.to_celsius(),
        unit: TemperatureUnit::Celsius.code(),
        timer: timer_secs(cook.timer),
    }
}

/// Hardware settings shared by both oven generations.
struct OvenProfile {
    bulb: BulbMode,
    fan: u8,
    elements: HeatingElements,
    steam: Option<SteamGenerators>,
}

fn oven_profile(mode: OvenMode, generation: OvenGeneration) -> OvenProfile {
    match (mode, generation) {
        (OvenMode::SousVide, _) => OvenProfile {
            bulb: BulbMode::Wet,
            fan: 100,
            elements: HeatingElements::new(false, false, true),
            steam: Some(SteamGenerators::relative(100)),
        },
        (OvenMode::Roast, _) => OvenProfile {
            bulb: BulbMode::Dry,
            fan: 75,
            elements: HeatingElements::new(false, true, true),
            steam: None,
        },
        (OvenMode::Steam { humidity }, OvenGeneration::V2) => OvenProfile {
            bulb: BulbMode::Dry,
            fan: 100,
            elements: HeatingElements::new(false, true, true),
            steam: Some(SteamGenerators::relative(humidity)),
        },
        (OvenMode::Steam { humidity }, OvenGeneration::V1) => OvenProfile {
            bulb: BulbMode::Dry,
            fan: 50,
            elements: HeatingElements::new(true, true, true),
            steam: Some(SteamGenerators::relative(humidity)),
        },
    }
}

fn apo_cook_v2(device: &Device, cook: &OvenCook) -> ApoCookV2 {
    let profile = oven_profile(cook.mode, OvenGeneration::V2);
    let setpoint = Setpoint {
        celsius: cook.temperature.to_celsius(),
        fahrenheit: None,
    };
    let stage = StageV2 {
        id: new_request_id(),
        action: StageAction {
            kind: "cook",
            fan: Fan { speed: profile.fan },
            heating_elements: profile.elements,
            exhaust_vent: ExhaustVent::CLOSED,
            steam_generators: profile.steam,
            temperature_bulbs: TemperatureBulbs::new(profile.bulb, setpoint),
            timer: Timer {
                initial: timer_secs(cook.timer),
            },
        },
        exit: StageExit::TIMER_COMPLETED,
        title: String::new(),
        description: String::new(),
        rack_position: RACK_POSITION,
    };
    ApoCookV2 {
        stages: vec![stage],
        cook_id: new_request_id(),
        cooker_id: device.id.to_string(),
        cookable_id: String::new(),
        title: String::new(),
        hardware: device.hardware.clone(),
        origin_source: ORIGIN_SOURCE,
        cookable_type: COOKABLE_TYPE,
    }
}

/// Two identical stages, preheat then cook. The v1 format has no timer node.
fn apo_cook_v1(cook: &OvenCook) -> ApoCookV1 {
    let profile = oven_profile(cook.mode, OvenGeneration::V1);
    let stage = |kind: StageKind| StageV1 {
        step_type: "stage",
        id: new_request_id(),
        title: String::new(),
        description: String::new(),
        kind,
        user_action_required: false,
        temperature_bulbs: TemperatureBulbs::new(
            profile.bulb,
            Setpoint {
                celsius: cook.temperature.to_celsius(),
                fahrenheit: Some(cook.temperature.to_fahrenheit()),
            },
        ),
        heating_elements: profile.elements,
        fan: Fan { speed: profile.fan },
        vent: Vent { open: false },
        rack_position: RACK_POSITION,
        stage_transition_type: StageTransition::Automatic,
        steam_generators: profile.steam,
    };
    ApoCookV1 {
        cook_id: new_request_id(),
        stages: vec![stage(StageKind::Preheat), stage(StageKind::Cook)],
    }
}

fn timer_secs(timer: Duration) -> u64 {
    timer.as_secs()
}

// ── Export replies ───────────────────────────────────────────────────

/// Interpret the reply to an export request.
pub(crate) fn export_result(device: &Device, reply: &Message) -> Result<TelemetryExport, CoreError> {
    let unavailable = |reason: String| CoreError::ExportUnavailable {
        device: device.name.clone(),
        reason,
    };

    let parsed: ExportReply = serde_json::from_value(reply.payload.clone())
        .map_err(|e| unavailable(format!("unexpected reply: {e}")))?;

    if let Some(error) = parsed.error {
        return Err(unavailable(error));
    }
    if let Some(status) = parsed.status.as_deref() {
        if !status.eq_ignore_ascii_case("ok") && !status.eq_ignore_ascii_case("success") {
            return Err(unavailable(format!("service reported status '{status}'")));
        }
    }

    let urls: Vec<Url> = parsed
        .urls
        .iter()
        .filter_map(|raw| match Url::parse(raw) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(url = %raw, error = %e, "skipping malformed export URL");
                None
            }
        })
        .collect();

    if urls.is_empty() {
        return Err(unavailable("no recorded cook sessions in this range".into()));
    }

    Ok(TelemetryExport {
        device: device.id.clone(),
        urls,
    })
}
