// ── Cook parameters and validation ──
//
// `CookParams` is what a caller collects (possibly incomplete, possibly
// in Fahrenheit). `CookParams::into_command` validates it against the
// device family and yields a `CookCommand` that is known to be sendable.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::device::DeviceKind;
use crate::error::CoreError;

// ── Units ────────────────────────────────────────────────────────────

/// Display and device temperature unit. Wire form is `C` / `F`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemperatureUnit {
    #[default]
    #[serde(rename = "C", alias = "c", alias = "celsius")]
    Celsius,
    #[serde(rename = "F", alias = "f", alias = "fahrenheit")]
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn code(self) -> &'static str {
        match self {
            Self::Celsius => "C",
            Self::Fahrenheit => "F",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Celsius => "°C",
            Self::Fahrenheit => "°F",
        }
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for TemperatureUnit {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "c" | "celsius" => Ok(Self::Celsius),
            "f" | "fahrenheit" => Ok(Self::Fahrenheit),
            other => Err(CoreError::invalid(format!(
                "unknown temperature unit '{other}' (expected C or F)"
            ))),
        }
    }
}

/// A temperature as the user entered it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Temperature {
    pub value: f64,
    pub unit: TemperatureUnit,
}

impl Temperature {
    pub fn new(value: f64, unit: TemperatureUnit) -> Self {
        Self { value, unit }
    }

    pub fn celsius(value: f64) -> Self {
        Self::new(value, TemperatureUnit::Celsius)
    }

    pub fn fahrenheit(value: f64) -> Self {
        Self::new(value, TemperatureUnit::Fahrenheit)
    }

    pub fn to_celsius(self) -> f64 {
        match self.unit {
            TemperatureUnit::Celsius => self.value,
            TemperatureUnit::Fahrenheit => (self.value - 32.0) * 5.0 / 9.0,
        }
    }

    pub fn to_fahrenheit(self) -> f64 {
        match self.unit {
            TemperatureUnit::Celsius => self.value * 9.0 / 5.0 + 32.0,
            TemperatureUnit::Fahrenheit => self.value,
        }
    }

    pub fn to_unit(self, unit: TemperatureUnit) -> f64 {
        match unit {
            TemperatureUnit::Celsius => self.to_celsius(),
            TemperatureUnit::Fahrenheit => self.to_fahrenheit(),
        }
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}{}", self.value, self.unit.symbol())
    }
}

// ── Modes ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum CookMode {
    SousVide,
    Roast,
    Steam,
}

/// Inclusive Celsius range accepted for a device family and mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureRange {
    pub min_c: f64,
    pub max_c: f64,
}

impl TemperatureRange {
    pub const COOKER: Self = Self {
        min_c: 0.0,
        max_c: 95.0,
    };
    pub const OVEN_WET_BULB: Self = Self {
        min_c: 25.0,
        max_c: 100.0,
    };
    pub const OVEN_DRY_BULB: Self = Self {
        min_c: 25.0,
        max_c: 250.0,
    };

    pub fn for_mode(kind: DeviceKind, mode: CookMode) -> Self {
        match (kind, mode) {
            (DeviceKind::Cooker, _) => Self::COOKER,
            (DeviceKind::Oven, CookMode::SousVide) => Self::OVEN_WET_BULB,
            (DeviceKind::Oven, CookMode::Roast | CookMode::Steam) => Self::OVEN_DRY_BULB,
        }
    }

    pub fn contains(self, celsius: f64) -> bool {
        celsius >= self.min_c && celsius <= self.max_c
    }

    /// Bounds expressed in `unit`, for prompts.
    pub fn in_unit(self, unit: TemperatureUnit) -> (f64, f64) {
        (
            Temperature::celsius(self.min_c).to_unit(unit),
            Temperature::celsius(self.max_c).to_unit(unit),
        )
    }
}

pub const MIN_TIMER: Duration = Duration::from_secs(1);
pub const MAX_TIMER: Duration = Duration::from_secs(100 * 60 * 60);
pub const MAX_HUMIDITY: u8 = 100;

// ── Parameters ───────────────────────────────────────────────────────

/// Caller-supplied cook parameters. Every field is optional so missing
/// input surfaces as `InvalidParameters` rather than a panic or a default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CookParams {
    /// Defaults to sous vide for cookers; required for ovens.
    pub mode: Option<CookMode>,
    pub temperature: Option<Temperature>,
    pub timer: Option<Duration>,
    /// Relative humidity for oven steam cooking.
    pub humidity: Option<u8>,
}

impl CookParams {
    pub fn sous_vide(temperature: Temperature, timer: Duration) -> Self {
        Self {
            mode: Some(CookMode::SousVide),
            temperature: Some(temperature),
            timer: Some(timer),
            humidity: None,
        }
    }

    pub fn roast(temperature: Temperature, timer: Duration) -> Self {
        Self {
            mode: Some(CookMode::Roast),
            ..Self::sous_vide(temperature, timer)
        }
    }

    pub fn steam(temperature: Temperature, timer: Duration, humidity: u8) -> Self {
        Self {
            mode: Some(CookMode::Steam),
            humidity: Some(humidity),
            ..Self::sous_vide(temperature, timer)
        }
    }

    /// Validate against `kind` and build the matching command variant.
    pub fn into_command(self, kind: DeviceKind) -> Result<CookCommand, CoreError> {
        let mode = match (kind, self.mode) {
            (DeviceKind::Cooker, None | Some(CookMode::SousVide)) => CookMode::SousVide,
            (DeviceKind::Cooker, Some(other)) => {
                return Err(CoreError::invalid(format!(
                    "{other} is not supported by precision cookers"
                )));
            }
            (DeviceKind::Oven, Some(mode)) => mode,
            (DeviceKind::Oven, None) => {
                return Err(CoreError::invalid("an oven cook needs a mode"));
            }
        };

        let temperature = self
            .temperature
            .ok_or_else(|| CoreError::invalid("target temperature is required"))?;
        let timer = self
            .timer
            .ok_or_else(|| CoreError::invalid("cook time is required"))?;

        validate_temperature(kind, mode, temperature)?;
        validate_timer(timer)?;

        match kind {
            DeviceKind::Cooker => Ok(CookCommand::Cooker(SousVideCook { temperature, timer })),
            DeviceKind::Oven => {
                let mode = match mode {
                    CookMode::SousVide => OvenMode::SousVide,
                    CookMode::Roast => OvenMode::Roast,
                    CookMode::Steam => {
                        let humidity = self
                            .humidity
                            .ok_or_else(|| CoreError::invalid("steam cooking needs a humidity"))?;
                        if humidity > MAX_HUMIDITY {
                            return Err(CoreError::invalid(format!(
                                "humidity must be between 0 and {MAX_HUMIDITY}%, got {humidity}%"
                            )));
                        }
                        OvenMode::Steam { humidity }
                    }
                };
                Ok(CookCommand::Oven(OvenCook {
                    mode,
                    temperature,
                    timer,
                }))
            }
        }
    }
}

fn validate_temperature(
    kind: DeviceKind,
    mode: CookMode,
    temperature: Temperature,
) -> Result<(), CoreError> {
    let celsius = temperature.to_celsius();
    let range = TemperatureRange::for_mode(kind, mode);
    if !celsius.is_finite() || !range.contains(celsius) {
        let (min, max) = range.in_unit(temperature.unit);
        return Err(CoreError::invalid(format!(
            "{temperature} is outside the {kind} {mode} range ({min:.0}-{max:.0}{})",
            temperature.unit.symbol()
        )));
    }
    Ok(())
}

fn validate_timer(timer: Duration) -> Result<(), CoreError> {
    if timer < MIN_TIMER || timer > MAX_TIMER {
        return Err(CoreError::invalid(format!(
            "cook time must be between 1 second and 100 hours, got {}s",
            timer.as_secs()
        )));
    }
    Ok(())
}

// ── Commands ─────────────────────────────────────────────────────────

/// A validated cook request for one device family.
#[derive(Debug, Clone, PartialEq)]
pub enum CookCommand {
    Cooker(SousVideCook),
    Oven(OvenCook),
}

impl CookCommand {
    pub fn kind(&self) -> DeviceKind {
        match self {
            Self::Cooker(_) => DeviceKind::Cooker,
            Self::Oven(_) => DeviceKind::Oven,
        }
    }

    pub fn temperature(&self) -> Temperature {
        match self {
            Self::Cooker(cook) => cook.temperature,
            Self::Oven(cook) => cook.temperature,
        }
    }

    pub fn timer(&self) -> Duration {
        match self {
            Self::Cooker(cook) => cook.timer,
            Self::Oven(cook) => cook.timer,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SousVideCook {
    pub temperature: Temperature,
    pub timer: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OvenMode {
    /// Wet bulb at 100% relative humidity.
    SousVide,
    /// Dry bulb, no steam.
    Roast,
    /// Dry bulb with steam at `humidity` percent.
    Steam { humidity: u8 },
}

impl OvenMode {
    pub fn cook_mode(self) -> CookMode {
        match self {
            Self::SousVide => CookMode::SousVide,
            Self::Roast => CookMode::Roast,
            Self::Steam { .. } => CookMode::Steam,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OvenCook {
    pub mode: OvenMode,
    pub temperature: Temperature,
    pub timer: Duration,
}
