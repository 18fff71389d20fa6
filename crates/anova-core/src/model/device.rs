// ── Device domain types ──

use std::fmt;

use anova_api::Accessory;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::cook::CookMode;

/// Vendor device identifier (`cookerId` on the wire).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for DeviceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Device family. Menus and cook modes are exhaustive matches on this.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DeviceKind {
    /// Anova Precision Cooker (immersion circulator).
    Cooker,
    /// Anova Precision Oven.
    Oven,
}

impl DeviceKind {
    pub fn accessory(self) -> Accessory {
        match self {
            Self::Cooker => Accessory::Apc,
            Self::Oven => Accessory::Apo,
        }
    }

    pub fn from_accessory(accessory: Accessory) -> Self {
        match accessory {
            Accessory::Apc => Self::Cooker,
            Accessory::Apo => Self::Oven,
        }
    }

    /// Cook modes this family supports, in menu order.
    pub fn cook_modes(self) -> &'static [CookMode] {
        match self {
            Self::Cooker => &[CookMode::SousVide],
            Self::Oven => &[CookMode::SousVide, CookMode::Roast, CookMode::Steam],
        }
    }
}

/// Oven cook-frame generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OvenGeneration {
    /// Two-stage (preheat + cook) frames with Celsius and Fahrenheit set points.
    V1,
    /// Single-stage `do`/`exit` frames.
    V2,
}

/// Hardware tag of the second-generation oven.
pub const OVEN_V2_HARDWARE: &str = "oven_v2";

/// A device owned by the account. Immutable once discovered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub kind: DeviceKind,
    /// Vendor hardware tag (`a5`, `oven_v1`, `oven_v2`, ...), empty when unreported.
    pub hardware: String,
}

impl Device {
    /// `None` for cookers.
    pub fn oven_generation(&self) -> Option<OvenGeneration> {
        match self.kind {
            DeviceKind::Cooker => None,
            DeviceKind::Oven if self.hardware == OVEN_V2_HARDWARE => Some(OvenGeneration::V2),
            DeviceKind::Oven => Some(OvenGeneration::V1),
        }
    }

    /// Match by exact id, or by case-insensitive name.
    pub fn matches(&self, identifier: &str) -> bool {
        self.id.as_str() == identifier || self.name.eq_ignore_ascii_case(identifier)
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.name, self.kind, self.id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn oven(hardware: &str) -> Device {
        Device {
            id: DeviceId::new("o1"),
            name: "Kitchen Oven".into(),
            kind: DeviceKind::Oven,
            hardware: hardware.into(),
        }
    }

    #[test]
    fn oven_generation_follows_hardware_tag() {
        assert_eq!(oven("oven_v2").oven_generation(), Some(OvenGeneration::V2));
        assert_eq!(oven("oven_v1").oven_generation(), Some(OvenGeneration::V1));
        assert_eq!(oven("").oven_generation(), Some(OvenGeneration::V1));
    }

    #[test]
    fn cookers_have_no_generation_and_one_mode() {
        let cooker = Device {
            id: DeviceId::new("c1"),
            name: "Stick".into(),
            kind: DeviceKind::Cooker,
            hardware: "a5".into(),
        };
        assert_eq!(cooker.oven_generation(), None);
        assert_eq!(DeviceKind::Cooker.cook_modes(), &[CookMode::SousVide]);
        assert_eq!(DeviceKind::Oven.cook_modes().len(), 3);
    }

    #[test]
    fn matches_by_id_or_name() {
        let device = oven("oven_v2");
        assert!(device.matches("o1"));
        assert!(device.matches("kitchen oven"));
        assert!(!device.matches("o2"));
    }

    #[test]
    fn kind_round_trips_through_accessory() {
        for kind in [DeviceKind::Cooker, DeviceKind::Oven] {
            assert_eq!(DeviceKind::from_accessory(kind.accessory()), kind);
        }
        assert_eq!("OVEN".parse::<DeviceKind>().unwrap(), DeviceKind::Oven);
    }
}
