//! Outbound MQTT payloads.
//!
//! The controller status document is consumed by the existing mobile
//! dashboard, which expects exactly these keys and the Vietnamese water
//! level strings:
//!
//! ```text
//! {"temp":27.4,"humidity":61.0,"water":"Đầy","pump":true,"light":false}
//! ```
//!
//! `temp`/`humidity` are `null` until the first good DHT22 conversion.

use serde::Serialize;

use crate::sensors::SensorSnapshot;
use crate::sensors::float_switch::WaterLevel;

/// Dashboard string for a full tank.
pub const WATER_FULL: &str = "Đầy";
/// Dashboard string for a low tank.
pub const WATER_LOW: &str = "Thấp";

pub fn water_label(level: WaterLevel) -> &'static str {
    match level {
        WaterLevel::Full => WATER_FULL,
        WaterLevel::Low => WATER_LOW,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ControllerStatus {
    pub temp: Option<f32>,
    pub humidity: Option<f32>,
    pub water: &'static str,
    pub pump: bool,
    pub light: bool,
}

impl ControllerStatus {
    pub fn new(snapshot: &SensorSnapshot, pump: bool, light: bool) -> Self {
        Self {
            temp: snapshot.temperature_c,
            humidity: snapshot.humidity_pct,
            water: water_label(snapshot.water),
            pump,
            light,
        }
    }

    pub fn to_json(&self) -> Vec<u8> {
        // Flat struct into a Vec: infallible (non-finite floats become null).
        serde_json::to_vec(self).unwrap_or_default()
    }
}

// ── Camera node ───────────────────────────────────────────────

/// Labels produced by the plant-health classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlantHealth {
    Healthy,
    Wilting,
    Yellowing,
    /// Server answered with a label this firmware does not know.
    Unknown,
}

impl PlantHealth {
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            l if l.eq_ignore_ascii_case("healthy") => Self::Healthy,
            l if l.eq_ignore_ascii_case("wilting") => Self::Wilting,
            l if l.eq_ignore_ascii_case("yellowing") => Self::Yellowing,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Wilting => "wilting",
            Self::Yellowing => "yellowing",
            Self::Unknown => "unknown",
        }
    }
}

/// Published after every successful classification, when the camera has
/// a status topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CameraReport {
    pub result: &'static str,
    pub captures: u32,
}

impl CameraReport {
    pub fn to_json(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }
}
