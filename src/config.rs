//! Compile-time device configuration.
//!
//! Every value here is generated by `build.rs` from `cfg.toml` (or the file
//! named by `AQUAPONICS_CFG`) and baked into the image as `const` items.
//! Nothing is mutable at runtime.
//!
//! ```text
//!   cfg.toml ──build.rs──▶ $OUT_DIR/config.rs ──include!──▶ WIFI · CONTROLLER · CAMERA
//! ```
//!
//! `build.rs` refuses to generate a fleet with zero intervals or colliding
//! MQTT client IDs; the `validate` functions below re-check the full set of
//! invariants at boot and in tests.

use core::fmt;

use crate::adapters::utils::is_printable_ascii;
use crate::app::ports::MAX_INBOUND_TOPIC;
use crate::pins;

/// Broker port used when `cfg.toml` does not name one.
pub const DEFAULT_MQTT_PORT: u16 = 1883;

/// MQTT 3.1.1 caps topic names at a u16 length prefix.
pub const MAX_TOPIC_LEN: usize = 65_535;

/// Longest client identifier accepted (with MAC suffix room left over).
pub const MAX_CLIENT_ID_LEN: usize = 64;

/// Capacity of the `mqtt://host:port` string handed to the client.
pub const MAX_BROKER_URL_LEN: usize = 128;

/// Scheme, colon and the widest port around the host.
const BROKER_URL_OVERHEAD: usize = "mqtt://:65535".len();

// ───────────────────────────────────────────────────────────────
// Types
// ───────────────────────────────────────────────────────────────

/// Network name and pre-shared key for station mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WifiSettings {
    pub ssid: &'static str,
    /// Empty for an open network.
    pub password: &'static str,
}

/// Broker endpoint and topics for one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MqttSettings {
    /// Hostname or IP, no scheme.
    pub broker: &'static str,
    pub port: u16,
    /// Must be unique among every client sharing the broker.
    pub client_id: &'static str,
    /// Topic the device subscribes to for inbound commands.
    pub cmd_topic: &'static str,
    /// Topic the device publishes state on, if it publishes at all.
    pub status_topic: Option<&'static str>,
    /// Append `-xxyyzz` from the factory MAC to `client_id` at boot.
    pub append_mac_suffix: bool,
}

impl MqttSettings {
    /// `mqtt://host:port`, as the ESP-IDF client expects.
    pub fn broker_url(&self) -> Result<heapless::String<MAX_BROKER_URL_LEN>, ConfigError> {
        use core::fmt::Write;
        let mut url = heapless::String::new();
        write!(url, "mqtt://{}:{}", self.broker, self.port)
            .map_err(|_| ConfigError::ValidationFailed("mqtt.broker too long"))?;
        Ok(url)
    }
}

/// Logical function → GPIO number on the controller board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinMap {
    pub dht: i32,
    pub relay_pump: i32,
    pub relay_light: i32,
    pub float_switch: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerConfig {
    pub mqtt: MqttSettings,
    pub pins: PinMap,
    /// Relay boards driven LOW to energise the coil.
    pub relay_active_low: bool,
    /// Float switch pulls the input LOW when the tank is full.
    pub float_switch_active_low: bool,
    /// How often sensor status is published.
    pub publish_interval_ms: u32,
    /// Delay between broker reconnect attempts.
    pub reconnect_interval_ms: u32,
}

/// JPEG resolutions the camera node may be configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSize {
    /// 320×240
    Qvga,
    /// 640×480
    Vga,
    /// 800×600
    Svga,
    /// 1024×768
    Xga,
}

impl FrameSize {
    pub const fn dimensions(self) -> (u16, u16) {
        match self {
            Self::Qvga => (320, 240),
            Self::Vga => (640, 480),
            Self::Svga => (800, 600),
            Self::Xga => (1024, 768),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraConfig {
    pub mqtt: MqttSettings,
    /// Inference server base URL; `/predict` is appended.
    pub server_url: &'static str,
    pub capture_interval_ms: u32,
    pub reconnect_interval_ms: u32,
    pub frame_size: FrameSize,
    /// esp32-camera scale: 0 best, 63 worst.
    pub jpeg_quality: u8,
}

// ───────────────────────────────────────────────────────────────
// Errors
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A field failed range validation; the string names it.
    ValidationFailed(&'static str),
    /// Two devices would connect to the broker with the same client ID.
    DuplicateClientId(&'static str),
    /// A GPIO is assigned twice, out of range, or unusable for its role.
    InvalidPin(i32),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
            Self::DuplicateClientId(id) => write!(f, "MQTT client ID '{id}' is not unique"),
            Self::InvalidPin(pin) => write!(f, "GPIO {pin} is not usable here"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn positive(value: u32, field: &'static str) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::ValidationFailed(field));
    }
    Ok(())
}

/// Topic a device publishes to: no wildcards, no NUL, non-empty.
pub fn validate_topic_name(topic: &str) -> Result<(), ConfigError> {
    if topic.is_empty() || topic.len() > MAX_TOPIC_LEN {
        return Err(ConfigError::ValidationFailed("topic length"));
    }
    if topic.contains(['+', '#', '\0']) {
        return Err(ConfigError::ValidationFailed("publish topic contains wildcard or NUL"));
    }
    Ok(())
}

/// Subscription filter: `+` and `#` only as whole levels, `#` only last.
pub fn validate_topic_filter(filter: &str) -> Result<(), ConfigError> {
    if filter.is_empty() || filter.len() > MAX_TOPIC_LEN || filter.contains('\0') {
        return Err(ConfigError::ValidationFailed("topic filter length or NUL"));
    }
    let mut levels = filter.split('/').peekable();
    while let Some(level) = levels.next() {
        let last = levels.peek().is_none();
        match level {
            "+" => {}
            "#" if last => {}
            "#" => return Err(ConfigError::ValidationFailed("'#' must be the last level")),
            other if other.contains(['+', '#']) => {
                return Err(ConfigError::ValidationFailed("wildcard must fill a whole level"));
            }
            _ => {}
        }
    }
    Ok(())
}

/// Whether `topic` is delivered to a subscription on `filter`.
pub fn topic_matches(filter: &str, topic: &str) -> bool {
    let mut f = filter.split('/');
    let mut t = topic.split('/');
    loop {
        match (f.next(), t.next()) {
            (Some("#"), _) => return true,
            (Some("+"), Some(_)) => {}
            (Some(a), Some(b)) if a == b => {}
            (None, None) => return true,
            _ => return false,
        }
    }
}

pub fn validate_client_id(id: &str) -> Result<(), ConfigError> {
    if id.is_empty() || id.len() > MAX_CLIENT_ID_LEN {
        return Err(ConfigError::ValidationFailed("client_id length"));
    }
    if !is_printable_ascii(id) {
        return Err(ConfigError::ValidationFailed("client_id must be printable ASCII"));
    }
    Ok(())
}

impl WifiSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ssid.is_empty() || self.ssid.len() > 32 || !is_printable_ascii(self.ssid) {
            return Err(ConfigError::ValidationFailed("wifi.ssid"));
        }
        let psk = self.password.len();
        if psk != 0 && !(8..=64).contains(&psk) {
            return Err(ConfigError::ValidationFailed("wifi.password"));
        }
        Ok(())
    }
}

impl MqttSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.broker.is_empty() || self.broker.contains("://") {
            return Err(ConfigError::ValidationFailed("mqtt.broker must be a bare host"));
        }
        if self.broker.len() + BROKER_URL_OVERHEAD > MAX_BROKER_URL_LEN {
            return Err(ConfigError::ValidationFailed("mqtt.broker too long"));
        }
        if self.port == 0 {
            return Err(ConfigError::ValidationFailed("mqtt.port"));
        }
        validate_client_id(self.client_id)?;
        validate_topic_filter(self.cmd_topic)?;
        // Inbound topics are copied into a fixed buffer; longer ones are dropped.
        if self.cmd_topic.len() > MAX_INBOUND_TOPIC {
            return Err(ConfigError::ValidationFailed("mqtt.cmd_topic too long"));
        }
        if let Some(status) = self.status_topic {
            validate_topic_name(status)?;
        }
        Ok(())
    }
}

impl ControllerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive(self.publish_interval_ms, "controller.publish_interval_ms")?;
        positive(self.reconnect_interval_ms, "controller.reconnect_interval_ms")?;
        self.mqtt.validate()?;
        if self.mqtt.status_topic.is_none() {
            return Err(ConfigError::ValidationFailed("controller.mqtt.status_topic"));
        }
        pins::validate_pin_map(&self.pins)
    }
}

impl CameraConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive(self.capture_interval_ms, "camera.capture_interval_ms")?;
        positive(self.reconnect_interval_ms, "camera.reconnect_interval_ms")?;
        self.mqtt.validate()?;
        let rest = self
            .server_url
            .strip_prefix("https://")
            .or_else(|| self.server_url.strip_prefix("http://"))
            .ok_or(ConfigError::ValidationFailed("camera.server_url scheme"))?;
        if rest.is_empty() || rest.starts_with('/') {
            return Err(ConfigError::ValidationFailed("camera.server_url host"));
        }
        if self.jpeg_quality > 63 {
            return Err(ConfigError::ValidationFailed("camera.jpeg_quality"));
        }
        Ok(())
    }
}

/// Every client ID in `ids` must differ from every other.
///
/// A broker disconnects the older session when a second client connects
/// with the same ID, so two boards sharing an ID knock each other offline.
pub fn ensure_unique_client_ids(ids: &[&'static str]) -> Result<(), ConfigError> {
    for (i, a) in ids.iter().enumerate() {
        if ids[i + 1..].contains(a) {
            return Err(ConfigError::DuplicateClientId(*a));
        }
    }
    Ok(())
}

/// Check the whole compiled fleet.
pub fn validate_all() -> Result<(), ConfigError> {
    WIFI.validate()?;
    CONTROLLER.validate()?;
    CAMERA.validate()?;
    ensure_unique_client_ids(&[CONTROLLER.mqtt.client_id, CAMERA.mqtt.client_id])
}

// config values are generated at compile time
include!(concat!(env!("OUT_DIR"), "/config.rs"));
