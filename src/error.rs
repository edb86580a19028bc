//! Unified error types for the Aquaponics Mini firmware.
//!
//! Each subsystem has its own small enum; all of them convert into
//! [`Error`] so the main loops handle faults in one place.  Variants are
//! `Copy` and carry no heap data.

use core::fmt;

pub use crate::config::ConfigError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor could not be read or returned implausible data.
    Sensor(SensorError),
    /// A relay could not be driven.
    Actuator(ActuatorError),
    /// WiFi, MQTT or HTTP failed.
    Comms(CommsError),
    /// The camera could not be initialised or produced no frame.
    Camera(CameraError),
    /// Configuration failed validation.
    Config(ConfigError),
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Comms(e) => write!(f, "comms: {e}"),
            Self::Camera(e) => write!(f, "camera: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The sensor did not answer or a bit edge never arrived.
    Timeout,
    /// The DHT22 checksum byte did not match the payload.
    Checksum,
    /// Decoded value is outside the sensor's physical range.
    OutOfRange,
    /// GPIO read or write returned an error.
    Gpio,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "sensor timeout"),
            Self::Checksum => write!(f, "checksum mismatch"),
            Self::OutOfRange => write!(f, "reading out of range"),
            Self::Gpio => write!(f, "GPIO access failed"),
        }
    }
}

impl std::error::Error for SensorError {}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// Setting the relay GPIO level failed.
    GpioWriteFailed,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
        }
    }
}

impl std::error::Error for ActuatorError {}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Communications errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommsError {
    WifiConnectFailed,
    WifiDisconnected,
    MqttConnectFailed,
    MqttSubscribeFailed,
    MqttPublishFailed,
    /// Operation needs a broker session that is not up.
    NotConnected,
    /// TCP/TLS connection or request write failed.
    HttpRequestFailed,
    /// Server answered with a non-2xx status.
    HttpStatus(u16),
    /// Response body was not the expected JSON.
    InvalidResponse,
    /// Payload does not fit the transfer buffer.
    PayloadTooLarge,
}

impl fmt::Display for CommsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WifiConnectFailed => write!(f, "WiFi connect failed"),
            Self::WifiDisconnected => write!(f, "WiFi disconnected"),
            Self::MqttConnectFailed => write!(f, "MQTT connect failed"),
            Self::MqttSubscribeFailed => write!(f, "MQTT subscribe failed"),
            Self::MqttPublishFailed => write!(f, "MQTT publish failed"),
            Self::NotConnected => write!(f, "not connected"),
            Self::HttpRequestFailed => write!(f, "HTTP request failed"),
            Self::HttpStatus(code) => write!(f, "HTTP status {code}"),
            Self::InvalidResponse => write!(f, "invalid server response"),
            Self::PayloadTooLarge => write!(f, "payload too large"),
        }
    }
}

impl std::error::Error for CommsError {}

impl From<CommsError> for Error {
    fn from(e: CommsError) -> Self {
        Self::Comms(e)
    }
}

// ---------------------------------------------------------------------------
// Camera errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraError {
    /// `esp_camera_init` returned the contained `esp_err_t`.
    InitFailed(i32),
    /// The driver returned no frame buffer.
    CaptureFailed,
    /// Frame is not a JPEG (missing SOI marker).
    NotJpeg,
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitFailed(code) => write!(f, "camera init failed (esp_err {code})"),
            Self::CaptureFailed => write!(f, "frame capture failed"),
            Self::NotJpeg => write!(f, "frame is not JPEG"),
        }
    }
}

impl std::error::Error for CameraError {}

impl From<CameraError> for Error {
    fn from(e: CameraError) -> Self {
        Self::Camera(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
