//! Mock adapters for integration tests.
//!
//! Each mock records every call so tests can assert on the full history
//! without touching GPIO, sockets or the camera.

use std::collections::VecDeque;

use aquaponics::app::events::AppEvent;
use aquaponics::app::ports::{
    ActuatorPort, CameraPort, EventSink, InboundMessage, InferencePort, MessagingPort, SensorPort,
};
use aquaponics::app::status::PlantHealth;
use aquaponics::config::{CameraConfig, ControllerConfig, FrameSize, MqttSettings, PinMap};
use aquaponics::drivers::camera::{Frame, JPEG_EOI, JPEG_SOI};
use aquaponics::error::{ActuatorError, CameraError, CommsError};
use aquaponics::sensors::SensorSnapshot;
use aquaponics::sensors::float_switch::WaterLevel;

// ── Configs ───────────────────────────────────────────────────

pub const CMD_TOPIC: &str = "aquaponics/cmd";
pub const STATUS_TOPIC: &str = "aquaponics/status";
pub const CAMERA_CMD_TOPIC: &str = "aquaponics/camera_cmd";
pub const CAMERA_REPORT_TOPIC: &str = "aquaponics/camera_status";

pub fn controller_config() -> ControllerConfig {
    ControllerConfig {
        mqtt: MqttSettings {
            broker: "broker.hivemq.com",
            port: 1883,
            client_id: "esp8266_aquaponics",
            cmd_topic: CMD_TOPIC,
            status_topic: Some(STATUS_TOPIC),
            append_mac_suffix: false,
        },
        pins: PinMap { dht: 2, relay_pump: 14, relay_light: 12, float_switch: 13 },
        relay_active_low: true,
        float_switch_active_low: true,
        publish_interval_ms: 5_000,
        reconnect_interval_ms: 5_000,
    }
}

pub fn camera_config(report: bool) -> CameraConfig {
    CameraConfig {
        mqtt: MqttSettings {
            broker: "broker.hivemq.com",
            port: 1883,
            client_id: "esp32cam_ai",
            cmd_topic: CAMERA_CMD_TOPIC,
            status_topic: report.then_some(CAMERA_REPORT_TOPIC),
            append_mac_suffix: false,
        },
        server_url: "https://aquaponics-mini.onrender.com",
        capture_interval_ms: 30_000,
        reconnect_interval_ms: 5_000,
        frame_size: FrameSize::Vga,
        jpeg_quality: 12,
    }
}

// ── Hardware ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayCall {
    Pump(bool),
    Light(bool),
}

pub struct MockHardware {
    pub calls: Vec<RelayCall>,
    pub snapshot: SensorSnapshot,
    pub reads: u32,
    pub fail_writes: bool,
    pump: bool,
    light: bool,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            snapshot: SensorSnapshot {
                temperature_c: Some(26.4),
                humidity_pct: Some(71.0),
                water: WaterLevel::Full,
            },
            reads: 0,
            fail_writes: false,
            pump: false,
            light: false,
        }
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockHardware {
    fn read_all(&mut self, _now_ms: u64) -> SensorSnapshot {
        self.reads += 1;
        self.snapshot
    }
}

impl ActuatorPort for MockHardware {
    fn set_pump(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.calls.push(RelayCall::Pump(on));
        if self.fail_writes {
            return Err(ActuatorError::GpioWriteFailed);
        }
        self.pump = on;
        Ok(())
    }

    fn set_light(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.calls.push(RelayCall::Light(on));
        if self.fail_writes {
            return Err(ActuatorError::GpioWriteFailed);
        }
        self.light = on;
        Ok(())
    }

    fn pump_on(&self) -> bool {
        self.pump
    }

    fn light_on(&self) -> bool {
        self.light
    }
}

// ── Messaging ─────────────────────────────────────────────────

pub struct MockMqtt {
    pub connected: bool,
    pub polls: Vec<u64>,
    pub published: Vec<(String, Vec<u8>)>,
    pub inbound: VecDeque<InboundMessage>,
}

#[allow(dead_code)]
impl MockMqtt {
    pub fn online() -> Self {
        Self { connected: true, polls: Vec::new(), published: Vec::new(), inbound: VecDeque::new() }
    }

    pub fn offline() -> Self {
        Self { connected: false, ..Self::online() }
    }

    pub fn push(&mut self, topic: &str, payload: &[u8]) {
        let msg = InboundMessage::new(topic, payload).expect("test message fits");
        self.inbound.push_back(msg);
    }

    /// Published payloads on `topic`, parsed as JSON.
    pub fn json_on(&self, topic: &str) -> Vec<serde_json::Value> {
        self.published
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, p)| serde_json::from_slice(p).expect("published JSON"))
            .collect()
    }
}

impl MessagingPort for MockMqtt {
    fn poll(&mut self, now_ms: u64) {
        self.polls.push(now_ms);
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError> {
        if !self.connected {
            return Err(CommsError::NotConnected);
        }
        self.published.push((topic.to_owned(), payload.to_vec()));
        Ok(())
    }

    fn take_inbound(&mut self) -> Option<InboundMessage> {
        self.inbound.pop_front()
    }
}

// ── Camera + inference ────────────────────────────────────────

pub struct MockCamera {
    pub captures: u32,
    pub fail_next: bool,
}

#[allow(dead_code)]
impl MockCamera {
    pub fn new() -> Self {
        Self { captures: 0, fail_next: false }
    }
}

impl CameraPort for MockCamera {
    fn capture(&mut self) -> Result<Frame, CameraError> {
        if std::mem::take(&mut self.fail_next) {
            return Err(CameraError::CaptureFailed);
        }
        self.captures += 1;
        let mut jpeg = JPEG_SOI.to_vec();
        jpeg.extend_from_slice(&[0x42; 32]);
        jpeg.extend_from_slice(&JPEG_EOI);
        Ok(Frame { jpeg, width: 640, height: 480 })
    }
}

pub struct MockInference {
    pub answers: VecDeque<Result<PlantHealth, CommsError>>,
    pub uploads: Vec<usize>,
}

#[allow(dead_code)]
impl MockInference {
    pub fn new() -> Self {
        Self { answers: VecDeque::new(), uploads: Vec::new() }
    }

    pub fn answer(mut self, a: Result<PlantHealth, CommsError>) -> Self {
        self.answers.push_back(a);
        self
    }
}

impl InferencePort for MockInference {
    fn classify(&mut self, jpeg: &[u8]) -> Result<PlantHealth, CommsError> {
        self.uploads.push(jpeg.len());
        self.answers.pop_front().unwrap_or(Ok(PlantHealth::Healthy))
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
