//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ControllerService / CameraService (domain)
//! ```
//!
//! Driven adapters (sensors, relays, MQTT, camera, inference server, event
//! sinks) implement these traits.  The services consume them via generics,
//! so the domain core never touches hardware or sockets directly.

use crate::drivers::camera::Frame;
use crate::error::{ActuatorError, CameraError, CommsError};
use crate::sensors::SensorSnapshot;

use super::status::PlantHealth;

/// Longest topic carried on an inbound message.
pub const MAX_INBOUND_TOPIC: usize = 128;
/// Longest command payload accepted; larger messages are dropped.
pub const MAX_INBOUND_PAYLOAD: usize = 256;

/// One message received on a subscribed topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: heapless::String<MAX_INBOUND_TOPIC>,
    pub payload: heapless::Vec<u8, MAX_INBOUND_PAYLOAD>,
}

impl InboundMessage {
    /// `None` if either part exceeds its fixed capacity.
    pub fn new(topic: &str, payload: &[u8]) -> Option<Self> {
        let mut t = heapless::String::new();
        t.push_str(topic).ok()?;
        let p = heapless::Vec::from_slice(payload).ok()?;
        Some(Self { topic: t, payload: p })
    }
}

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

pub trait SensorPort {
    /// Sample every sensor and return a unified snapshot.
    fn read_all(&mut self, now_ms: u64) -> SensorSnapshot;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

pub trait ActuatorPort {
    fn set_pump(&mut self, on: bool) -> Result<(), ActuatorError>;
    fn set_light(&mut self, on: bool) -> Result<(), ActuatorError>;
    fn pump_on(&self) -> bool;
    fn light_on(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Messaging port (driven adapter: domain ↔ MQTT broker)
// ───────────────────────────────────────────────────────────────

pub trait MessagingPort {
    /// Drive connection upkeep: reconnect on schedule, resubscribe.
    fn poll(&mut self, now_ms: u64);

    fn is_connected(&self) -> bool;

    /// Fire-and-forget publish (QoS 0).
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError>;

    /// Next queued inbound message, if any.
    fn take_inbound(&mut self) -> Option<InboundMessage>;
}

// ───────────────────────────────────────────────────────────────
// Camera + inference ports (camera node)
// ───────────────────────────────────────────────────────────────

pub trait CameraPort {
    fn capture(&mut self) -> Result<Frame, CameraError>;
}

/// Remote plant-health classifier.
pub trait InferencePort {
    fn classify(&mut self, jpeg: &[u8]) -> Result<PlantHealth, CommsError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
