//! Controller node service — the hexagonal core of the relay board.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                 │    ControllerService      │
//! ActuatorPort ◀──│ sample · command · publish│◀──▶ MessagingPort
//!                 └──────────────────────────┘
//! ```
//!
//! Each [`tick`](ControllerService::tick):
//! 1. lets the messaging adapter reconnect/resubscribe,
//! 2. applies every queued relay command (publishing status right after),
//! 3. samples sensors once per [`SENSOR_SAMPLE_INTERVAL_MS`],
//! 4. publishes status once per `publish_interval_ms`.
//!
//! Status publishes while the broker is unreachable are skipped, not queued.

use log::{debug, info, warn};

use crate::config::{self, ControllerConfig};
use crate::error::Error;
use crate::sensors::SensorSnapshot;
use crate::timer::IntervalTimer;

use super::commands::parse_relay_command;
use super::events::{AppEvent, Node};
use super::ports::{ActuatorPort, EventSink, InboundMessage, MessagingPort, SensorPort};
use super::status::ControllerStatus;

/// Sensor sampling cadence, independent of the publish interval.
pub const SENSOR_SAMPLE_INTERVAL_MS: u32 = 1_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControllerStats {
    pub published: u32,
    pub skipped: u32,
    pub commands_applied: u32,
    pub commands_rejected: u32,
}

pub struct ControllerService {
    cmd_topic: &'static str,
    status_topic: Option<&'static str>,
    publish_timer: IntervalTimer,
    sample_timer: IntervalTimer,
    snapshot: SensorSnapshot,
    was_connected: bool,
    stats: ControllerStats,
}

impl ControllerService {
    pub fn new(cfg: &ControllerConfig) -> Self {
        Self {
            cmd_topic: cfg.mqtt.cmd_topic,
            status_topic: cfg.mqtt.status_topic,
            publish_timer: IntervalTimer::new(cfg.publish_interval_ms),
            sample_timer: IntervalTimer::immediate(SENSOR_SAMPLE_INTERVAL_MS),
            snapshot: SensorSnapshot::default(),
            was_connected: false,
            stats: ControllerStats::default(),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Put both relays in a known (off) state.
    pub fn start(&mut self, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        if let Err(e) = hw.set_pump(false).and_then(|()| hw.set_light(false)) {
            warn!("Relay init failed: {e}");
            sink.emit(&AppEvent::ActuatorFault(e.into()));
        }
        sink.emit(&AppEvent::Started(Node::Controller));
        info!("Controller started (cmd='{}', status={:?})", self.cmd_topic, self.status_topic);
    }

    // ── Per-tick orchestration ────────────────────────────────

    pub fn tick(
        &mut self,
        now_ms: u64,
        hw: &mut (impl SensorPort + ActuatorPort),
        mqtt: &mut impl MessagingPort,
        sink: &mut impl EventSink,
    ) {
        mqtt.poll(now_ms);
        let connected = mqtt.is_connected();
        if connected != self.was_connected {
            self.was_connected = connected;
            sink.emit(&AppEvent::ConnectionChanged { connected });
        }

        while let Some(msg) = mqtt.take_inbound() {
            self.handle_message(&msg, now_ms, hw, mqtt, sink);
        }

        if self.sample_timer.poll(now_ms) {
            self.snapshot = hw.read_all(now_ms);
        }

        if self.publish_timer.poll(now_ms) {
            if let Err(e) = self.publish_status(&*hw, mqtt, sink) {
                warn!("Status publish failed: {e}");
            }
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Apply a relay command and report the resulting state at once.
    pub fn handle_message(
        &mut self,
        msg: &InboundMessage,
        now_ms: u64,
        hw: &mut (impl SensorPort + ActuatorPort),
        mqtt: &mut impl MessagingPort,
        sink: &mut impl EventSink,
    ) {
        if !config::topic_matches(self.cmd_topic, &msg.topic) {
            debug!("Ignoring message on '{}'", msg.topic);
            return;
        }

        let cmd = match parse_relay_command(&msg.payload) {
            Ok(cmd) => cmd,
            Err(e) => {
                self.stats.commands_rejected += 1;
                warn!("Rejected command on '{}': {e}", msg.topic);
                sink.emit(&AppEvent::CommandRejected(e));
                return;
            }
        };

        if let Some(on) = cmd.pump {
            if let Err(e) = hw.set_pump(on) {
                sink.emit(&AppEvent::ActuatorFault(e.into()));
            }
        }
        if let Some(on) = cmd.light {
            if let Err(e) = hw.set_light(on) {
                sink.emit(&AppEvent::ActuatorFault(e.into()));
            }
        }
        self.stats.commands_applied += 1;
        info!("Relays: pump={} light={}", hw.pump_on(), hw.light_on());
        sink.emit(&AppEvent::RelaysChanged { pump: hw.pump_on(), light: hw.light_on() });

        self.snapshot = hw.read_all(now_ms);
        if let Err(e) = self.publish_status(&*hw, mqtt, sink) {
            warn!("Status publish after command failed: {e}");
        }
    }

    /// Publish the current status document.
    ///
    /// Returns `Ok(false)` when skipped because the broker is unreachable
    /// or no status topic is configured.
    pub fn publish_status(
        &mut self,
        hw: &impl ActuatorPort,
        mqtt: &mut impl MessagingPort,
        sink: &mut impl EventSink,
    ) -> Result<bool, Error> {
        let Some(topic) = self.status_topic else {
            debug!("No status topic, nothing published");
            return Ok(false);
        };
        let status = ControllerStatus::new(&self.snapshot, hw.pump_on(), hw.light_on());

        if !mqtt.is_connected() {
            self.stats.skipped += 1;
            debug!("Offline, status not published");
            sink.emit(&AppEvent::StatusSkipped);
            return Ok(false);
        }

        mqtt.publish(topic, &status.to_json())?;
        self.stats.published += 1;
        sink.emit(&AppEvent::StatusPublished(status));
        Ok(true)
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn snapshot(&self) -> SensorSnapshot {
        self.snapshot
    }

    pub fn stats(&self) -> ControllerStats {
        self.stats
    }
}
