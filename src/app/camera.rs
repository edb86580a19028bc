//! Camera node service.
//!
//! ```text
//!  capture timer ─┐
//!                 ├─▶ CameraPort::capture ─▶ InferencePort::classify ─▶ EventSink
//!  "capture" cmd ─┘                                                   └▶ MessagingPort (report)
//! ```
//!
//! A failed capture or upload is counted and reported; the next cycle runs
//! on schedule as usual.

use log::{info, warn};

use crate::config::{self, CameraConfig};
use crate::error::Error;
use crate::timer::IntervalTimer;

use super::commands::{CameraCommand, parse_camera_command};
use super::events::{AppEvent, Node};
use super::ports::{CameraPort, EventSink, InferencePort, MessagingPort};
use super::status::{CameraReport, PlantHealth};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CameraStats {
    pub captures: u32,
    pub failures: u32,
    pub manual_triggers: u32,
}

pub struct CameraService {
    cmd_topic: &'static str,
    report_topic: Option<&'static str>,
    capture_timer: IntervalTimer,
    capture_requested: bool,
    was_connected: bool,
    last_health: Option<PlantHealth>,
    stats: CameraStats,
}

impl CameraService {
    pub fn new(cfg: &CameraConfig) -> Self {
        Self {
            cmd_topic: cfg.mqtt.cmd_topic,
            report_topic: cfg.mqtt.status_topic,
            capture_timer: IntervalTimer::new(cfg.capture_interval_ms),
            capture_requested: false,
            was_connected: false,
            last_health: None,
            stats: CameraStats::default(),
        }
    }

    pub fn start(&mut self, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::Started(Node::Camera));
        info!(
            "Camera service started (every {} ms, cmd='{}')",
            self.capture_timer.interval_ms(),
            self.cmd_topic
        );
    }

    pub fn tick(
        &mut self,
        now_ms: u64,
        camera: &mut impl CameraPort,
        inference: &mut impl InferencePort,
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
            if !config::topic_matches(self.cmd_topic, &msg.topic) {
                continue;
            }
            match parse_camera_command(&msg.payload) {
                Ok(CameraCommand::Capture) => {
                    info!("Capture requested over MQTT");
                    self.stats.manual_triggers += 1;
                    self.capture_requested = true;
                }
                Err(e) => {
                    warn!("Rejected camera command: {e}");
                    sink.emit(&AppEvent::CommandRejected(e));
                }
            }
        }

        let due = self.capture_timer.poll(now_ms);
        if due || self.capture_requested {
            self.capture_requested = false;
            // Outcome is already reported through the sink.
            let _ = self.capture_and_classify(camera, inference, mqtt, sink);
        }
    }

    /// One full cycle: capture, upload, classify, report.
    pub fn capture_and_classify(
        &mut self,
        camera: &mut impl CameraPort,
        inference: &mut impl InferencePort,
        mqtt: &mut impl MessagingPort,
        sink: &mut impl EventSink,
    ) -> Result<PlantHealth, Error> {
        let result = camera
            .capture()
            .map_err(Error::from)
            .and_then(|frame| {
                inference
                    .classify(&frame.jpeg)
                    .map(|health| (health, frame.jpeg.len()))
                    .map_err(Error::from)
            });

        let (health, bytes) = match result {
            Ok(ok) => ok,
            Err(e) => {
                self.stats.failures += 1;
                warn!("Capture cycle failed: {e}");
                sink.emit(&AppEvent::CaptureFailed(e));
                return Err(e);
            }
        };

        self.stats.captures += 1;
        self.last_health = Some(health);
        info!("Plant health: {} ({} bytes)", health.as_str(), bytes);
        sink.emit(&AppEvent::CaptureClassified { health, bytes, captures: self.stats.captures });

        if let Some(topic) = self.report_topic {
            if mqtt.is_connected() {
                let report = CameraReport { result: health.as_str(), captures: self.stats.captures };
                if let Err(e) = mqtt.publish(topic, &report.to_json()) {
                    warn!("Report publish failed: {e}");
                }
            }
        }
        Ok(health)
    }

    pub fn last_health(&self) -> Option<PlantHealth> {
        self.last_health
    }

    pub fn stats(&self) -> CameraStats {
        self.stats
    }
}
