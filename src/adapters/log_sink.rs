//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing application events to the ESP-IDF
//! logger (UART in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(node) => info!("START | {:?}", node),
            AppEvent::ConnectionChanged { connected } => {
                info!("MQTT  | {}", if *connected { "online" } else { "offline" });
            }
            AppEvent::StatusPublished(s) => {
                info!(
                    "STATUS| T={:?}\u{00b0}C RH={:?}% water={} pump={} light={}",
                    s.temp, s.humidity, s.water, s.pump, s.light
                );
            }
            AppEvent::StatusSkipped => info!("STATUS| skipped (offline)"),
            AppEvent::RelaysChanged { pump, light } => {
                info!("RELAY | pump={} light={}", pump, light);
            }
            AppEvent::CommandRejected(e) => warn!("CMD   | rejected: {}", e),
            AppEvent::CaptureClassified { health, bytes, captures } => {
                info!("CAPT  | #{} {} ({} bytes)", captures, health.as_str(), bytes);
            }
            AppEvent::CaptureFailed(e) => warn!("CAPT  | failed: {}", e),
            AppEvent::ActuatorFault(e) => warn!("FAULT | {}", e),
        }
    }
}
