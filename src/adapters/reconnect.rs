//! Fixed-interval reconnect policy shared by the WiFi and MQTT adapters.
//!
//! After a link loss the first attempt is made on the next poll; further
//! attempts follow every `interval_ms` until one succeeds.  The interval
//! never grows.

use crate::timer::IntervalTimer;

#[derive(Debug, Clone, Copy)]
pub struct ReconnectPolicy {
    timer: IntervalTimer,
    connected: bool,
    attempts: u32,
}

impl ReconnectPolicy {
    pub const fn new(interval_ms: u32) -> Self {
        Self {
            timer: IntervalTimer::immediate(interval_ms),
            connected: false,
            attempts: 0,
        }
    }

    /// `true` when the caller should try to connect now.  Counts the attempt.
    pub fn should_attempt(&mut self, now_ms: u64) -> bool {
        if self.connected || !self.timer.poll(now_ms) {
            return false;
        }
        self.attempts = self.attempts.saturating_add(1);
        true
    }

    pub fn on_connected(&mut self) {
        self.connected = true;
        self.attempts = 0;
    }

    /// Link dropped: next poll attempts immediately.
    pub fn on_disconnected(&mut self) {
        if self.connected {
            self.connected = false;
            self.timer.clear();
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Attempts since the last successful connection.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn interval_ms(&self) -> u64 {
        self.timer.interval_ms()
    }
}
