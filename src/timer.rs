//! Fixed-interval software timers driven by a millisecond clock.
//!
//! Each periodic activity (capture, status publish, reconnect) owns one
//! [`IntervalTimer`] and polls it from the main loop.  Firing re-arms from
//! the poll time, so a long stall yields one late fire, never a burst.

/// Fixed-period timer over a caller-supplied monotonic `now_ms`.
#[derive(Debug, Clone, Copy)]
pub struct IntervalTimer {
    interval_ms: u64,
    last_fire_ms: Option<u64>,
    fire_immediately: bool,
}

impl IntervalTimer {
    /// First fire happens one full interval after the first poll.
    pub const fn new(interval_ms: u32) -> Self {
        Self {
            interval_ms: interval_ms as u64,
            last_fire_ms: None,
            fire_immediately: false,
        }
    }

    /// First poll fires straight away.
    pub const fn immediate(interval_ms: u32) -> Self {
        Self {
            interval_ms: interval_ms as u64,
            last_fire_ms: None,
            fire_immediately: true,
        }
    }

    pub const fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// Returns `true` when the interval has elapsed, and re-arms.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        match self.last_fire_ms {
            None if self.fire_immediately => {
                self.last_fire_ms = Some(now_ms);
                true
            }
            None => {
                // Arm on first sight so the first fire is a full period out.
                self.last_fire_ms = Some(now_ms);
                false
            }
            Some(last) => {
                // A clock that went backwards saturates to zero elapsed.
                if now_ms.saturating_sub(last) >= self.interval_ms {
                    self.last_fire_ms = Some(now_ms);
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Restart the period from `now_ms` without firing.
    pub fn reset(&mut self, now_ms: u64) {
        self.last_fire_ms = Some(now_ms);
    }

    /// Forget history; the next poll behaves like the first.
    pub fn clear(&mut self) {
        self.last_fire_ms = None;
    }

    /// Milliseconds until the next fire, or `None` if never polled.
    pub fn remaining_ms(&self, now_ms: u64) -> Option<u64> {
        self.last_fire_ms
            .map(|last| self.interval_ms.saturating_sub(now_ms.saturating_sub(last)))
    }
}
