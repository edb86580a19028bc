//! Float switch water-level input.
//!
//! A reed float closes when the tank is full.  Wired to a pulled-up GPIO
//! the input reads LOW when full (`active_low = true`, the default board
//! wiring); the opposite polarity is configurable.
//!
//! Sloshing makes the contact chatter, so a level change is only accepted
//! after [`DEBOUNCE_SAMPLES`] consecutive agreeing reads.

use embedded_hal::digital::InputPin;

use crate::error::SensorError;

/// Consecutive agreeing samples required to change the reported level.
pub const DEBOUNCE_SAMPLES: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaterLevel {
    Full,
    Low,
}

pub struct FloatSwitch<P> {
    pin: P,
    active_low: bool,
    stable: WaterLevel,
    candidate: WaterLevel,
    agree: u8,
    primed: bool,
}

impl<P: InputPin> FloatSwitch<P> {
    pub fn new(pin: P, active_low: bool) -> Self {
        Self {
            pin,
            active_low,
            stable: WaterLevel::Low,
            candidate: WaterLevel::Low,
            agree: 0,
            primed: false,
        }
    }

    /// Take one sample and return the debounced level.
    ///
    /// The very first sample is accepted as-is so the level is known at boot.
    pub fn sample(&mut self) -> Result<WaterLevel, SensorError> {
        let high = self.pin.is_high().map_err(|_| SensorError::Gpio)?;
        let raw = if high != self.active_low { WaterLevel::Full } else { WaterLevel::Low };

        if !self.primed {
            self.primed = true;
            self.stable = raw;
            self.candidate = raw;
            return Ok(raw);
        }

        if raw == self.stable {
            self.agree = 0;
        } else if raw == self.candidate {
            self.agree += 1;
            if self.agree >= DEBOUNCE_SAMPLES {
                self.stable = raw;
                self.agree = 0;
            }
        } else {
            self.candidate = raw;
            self.agree = 1;
        }
        Ok(self.stable)
    }

    /// Debounced level without sampling.
    pub fn level(&self) -> WaterLevel {
        self.stable
    }
}
