//! Single-channel relay driver.
//!
//! Most hobby relay boards energise the coil when the input is pulled LOW.
//! The driver hides that polarity: callers only see logical on/off.
//! A relay always starts de-energised.

use embedded_hal::digital::OutputPin;

use crate::error::ActuatorError;

pub struct Relay<P> {
    pin: P,
    active_low: bool,
    on: bool,
}

impl<P: OutputPin> Relay<P> {
    /// Take the pin and drive it to the de-energised level.
    pub fn new(pin: P, active_low: bool) -> Result<Self, ActuatorError> {
        let mut relay = Self { pin, active_low, on: true };
        relay.set(false)?;
        Ok(relay)
    }

    pub fn set(&mut self, on: bool) -> Result<(), ActuatorError> {
        let drive_high = on != self.active_low;
        let res = if drive_high { self.pin.set_high() } else { self.pin.set_low() };
        res.map_err(|_| ActuatorError::GpioWriteFailed)?;
        self.on = on;
        Ok(())
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}
