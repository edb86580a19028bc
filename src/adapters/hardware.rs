//! Hardware adapters — bridge the board peripherals to the port traits.
//!
//! [`ControllerHardware`] owns the [`SensorHub`] and both relays and is the
//! only thing on the controller node that touches GPIO.  [`CameraHardware`]
//! wraps the OV2640 driver for the camera node.  Both are generic over
//! `embedded-hal` pins (or cfg-gated simulation), so host tests drive them
//! with plain mock pins.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::app::ports::{ActuatorPort, CameraPort, SensorPort};
use crate::drivers::camera::{CameraDriver, Frame};
use crate::drivers::relay::Relay;
use crate::error::{ActuatorError, CameraError};
use crate::sensors::{SensorHub, SensorSnapshot};

pub struct ControllerHardware<DP, D, FP, RP> {
    hub: SensorHub<DP, D, FP>,
    pump: Relay<RP>,
    light: Relay<RP>,
}

impl<DP, D, FP, RP> ControllerHardware<DP, D, FP, RP>
where
    DP: InputPin + OutputPin,
    D: DelayNs,
    FP: InputPin,
    RP: OutputPin,
{
    pub fn new(hub: SensorHub<DP, D, FP>, pump: Relay<RP>, light: Relay<RP>) -> Self {
        Self { hub, pump, light }
    }

    pub fn hub(&self) -> &SensorHub<DP, D, FP> {
        &self.hub
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<DP, D, FP, RP> SensorPort for ControllerHardware<DP, D, FP, RP>
where
    DP: InputPin + OutputPin,
    D: DelayNs,
    FP: InputPin,
    RP: OutputPin,
{
    fn read_all(&mut self, now_ms: u64) -> SensorSnapshot {
        self.hub.read_all(now_ms)
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<DP, D, FP, RP> ActuatorPort for ControllerHardware<DP, D, FP, RP>
where
    DP: InputPin + OutputPin,
    D: DelayNs,
    FP: InputPin,
    RP: OutputPin,
{
    fn set_pump(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.pump.set(on)
    }

    fn set_light(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.light.set(on)
    }

    fn pump_on(&self) -> bool {
        self.pump.is_on()
    }

    fn light_on(&self) -> bool {
        self.light.is_on()
    }
}

/// Camera node peripherals.
pub struct CameraHardware {
    camera: CameraDriver,
}

impl CameraHardware {
    pub fn new(camera: CameraDriver) -> Self {
        Self { camera }
    }

    pub fn captures(&self) -> u32 {
        self.camera.captures()
    }
}

impl CameraPort for CameraHardware {
    fn capture(&mut self) -> Result<Frame, CameraError> {
        self.camera.capture()
    }
}
