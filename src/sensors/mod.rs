//! Sensor subsystem for the controller node.
//!
//! The [`SensorHub`] owns both sensor drivers and produces a
//! [`SensorSnapshot`] on demand.  A failed DHT22 conversion keeps the last
//! good values, so a single bad frame never blanks the dashboard; before
//! the first success the fields are `None` and publish as JSON `null`.

pub mod dht22;
pub mod float_switch;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use log::warn;

use self::dht22::Dht22;
use self::float_switch::{FloatSwitch, WaterLevel};

/// Point-in-time view of every controller sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorSnapshot {
    pub temperature_c: Option<f32>,
    pub humidity_pct: Option<f32>,
    pub water: WaterLevel,
}

impl Default for SensorSnapshot {
    fn default() -> Self {
        Self {
            temperature_c: None,
            humidity_pct: None,
            water: WaterLevel::Low,
        }
    }
}

pub struct SensorHub<DP, D, FP> {
    dht: Dht22<DP, D>,
    float: FloatSwitch<FP>,
    last: SensorSnapshot,
    dht_failures: u32,
}

impl<DP, D, FP> SensorHub<DP, D, FP>
where
    DP: InputPin + OutputPin,
    D: DelayNs,
    FP: InputPin,
{
    pub fn new(dht: Dht22<DP, D>, float: FloatSwitch<FP>) -> Self {
        Self {
            dht,
            float,
            last: SensorSnapshot::default(),
            dht_failures: 0,
        }
    }

    /// Read every sensor; failures fall back to the previous values.
    pub fn read_all(&mut self, now_ms: u64) -> SensorSnapshot {
        match self.dht.read(now_ms) {
            Ok(r) => {
                self.last.temperature_c = Some(r.temperature_c);
                self.last.humidity_pct = Some(r.humidity_pct);
            }
            Err(e) => {
                self.dht_failures = self.dht_failures.saturating_add(1);
                warn!("DHT22 read failed ({e}), keeping last values");
            }
        }

        match self.float.sample() {
            Ok(level) => self.last.water = level,
            Err(e) => warn!("Float switch read failed ({e})"),
        }

        self.last
    }

    /// Most recent snapshot without touching hardware.
    pub fn last(&self) -> SensorSnapshot {
        self.last
    }

    /// DHT conversions that failed since boot.
    pub fn dht_failures(&self) -> u32 {
        self.dht_failures
    }
}
