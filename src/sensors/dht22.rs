//! DHT22 / AM2302 temperature and humidity sensor.
//!
//! Single-wire protocol on one open-drain GPIO with an external pull-up:
//!
//! ```text
//!  host  ▔▔▔▁▁▁▁▁▁▁(≥1 ms)▔▔▔╲
//!  DHT                        ▁▁▁(80µs)▔▔▔(80µs)  then 40 × [▁ 50µs][▔ 26µs=0 | 70µs=1]
//! ```
//!
//! Bits are classified by comparing each high phase against the preceding
//! low phase, both measured in polling iterations, so the decoder needs no
//! absolute clock calibration.  The 40 bits are humidity (16), temperature
//! (16, bit 15 = sign) and an 8-bit additive checksum.
//!
//! The sensor must not be sampled more than once every 2 s; calls inside
//! that window return the cached reading.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::error::SensorError;

/// Minimum time between two conversions.
pub const MIN_SAMPLE_PERIOD_MS: u64 = 2_000;

/// Polling iterations (≈1 µs each) before a phase counts as stuck.
const TIMEOUT_ITERATIONS: u32 = 1_000;

/// Host start pulse length.
const START_PULSE_US: u32 = 1_100;

const HUMIDITY_MAX: f32 = 100.0;
const TEMP_MIN_C: f32 = -40.0;
const TEMP_MAX_C: f32 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DhtReading {
    pub temperature_c: f32,
    pub humidity_pct: f32,
}

/// Decode a raw 5-byte frame.
pub fn decode(frame: [u8; 5]) -> Result<DhtReading, SensorError> {
    let sum = frame[..4].iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    if sum != frame[4] {
        return Err(SensorError::Checksum);
    }

    let humidity_pct = f32::from(u16::from_be_bytes([frame[0], frame[1]])) / 10.0;
    let magnitude = f32::from(u16::from_be_bytes([frame[2] & 0x7F, frame[3]])) / 10.0;
    let temperature_c = if frame[2] & 0x80 != 0 { -magnitude } else { magnitude };

    if !(0.0..=HUMIDITY_MAX).contains(&humidity_pct)
        || !(TEMP_MIN_C..=TEMP_MAX_C).contains(&temperature_c)
    {
        return Err(SensorError::OutOfRange);
    }

    Ok(DhtReading { temperature_c, humidity_pct })
}

/// Driver over any pin that can both drive and sense the data line.
pub struct Dht22<P, D> {
    pin: P,
    delay: D,
    cached: Option<(u64, DhtReading)>,
}

impl<P, D> Dht22<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    pub fn new(mut pin: P, delay: D) -> Self {
        // Idle level is high; a failure here surfaces on the first read.
        let _ = pin.set_high();
        Self { pin, delay, cached: None }
    }

    /// Latest reading, performing a conversion only if the previous one is
    /// at least [`MIN_SAMPLE_PERIOD_MS`] old.
    pub fn read(&mut self, now_ms: u64) -> Result<DhtReading, SensorError> {
        if let Some((at, reading)) = self.cached {
            if now_ms.saturating_sub(at) < MIN_SAMPLE_PERIOD_MS && now_ms >= at {
                return Ok(reading);
            }
        }
        let reading = decode(self.read_frame()?)?;
        self.cached = Some((now_ms, reading));
        Ok(reading)
    }

    /// Last successful reading and when it was taken.
    pub fn cached(&self) -> Option<(u64, DhtReading)> {
        self.cached
    }

    fn read_frame(&mut self) -> Result<[u8; 5], SensorError> {
        self.pin.set_low().map_err(|_| SensorError::Gpio)?;
        self.delay.delay_us(START_PULSE_US);
        self.pin.set_high().map_err(|_| SensorError::Gpio)?;

        // Response: sensor pulls low, then high, then starts the first bit.
        self.wait_while(true)?;
        self.wait_while(false)?;
        self.wait_while(true)?;

        let mut frame = [0u8; 5];
        for bit in 0..40 {
            let low = self.wait_while(false)?;
            let high = self.wait_while(true)?;
            if high > low {
                frame[bit / 8] |= 0x80 >> (bit % 8);
            }
        }
        Ok(frame)
    }

    /// Poll until the line leaves `level`; returns the iterations spent.
    fn wait_while(&mut self, level: bool) -> Result<u32, SensorError> {
        let mut count = 0;
        loop {
            let high = self.pin.is_high().map_err(|_| SensorError::Gpio)?;
            if high != level {
                return Ok(count);
            }
            count += 1;
            if count > TIMEOUT_ITERATIONS {
                return Err(SensorError::Timeout);
            }
            self.delay.delay_us(1);
        }
    }
}
