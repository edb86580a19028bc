//! GPIO assignments for both boards.
//!
//! Controller pins come from `cfg.toml` via [`config::CONTROLLER`]; the
//! camera bus is soldered on the AI-Thinker ESP32-CAM and is fixed here.

use crate::config::{self, ConfigError, PinMap};

// ---------------------------------------------------------------------------
// Controller board
// ---------------------------------------------------------------------------

/// DHT22 single-wire data line (bidirectional, external 10 kΩ pull-up).
pub const DHT_GPIO: i32 = config::CONTROLLER.pins.dht;
/// Pump relay coil driver.
pub const RELAY_PUMP_GPIO: i32 = config::CONTROLLER.pins.relay_pump;
/// Grow-light relay coil driver.
pub const RELAY_LIGHT_GPIO: i32 = config::CONTROLLER.pins.relay_light;
/// Float switch input, internal pull-up enabled.
pub const FLOAT_SWITCH_GPIO: i32 = config::CONTROLLER.pins.float_switch;

/// Highest GPIO number on the ESP32.
pub const MAX_GPIO: i32 = 39;
/// GPIO 34–39 have no output driver and no pull resistors.
pub const INPUT_ONLY: core::ops::RangeInclusive<i32> = 34..=39;

// ---------------------------------------------------------------------------
// AI-Thinker ESP32-CAM (OV2640)
// ---------------------------------------------------------------------------

pub const CAM_PWDN: i32 = 32;
/// Not wired on this board.
pub const CAM_RESET: i32 = -1;
pub const CAM_XCLK: i32 = 0;
pub const CAM_SIOD: i32 = 26;
pub const CAM_SIOC: i32 = 27;
pub const CAM_Y9: i32 = 35;
pub const CAM_Y8: i32 = 34;
pub const CAM_Y7: i32 = 39;
pub const CAM_Y6: i32 = 36;
pub const CAM_Y5: i32 = 21;
pub const CAM_Y4: i32 = 19;
pub const CAM_Y3: i32 = 18;
pub const CAM_Y2: i32 = 5;
pub const CAM_VSYNC: i32 = 25;
pub const CAM_HREF: i32 = 23;
pub const CAM_PCLK: i32 = 22;
/// On-board white LED next to the lens.
pub const CAM_FLASH_LED: i32 = 4;

/// OV2640 master clock.
pub const CAM_XCLK_FREQ_HZ: i32 = 20_000_000;

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// All pins distinct and on real GPIOs; outputs and the DHT line not on
/// input-only pins.
pub fn validate_pin_map(map: &PinMap) -> Result<(), ConfigError> {
    let all = [map.dht, map.relay_pump, map.relay_light, map.float_switch];
    for (i, &pin) in all.iter().enumerate() {
        if !(0..=MAX_GPIO).contains(&pin) {
            return Err(ConfigError::InvalidPin(pin));
        }
        if all[i + 1..].contains(&pin) {
            return Err(ConfigError::InvalidPin(pin));
        }
    }
    for pin in [map.dht, map.relay_pump, map.relay_light] {
        if INPUT_ONLY.contains(&pin) {
            return Err(ConfigError::InvalidPin(pin));
        }
    }
    Ok(())
}
