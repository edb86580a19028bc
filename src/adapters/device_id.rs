//! Device identity derived from the ESP32 factory MAC address.
//!
//! Used to make MQTT client IDs unique when the same firmware image is
//! flashed onto several boards (`append_mac_suffix = true` in `cfg.toml`):
//! `esp32cam_ai` becomes `esp32cam_ai-efcafe`.

use core::fmt::Write;

use crate::config::{self, ConfigError, MqttSettings};

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

/// Client ID buffer: configured ID plus `-xxyyzz`.
pub type ClientId = heapless::String<{ config::MAX_CLIENT_ID_LEN + 8 }>;

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    unsafe {
        esp_idf_sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Simulation: returns a deterministic fake MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE]
}

/// Last three MAC bytes as lowercase hex, e.g. `efcafe`.
pub fn mac_suffix(mac: &MacAddress) -> heapless::String<6> {
    let mut s = heapless::String::new();
    let _ = write!(s, "{:02x}{:02x}{:02x}", mac[3], mac[4], mac[5]);
    s
}

/// Client ID this board should connect with.
pub fn client_id_for(settings: &MqttSettings, mac: &MacAddress) -> Result<ClientId, ConfigError> {
    config::validate_client_id(settings.client_id)?;
    let mut id = ClientId::new();
    let res = if settings.append_mac_suffix {
        write!(id, "{}-{}", settings.client_id, mac_suffix(mac))
    } else {
        id.push_str(settings.client_id).map_err(|()| core::fmt::Error)
    };
    res.map_err(|_| ConfigError::ValidationFailed("client_id too long"))?;
    Ok(id)
}
