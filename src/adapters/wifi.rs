//! WiFi station-mode adapter.
//!
//! Implements [`ConnectivityPort`] — the hexagonal boundary for network
//! connectivity.  Both nodes join the same access point from
//! [`config::WIFI`](crate::config::WIFI).
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `BlockingWifi<EspWifi>` from `esp_idf_svc::wifi`.
//! - **all other targets**: a simulated link with injectable drops and
//!   connect failures for host-side tests.
//!
//! ## Reconnection policy
//!
//! A dropped link is retried on the next poll, then every
//! `reconnect_interval_ms` (see [`ReconnectPolicy`]).  On the device each
//! attempt is a blocking `connect` + `wait_netif_up`, so `poll` stalls the
//! caller for the length of that attempt.

use core::fmt;
use log::{error, info, warn};

use super::reconnect::ReconnectPolicy;
use super::utils::is_printable_ascii;

#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};

// ───────────────────────────────────────────────────────────────
// Port trait
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed,
    AlreadyConnected,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(f, "password invalid (8-64 bytes, or empty for open)"),
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
            Self::AlreadyConnected => write!(f, "already connected to AP"),
        }
    }
}

impl std::error::Error for ConnectivityError {}

impl From<ConnectivityError> for crate::error::Error {
    fn from(e: ConnectivityError) -> Self {
        use crate::error::CommsError;
        match e {
            ConnectivityError::InvalidSsid
            | ConnectivityError::InvalidPassword
            | ConnectivityError::NoCredentials => Self::Init("wifi credentials"),
            _ => Self::Comms(CommsError::WifiConnectFailed),
        }
    }
}

pub trait ConnectivityPort {
    fn connect(&mut self) -> Result<(), ConnectivityError>;
    fn disconnect(&mut self);
    fn is_connected(&self) -> bool;
    /// Detect link loss and retry on the reconnect schedule.
    fn poll(&mut self, now_ms: u64);
    fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError>;
    fn rssi(&self) -> Option<i8>;
}

// ───────────────────────────────────────────────────────────────
// Connection state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting { attempt: u32 },
}

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn validate_ssid(ssid: &str) -> Result<(), ConnectivityError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(ConnectivityError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ConnectivityError> {
    if !password.is_empty() && !(8..=64).contains(&password.len()) {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    state: WifiState,
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    policy: ReconnectPolicy,
    last_rssi: Option<i8>,
    #[cfg(target_os = "espidf")]
    wifi: BlockingWifi<EspWifi<'static>>,
    #[cfg(not(target_os = "espidf"))]
    sim: SimLink,
}

/// Host-side stand-in for the radio.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Default)]
struct SimLink {
    up: bool,
    fail_next: u32,
    connect_calls: u32,
}

impl WifiAdapter {
    #[cfg(target_os = "espidf")]
    pub fn new(wifi: BlockingWifi<EspWifi<'static>>, reconnect_interval_ms: u32) -> Self {
        Self {
            state: WifiState::Disconnected,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            policy: ReconnectPolicy::new(reconnect_interval_ms),
            last_rssi: None,
            wifi,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new(reconnect_interval_ms: u32) -> Self {
        Self {
            state: WifiState::Disconnected,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            policy: ReconnectPolicy::new(reconnect_interval_ms),
            last_rssi: None,
            sim: SimLink::default(),
        }
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};

        let auth_method = if self.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let cfg = Configuration::Client(ClientConfiguration {
            ssid: self.ssid.as_str().try_into().map_err(|_| ConnectivityError::InvalidSsid)?,
            password: self
                .password
                .as_str()
                .try_into()
                .map_err(|_| ConnectivityError::InvalidPassword)?,
            auth_method,
            ..Default::default()
        });

        let fail = |e: esp_idf_sys::EspError| {
            warn!("WiFi: driver error {e}");
            ConnectivityError::ConnectionFailed
        };
        self.wifi.set_configuration(&cfg).map_err(fail)?;
        if !self.wifi.is_started().map_err(fail)? {
            self.wifi.start().map_err(fail)?;
        }
        self.wifi.connect().map_err(fail)?;
        self.wifi.wait_netif_up().map_err(fail)?;
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        self.sim.connect_calls += 1;
        if self.sim.fail_next > 0 {
            self.sim.fail_next -= 1;
            warn!("WiFi(sim): simulated failure (attempt {})", self.sim.connect_calls);
            return Err(ConnectivityError::ConnectionFailed);
        }
        self.sim.up = true;
        info!("WiFi(sim): associated with '{}'", self.ssid);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) {
        let _ = self.wifi.disconnect();
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) {
        self.sim.up = false;
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.sim.up
    }

    #[cfg(target_os = "espidf")]
    fn platform_rssi(&self) -> Option<i8> {
        let mut ap = esp_idf_sys::wifi_ap_record_t::default();
        let err = unsafe { esp_idf_sys::esp_wifi_sta_get_ap_info(&mut ap) };
        (err == esp_idf_sys::ESP_OK).then_some(ap.rssi)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_rssi(&self) -> Option<i8> {
        self.sim.up.then_some(-58)
    }

    fn on_link_up(&mut self) {
        self.state = WifiState::Connected;
        self.policy.on_connected();
        self.last_rssi = self.platform_rssi();
        info!("WiFi: connected (RSSI={:?})", self.last_rssi);
    }

    // ── Simulation hooks ──────────────────────────────────────

    /// Drop the simulated link as if the AP vanished.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_drop_link(&mut self) {
        self.sim.up = false;
    }

    /// Make the next `n` association attempts fail.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_fail_next(&mut self, n: u32) {
        self.sim.fail_next = n;
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_connect_calls(&self) -> u32 {
        self.sim.connect_calls
    }
}

// ───────────────────────────────────────────────────────────────
// ConnectivityPort
// ───────────────────────────────────────────────────────────────

impl ConnectivityPort for WifiAdapter {
    fn connect(&mut self) -> Result<(), ConnectivityError> {
        if self.ssid.is_empty() {
            return Err(ConnectivityError::NoCredentials);
        }
        if self.state == WifiState::Connected {
            return Err(ConnectivityError::AlreadyConnected);
        }

        info!("WiFi: connecting to '{}'", self.ssid);
        self.state = WifiState::Connecting;

        match self.platform_connect() {
            Ok(()) => {
                self.on_link_up();
                Ok(())
            }
            Err(e) => {
                error!("WiFi: connection failed: {}", e);
                self.state = WifiState::Reconnecting { attempt: 0 };
                Err(e)
            }
        }
    }

    fn disconnect(&mut self) {
        self.platform_disconnect();
        self.policy.on_disconnected();
        self.state = WifiState::Disconnected;
        self.last_rssi = None;
        info!("WiFi: disconnected");
    }

    fn is_connected(&self) -> bool {
        self.state == WifiState::Connected && self.platform_is_connected()
    }

    fn poll(&mut self, now_ms: u64) {
        match self.state {
            WifiState::Connected => {
                if self.platform_is_connected() {
                    return;
                }
                warn!("WiFi: connection lost, reconnecting every {} ms", self.policy.interval_ms());
                self.policy.on_disconnected();
                self.last_rssi = None;
                self.state = WifiState::Reconnecting { attempt: 0 };
            }
            WifiState::Reconnecting { .. } => {}
            WifiState::Disconnected | WifiState::Connecting => return,
        }

        if !self.policy.should_attempt(now_ms) {
            return;
        }
        let attempt = self.policy.attempts();
        info!("WiFi: reconnect attempt {}", attempt);
        match self.platform_connect() {
            Ok(()) => self.on_link_up(),
            Err(_) => self.state = WifiState::Reconnecting { attempt },
        }
    }

    fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        self.ssid.clear();
        self.ssid.push_str(ssid).map_err(|_| ConnectivityError::InvalidSsid)?;
        self.password.clear();
        self.password.push_str(password).map_err(|_| ConnectivityError::InvalidPassword)?;
        info!("WiFi: credentials set (SSID='{}')", self.ssid);
        Ok(())
    }

    fn rssi(&self) -> Option<i8> {
        self.last_rssi
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
