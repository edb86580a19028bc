//! Aquaponics controller node — main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  ControllerHardware     MqttAdapter      LogEventSink        │
//! │  (DHT22, float, relays) (Messaging)      (EventSink)         │
//! │  WifiAdapter            MonotonicClock                       │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ─────────────────      │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────┐      │
//! │  │        ControllerService (pure logic)              │      │
//! │  │  command parsing · relay state · status publish    │      │
//! │  └────────────────────────────────────────────────────┘      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! WiFi and MQTT reconnect on a fixed schedule.  A WiFi reconnect attempt
//! blocks the loop until the station associates or times out; between
//! attempts sensors keep being sampled.

use anyhow::{Context, Result};
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_hal::delay::{Ets, FreeRtos};
use esp_idf_hal::gpio::{AnyIOPin, AnyOutputPin, PinDriver, Pull};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};
use log::{error, info, warn};

use aquaponics::adapters::device_id;
use aquaponics::adapters::hardware::ControllerHardware;
use aquaponics::adapters::log_sink::LogEventSink;
use aquaponics::adapters::mqtt::MqttAdapter;
use aquaponics::adapters::time::MonotonicClock;
use aquaponics::adapters::wifi::{ConnectivityPort, WifiAdapter};
use aquaponics::app::controller::ControllerService;
use aquaponics::config::{self, CONTROLLER, WIFI};
use aquaponics::drivers::relay::Relay;
use aquaponics::pins;
use aquaponics::sensors::SensorHub;
use aquaponics::sensors::dht22::Dht22;
use aquaponics::sensors::float_switch::FloatSwitch;

/// Main loop period. DHT22 and publish cadence are timer-driven on top.
const LOOP_PERIOD_MS: u32 = 50;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_sys::link_patches();
    esp_idf_logger::init()?;

    info!("Aquaponics controller v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = config::validate_all() {
        error!("Configuration rejected: {e}, halting");
        return Err(anyhow::anyhow!("invalid configuration: {e}"));
    }

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    // ── 2. Sensors and relays ─────────────────────────────────
    //
    // SAFETY: GPIO numbers come from cfg.toml and were checked by
    // `validate_pin_map`; each is claimed exactly once here and the
    // corresponding `peripherals.pins` entries are never used.
    let (dht_pin, float_pin, pump_pin, light_pin) = unsafe {
        (
            AnyIOPin::new(pins::DHT_GPIO),
            AnyIOPin::new(pins::FLOAT_SWITCH_GPIO),
            AnyOutputPin::new(pins::RELAY_PUMP_GPIO),
            AnyOutputPin::new(pins::RELAY_LIGHT_GPIO),
        )
    };

    let mut dht_io = PinDriver::input_output_od(dht_pin)?;
    dht_io.set_pull(Pull::Up)?;
    let mut float_io = PinDriver::input(float_pin)?;
    float_io.set_pull(if CONTROLLER.float_switch_active_low { Pull::Up } else { Pull::Down })?;

    let hub = SensorHub::new(
        Dht22::new(dht_io, Ets),
        FloatSwitch::new(float_io, CONTROLLER.float_switch_active_low),
    );
    let pump = Relay::new(PinDriver::output(pump_pin)?, CONTROLLER.relay_active_low)
        .context("pump relay")?;
    let light = Relay::new(PinDriver::output(light_pin)?, CONTROLLER.relay_active_low)
        .context("light relay")?;
    let mut hw = ControllerHardware::new(hub, pump, light);

    // ── 3. Network ────────────────────────────────────────────
    let esp_wifi = EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs))?;
    let mut wifi = WifiAdapter::new(
        BlockingWifi::wrap(esp_wifi, sysloop)?,
        CONTROLLER.reconnect_interval_ms,
    );
    wifi.set_credentials(WIFI.ssid, WIFI.password)?;
    if let Err(e) = wifi.connect() {
        warn!("WiFi not up yet ({e}); retrying every {} ms", CONTROLLER.reconnect_interval_ms);
    }

    let client_id = device_id::client_id_for(&CONTROLLER.mqtt, &device_id::read_mac())?;
    info!("MQTT client ID: {client_id}");
    let mut mqtt =
        MqttAdapter::new(&CONTROLLER.mqtt, client_id, CONTROLLER.reconnect_interval_ms)?;

    // ── 4. Service ────────────────────────────────────────────
    let clock = MonotonicClock::new();
    let mut sink = LogEventSink::new();
    let mut service = ControllerService::new(&CONTROLLER);
    service.start(&mut hw, &mut sink);

    loop {
        let now = clock.uptime_ms();
        wifi.poll(now);
        if wifi.is_connected() {
            service.tick(now, &mut hw, &mut mqtt, &mut sink);
        } else {
            // Keep sensors fresh while offline; publishes are skipped.
            service.tick(now, &mut hw, &mut OfflineMessaging, &mut sink);
        }
        FreeRtos::delay_ms(LOOP_PERIOD_MS);
    }
}

/// Messaging stand-in while WiFi is down; the MQTT client is left idle.
struct OfflineMessaging;

impl aquaponics::app::ports::MessagingPort for OfflineMessaging {
    fn poll(&mut self, _now_ms: u64) {}

    fn is_connected(&self) -> bool {
        false
    }

    fn publish(&mut self, _topic: &str, _payload: &[u8]) -> Result<(), aquaponics::error::CommsError> {
        Err(aquaponics::error::CommsError::NotConnected)
    }

    fn take_inbound(&mut self) -> Option<aquaponics::app::ports::InboundMessage> {
        None
    }
}
