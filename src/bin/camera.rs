//! Aquaponics camera node — ESP32-CAM (AI-Thinker) entry point.
//!
//! ```text
//!   OV2640 ──▶ CameraHardware ──┐
//!                               ├──▶ CameraService ──▶ InferenceClient ──▶ POST /predict
//!   MQTT cmd ──▶ MqttAdapter ───┘          │
//!                                          └──▶ LogEventSink (+ optional MQTT report)
//! ```
//!
//! A capture runs every `capture_interval_ms`, or immediately when
//! `capture` arrives on the camera command topic.

use anyhow::Result;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};
use log::{error, info, warn};

use aquaponics::adapters::device_id;
use aquaponics::adapters::hardware::CameraHardware;
use aquaponics::adapters::inference::InferenceClient;
use aquaponics::adapters::log_sink::LogEventSink;
use aquaponics::adapters::mqtt::MqttAdapter;
use aquaponics::adapters::time::MonotonicClock;
use aquaponics::adapters::wifi::{ConnectivityPort, WifiAdapter};
use aquaponics::app::camera::CameraService;
use aquaponics::config::{self, CAMERA, WIFI};
use aquaponics::drivers::camera::CameraDriver;

const LOOP_PERIOD_MS: u32 = 50;

fn main() -> Result<()> {
    esp_idf_sys::link_patches();
    esp_idf_logger::init()?;

    info!("Aquaponics camera v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = config::validate_all() {
        error!("Configuration rejected: {e}, halting");
        return Err(anyhow::anyhow!("invalid configuration: {e}"));
    }

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    // Frame buffers need contiguous PSRAM; allocate before WiFi starts.
    let mut camera = CameraHardware::new(CameraDriver::init(&CAMERA)?);

    let esp_wifi = EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs))?;
    let mut wifi = WifiAdapter::new(BlockingWifi::wrap(esp_wifi, sysloop)?, CAMERA.reconnect_interval_ms);
    wifi.set_credentials(WIFI.ssid, WIFI.password)?;
    if let Err(e) = wifi.connect() {
        warn!("WiFi not up yet ({e}); retrying every {} ms", CAMERA.reconnect_interval_ms);
    }

    let client_id = device_id::client_id_for(&CAMERA.mqtt, &device_id::read_mac())?;
    info!("MQTT client ID: {client_id}");
    let mut mqtt = MqttAdapter::new(&CAMERA.mqtt, client_id, CAMERA.reconnect_interval_ms)?;
    let mut inference = InferenceClient::new(CAMERA.server_url);
    info!("Inference endpoint: {}", inference.url());

    let clock = MonotonicClock::new();
    let mut sink = LogEventSink::new();
    let mut service = CameraService::new(&CAMERA);
    service.start(&mut sink);

    loop {
        let now = clock.uptime_ms();
        wifi.poll(now);
        // Offline: the capture timer waits for the link.
        if wifi.is_connected() {
            service.tick(now, &mut camera, &mut inference, &mut mqtt, &mut sink);
        }
        FreeRtos::delay_ms(LOOP_PERIOD_MS);
    }
}
