//! Real adapters on the host: drivers over mock pins, and the services
//! wired to the simulated broker and inference server.

use std::cell::RefCell;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

use aquaponics::adapters::device_id;
use aquaponics::adapters::hardware::{CameraHardware, ControllerHardware};
use aquaponics::adapters::inference::InferenceClient;
use aquaponics::adapters::mqtt::MqttAdapter;
use aquaponics::app::camera::CameraService;
use aquaponics::app::controller::ControllerService;
use aquaponics::app::ports::{ActuatorPort, SensorPort};
use aquaponics::app::status::PlantHealth;
use aquaponics::drivers::camera::CameraDriver;
use aquaponics::drivers::relay::Relay;
use aquaponics::sensors::SensorHub;
use aquaponics::sensors::dht22::Dht22;
use aquaponics::sensors::float_switch::{FloatSwitch, WaterLevel};

use super::mock_hw::*;

// ── Mock pins ─────────────────────────────────────────────────

/// Open-drain line nobody answers on: always reads high.
struct SilentLine;

impl ErrorType for SilentLine {
    type Error = Infallible;
}

impl InputPin for SilentLine {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(true)
    }
    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(false)
    }
}

impl OutputPin for SilentLine {
    fn set_low(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
    fn set_high(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}

struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

/// Input whose level the test flips through a shared cell.
#[derive(Clone)]
struct SharedInput(Rc<RefCell<bool>>);

impl ErrorType for SharedInput {
    type Error = Infallible;
}

impl InputPin for SharedInput {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(*self.0.borrow())
    }
    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!*self.0.borrow())
    }
}

/// Output that records its level history.
#[derive(Clone, Default)]
struct ProbeOutput(Rc<RefCell<Vec<bool>>>);

impl ErrorType for ProbeOutput {
    type Error = Infallible;
}

impl OutputPin for ProbeOutput {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0.borrow_mut().push(false);
        Ok(())
    }
    fn set_high(&mut self) -> Result<(), Infallible> {
        self.0.borrow_mut().push(true);
        Ok(())
    }
}

type Board = ControllerHardware<SilentLine, NoDelay, SharedInput, ProbeOutput>;

fn board() -> (Board, Rc<RefCell<bool>>, ProbeOutput, ProbeOutput) {
    // Active-low float: line pulled low while the tank is full.
    let float_level = Rc::new(RefCell::new(false));
    let pump = ProbeOutput::default();
    let light = ProbeOutput::default();
    let hub = SensorHub::new(
        Dht22::new(SilentLine, NoDelay),
        FloatSwitch::new(SharedInput(float_level.clone()), true),
    );
    let hw = ControllerHardware::new(
        hub,
        Relay::new(pump.clone(), true).unwrap(),
        Relay::new(light.clone(), true).unwrap(),
    );
    (hw, float_level, pump, light)
}

// ── Controller hardware ───────────────────────────────────────

#[test]
fn relays_boot_off_and_follow_polarity() {
    let (mut hw, _, pump, light) = board();
    // Active-low: off is HIGH.
    assert_eq!(*pump.0.borrow(), vec![true]);
    assert_eq!(*light.0.borrow(), vec![true]);

    hw.set_pump(true).unwrap();
    assert_eq!(pump.0.borrow().last(), Some(&false));
    assert!(hw.pump_on());
    assert!(!hw.light_on());
}

#[test]
fn silent_dht_keeps_null_readings() {
    let (mut hw, _, _, _) = board();
    let snap = hw.read_all(0);
    assert_eq!(snap.temperature_c, None);
    assert_eq!(snap.humidity_pct, None);
    assert_eq!(snap.water, WaterLevel::Full);
    assert_eq!(hw.hub().dht_failures(), 1);
}

#[test]
fn float_switch_debounced_through_hub() {
    let (mut hw, level, _, _) = board();
    assert_eq!(hw.read_all(0).water, WaterLevel::Full);

    *level.borrow_mut() = true;
    assert_eq!(hw.read_all(1_000).water, WaterLevel::Full);
    assert_eq!(hw.read_all(2_000).water, WaterLevel::Full);
    assert_eq!(hw.read_all(3_000).water, WaterLevel::Low);
}

// ── End to end over the simulated broker ──────────────────────

#[test]
fn controller_round_trip_through_sim_broker() {
    let cfg = controller_config();
    let id = device_id::client_id_for(&cfg.mqtt, &device_id::read_mac()).unwrap();
    let mut mqtt = MqttAdapter::new(&cfg.mqtt, id, cfg.reconnect_interval_ms).unwrap();
    let (mut hw, _, pump, _) = board();
    let mut sink = RecordingSink::default();
    let mut svc = ControllerService::new(&cfg);
    svc.start(&mut hw, &mut sink);

    svc.tick(0, &mut hw, &mut mqtt, &mut sink);
    assert!(mqtt.sim_inject(CMD_TOPIC, br#"{"pump":true}"#));
    svc.tick(50, &mut hw, &mut mqtt, &mut sink);

    assert_eq!(pump.0.borrow().last(), Some(&false), "pump energised (active-low)");
    let (topic, body) = mqtt.sim_published().last().expect("status after command");
    assert_eq!(topic, STATUS_TOPIC);
    let doc: serde_json::Value = serde_json::from_slice(body).unwrap();
    assert_eq!(doc["pump"], true);
    assert_eq!(doc["water"], "Đầy");
    assert!(doc["temp"].is_null());
}

#[test]
fn controller_reconnects_on_fixed_interval() {
    let cfg = controller_config();
    let id = device_id::client_id_for(&cfg.mqtt, &device_id::read_mac()).unwrap();
    let mut mqtt = MqttAdapter::new(&cfg.mqtt, id, cfg.reconnect_interval_ms).unwrap();
    mqtt.sim_set_reachable(false);
    let (mut hw, _, _, _) = board();
    let mut sink = RecordingSink::default();
    let mut svc = ControllerService::new(&cfg);

    for now in (0..=20_000).step_by(50) {
        svc.tick(now, &mut hw, &mut mqtt, &mut sink);
    }
    // Attempts at 0, 5, 10, 15, 20 s.
    assert_eq!(mqtt.sim_connects(), 5);
    assert!(mqtt.sim_published().is_empty());
    assert!(svc.stats().skipped >= 3);

    mqtt.sim_set_reachable(true);
    svc.tick(25_000, &mut hw, &mut mqtt, &mut sink);
    assert_eq!(mqtt.sim_connects(), 6);
    assert_eq!(mqtt.sim_published().len(), 1);
}

#[test]
fn camera_round_trip_through_sim_server() {
    let cfg = camera_config(true);
    let id = device_id::client_id_for(&cfg.mqtt, &device_id::read_mac()).unwrap();
    let mut mqtt = MqttAdapter::new(&cfg.mqtt, id, cfg.reconnect_interval_ms).unwrap();
    let mut camera = CameraHardware::new(CameraDriver::init(&cfg).unwrap());
    let mut inference = InferenceClient::new(cfg.server_url);
    inference.sim_respond(200, br#"{"result":"wilting"}"#);
    let mut sink = RecordingSink::default();
    let mut svc = CameraService::new(&cfg);
    svc.start(&mut sink);

    svc.tick(0, &mut camera, &mut inference, &mut mqtt, &mut sink);
    assert!(mqtt.sim_inject(CAMERA_CMD_TOPIC, b"capture"));
    svc.tick(100, &mut camera, &mut inference, &mut mqtt, &mut sink);

    assert_eq!(svc.last_health(), Some(PlantHealth::Wilting));
    assert_eq!(camera.captures(), 1);
    let upload = &inference.sim_uploads()[0];
    assert!(String::from_utf8_lossy(upload).contains(r#"filename="capture.jpg""#));

    let (topic, body) = mqtt.sim_published().last().expect("report");
    assert_eq!(topic, CAMERA_REPORT_TOPIC);
    assert_eq!(body.as_slice(), br#"{"result":"wilting","captures":1}"#);
}

#[test]
fn distinct_boards_get_distinct_client_ids() {
    let mut cfg = controller_config();
    cfg.mqtt.append_mac_suffix = true;
    let a = device_id::client_id_for(&cfg.mqtt, &[0, 0, 0, 1, 2, 3]).unwrap();
    let b = device_id::client_id_for(&cfg.mqtt, &[0, 0, 0, 4, 5, 6]).unwrap();
    assert_ne!(a, b);
    assert!(a.starts_with("esp8266_aquaponics-"));
}
