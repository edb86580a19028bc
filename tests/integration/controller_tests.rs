//! ControllerService against mock hardware and a mock broker.

use aquaponics::app::commands::CommandError;
use aquaponics::app::controller::ControllerService;
use aquaponics::app::events::{AppEvent, Node};
use aquaponics::sensors::float_switch::WaterLevel;

use super::mock_hw::*;

fn started() -> (ControllerService, MockHardware, MockMqtt, RecordingSink) {
    let mut svc = ControllerService::new(&controller_config());
    let mut hw = MockHardware::new();
    let mut sink = RecordingSink::default();
    svc.start(&mut hw, &mut sink);
    hw.calls.clear();
    (svc, hw, MockMqtt::online(), sink)
}

// ── Startup ───────────────────────────────────────────────────

#[test]
fn start_drives_both_relays_off() {
    let mut svc = ControllerService::new(&controller_config());
    let mut hw = MockHardware::new();
    let mut sink = RecordingSink::default();
    svc.start(&mut hw, &mut sink);

    assert_eq!(hw.calls, vec![RelayCall::Pump(false), RelayCall::Light(false)]);
    assert_eq!(sink.events.first(), Some(&AppEvent::Started(Node::Controller)));
}

// ── Periodic publishing ───────────────────────────────────────

#[test]
fn status_published_once_per_interval() {
    let (mut svc, mut hw, mut mqtt, mut sink) = started();

    for now in (0..=10_000).step_by(50) {
        svc.tick(now, &mut hw, &mut mqtt, &mut sink);
    }

    // Delayed timer: first publish at 5 s, second at 10 s.
    assert_eq!(mqtt.json_on(STATUS_TOPIC).len(), 2);
    assert_eq!(svc.stats().published, 2);
}

#[test]
fn status_document_shape() {
    let (mut svc, mut hw, mut mqtt, mut sink) = started();
    svc.tick(0, &mut hw, &mut mqtt, &mut sink);
    svc.tick(5_000, &mut hw, &mut mqtt, &mut sink);

    let docs = mqtt.json_on(STATUS_TOPIC);
    let doc = docs.last().expect("one status");
    assert!((doc["temp"].as_f64().unwrap() - 26.4).abs() < 0.01);
    assert!((doc["humidity"].as_f64().unwrap() - 71.0).abs() < 0.01);
    assert_eq!(doc["water"], "Đầy");
    assert_eq!(doc["pump"], false);
    assert_eq!(doc["light"], false);
}

#[test]
fn missing_dht_reading_publishes_null() {
    let (mut svc, mut hw, mut mqtt, mut sink) = started();
    hw.snapshot.temperature_c = None;
    hw.snapshot.humidity_pct = None;
    hw.snapshot.water = WaterLevel::Low;

    svc.tick(0, &mut hw, &mut mqtt, &mut sink);
    svc.tick(5_000, &mut hw, &mut mqtt, &mut sink);

    let doc = &mqtt.json_on(STATUS_TOPIC)[0];
    assert!(doc["temp"].is_null());
    assert!(doc["humidity"].is_null());
    assert_eq!(doc["water"], "Thấp");
}

#[test]
fn sensors_sampled_every_second() {
    let (mut svc, mut hw, mut mqtt, mut sink) = started();
    for now in [0, 400, 900, 1_000, 1_500, 2_000] {
        svc.tick(now, &mut hw, &mut mqtt, &mut sink);
    }
    assert_eq!(hw.reads, 3);
}

#[test]
fn offline_publish_is_skipped_not_queued() {
    let (mut svc, mut hw, _, mut sink) = started();
    let mut mqtt = MockMqtt::offline();

    svc.tick(0, &mut hw, &mut mqtt, &mut sink);
    svc.tick(5_000, &mut hw, &mut mqtt, &mut sink);
    assert!(mqtt.published.is_empty());
    assert_eq!(svc.stats().skipped, 1);
    assert_eq!(sink.count(|e| *e == AppEvent::StatusSkipped), 1);

    // Back online: only the next interval publishes, nothing is replayed.
    mqtt.connected = true;
    svc.tick(6_000, &mut hw, &mut mqtt, &mut sink);
    assert!(mqtt.published.is_empty());
    svc.tick(10_000, &mut hw, &mut mqtt, &mut sink);
    assert_eq!(mqtt.published.len(), 1);
}

#[test]
fn connection_changes_reported_once_each() {
    let (mut svc, mut hw, _, mut sink) = started();
    let mut mqtt = MockMqtt::offline();

    svc.tick(0, &mut hw, &mut mqtt, &mut sink);
    mqtt.connected = true;
    svc.tick(50, &mut hw, &mut mqtt, &mut sink);
    svc.tick(100, &mut hw, &mut mqtt, &mut sink);
    mqtt.connected = false;
    svc.tick(150, &mut hw, &mut mqtt, &mut sink);

    let changes: Vec<_> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::ConnectionChanged { connected } => Some(*connected),
            _ => None,
        })
        .collect();
    assert_eq!(changes, vec![true, false]);
    assert_eq!(mqtt.polls, vec![0, 50, 100, 150]);
}

// ── Commands ──────────────────────────────────────────────────

#[test]
fn command_applies_and_publishes_immediately() {
    let (mut svc, mut hw, mut mqtt, mut sink) = started();
    mqtt.push(CMD_TOPIC, br#"{"pump":true,"light":true}"#);

    svc.tick(0, &mut hw, &mut mqtt, &mut sink);

    assert_eq!(hw.calls, vec![RelayCall::Pump(true), RelayCall::Light(true)]);
    let docs = mqtt.json_on(STATUS_TOPIC);
    assert_eq!(docs.len(), 1, "status follows the command without waiting");
    assert_eq!(docs[0]["pump"], true);
    assert_eq!(docs[0]["light"], true);
    assert!(sink.events.contains(&AppEvent::RelaysChanged { pump: true, light: true }));
}

#[test]
fn absent_field_leaves_relay_alone() {
    let (mut svc, mut hw, mut mqtt, mut sink) = started();
    mqtt.push(CMD_TOPIC, br#"{"light":true}"#);
    svc.tick(0, &mut hw, &mut mqtt, &mut sink);
    mqtt.push(CMD_TOPIC, br#"{"pump":true}"#);
    svc.tick(50, &mut hw, &mut mqtt, &mut sink);

    assert_eq!(hw.calls, vec![RelayCall::Light(true), RelayCall::Pump(true)]);
    let docs = mqtt.json_on(STATUS_TOPIC);
    assert_eq!(docs[1]["light"], true);
    assert_eq!(docs[1]["pump"], true);
}

#[test]
fn bad_commands_rejected_without_touching_relays() {
    let (mut svc, mut hw, mut mqtt, mut sink) = started();
    mqtt.push(CMD_TOPIC, b"pump on");
    mqtt.push(CMD_TOPIC, b"{}");
    mqtt.push(CMD_TOPIC, br#"{"pump":"yes"}"#);

    svc.tick(0, &mut hw, &mut mqtt, &mut sink);

    assert!(hw.calls.is_empty());
    assert!(mqtt.published.is_empty());
    assert_eq!(svc.stats().commands_rejected, 3);
    assert!(sink.events.contains(&AppEvent::CommandRejected(CommandError::Malformed)));
    assert!(sink.events.contains(&AppEvent::CommandRejected(CommandError::Empty)));
}

#[test]
fn messages_on_other_topics_ignored() {
    let (mut svc, mut hw, mut mqtt, mut sink) = started();
    mqtt.push("aquaponics/camera_cmd", br#"{"pump":true}"#);
    svc.tick(0, &mut hw, &mut mqtt, &mut sink);

    assert!(hw.calls.is_empty());
    assert_eq!(svc.stats().commands_applied, 0);
    assert_eq!(svc.stats().commands_rejected, 0);
}

#[test]
fn relay_fault_is_reported() {
    let (mut svc, mut hw, mut mqtt, mut sink) = started();
    hw.fail_writes = true;
    mqtt.push(CMD_TOPIC, br#"{"pump":true}"#);
    svc.tick(0, &mut hw, &mut mqtt, &mut sink);

    assert_eq!(sink.count(|e| matches!(e, AppEvent::ActuatorFault(_))), 1);
    // Reported state is what the relay actually holds.
    assert_eq!(mqtt.json_on(STATUS_TOPIC)[0]["pump"], false);
}

#[test]
fn without_status_topic_nothing_is_published() {
    let mut cfg = controller_config();
    cfg.mqtt.status_topic = None;
    let mut svc = ControllerService::new(&cfg);
    let mut hw = MockHardware::new();
    let mut mqtt = MockMqtt::online();
    let mut sink = RecordingSink::default();
    svc.start(&mut hw, &mut sink);

    mqtt.push(CMD_TOPIC, br#"{"light":true}"#);
    for now in (0..=10_000).step_by(50) {
        svc.tick(now, &mut hw, &mut mqtt, &mut sink);
    }

    assert!(hw.calls.contains(&RelayCall::Light(true)));
    assert!(mqtt.published.is_empty());
    assert_eq!(svc.stats().published, 0);
}
