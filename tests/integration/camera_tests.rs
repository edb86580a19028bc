//! CameraService against a mock camera, classifier and broker.

use aquaponics::app::camera::CameraService;
use aquaponics::app::commands::CommandError;
use aquaponics::app::events::{AppEvent, Node};
use aquaponics::app::status::PlantHealth;
use aquaponics::error::CommsError;

use super::mock_hw::*;

struct Rig {
    svc: CameraService,
    camera: MockCamera,
    inference: MockInference,
    mqtt: MockMqtt,
    sink: RecordingSink,
}

impl Rig {
    fn new(report: bool) -> Self {
        let mut sink = RecordingSink::default();
        let mut svc = CameraService::new(&camera_config(report));
        svc.start(&mut sink);
        Self {
            svc,
            camera: MockCamera::new(),
            inference: MockInference::new(),
            mqtt: MockMqtt::online(),
            sink,
        }
    }

    fn tick(&mut self, now: u64) {
        self.svc
            .tick(now, &mut self.camera, &mut self.inference, &mut self.mqtt, &mut self.sink);
    }
}

#[test]
fn start_event() {
    let rig = Rig::new(false);
    assert_eq!(rig.sink.events, vec![AppEvent::Started(Node::Camera)]);
}

#[test]
fn captures_on_schedule() {
    let mut rig = Rig::new(false);
    for now in (0..=90_000).step_by(100) {
        rig.tick(now);
    }
    // First capture one interval after boot, then every 30 s.
    assert_eq!(rig.camera.captures, 3);
    assert_eq!(rig.inference.uploads.len(), 3);
    assert_eq!(rig.svc.stats().captures, 3);
    assert_eq!(rig.svc.last_health(), Some(PlantHealth::Healthy));
}

#[test]
fn capture_command_runs_cycle_now() {
    let mut rig = Rig::new(false);
    rig.tick(0);
    rig.mqtt.push(CAMERA_CMD_TOPIC, b"capture");
    rig.tick(100);
    rig.mqtt.push(CAMERA_CMD_TOPIC, br#"{"action":"capture"}"#);
    rig.tick(200);

    assert_eq!(rig.camera.captures, 2);
    assert_eq!(rig.svc.stats().manual_triggers, 2);

    // Manual captures leave the schedule alone.
    rig.tick(30_000);
    assert_eq!(rig.camera.captures, 3);
}

#[test]
fn several_requests_in_one_tick_capture_once() {
    let mut rig = Rig::new(false);
    rig.mqtt.push(CAMERA_CMD_TOPIC, b"capture");
    rig.mqtt.push(CAMERA_CMD_TOPIC, b"CAPTURE");
    rig.tick(0);
    assert_eq!(rig.camera.captures, 1);
}

#[test]
fn unknown_command_rejected() {
    let mut rig = Rig::new(false);
    rig.mqtt.push(CAMERA_CMD_TOPIC, b"reboot");
    rig.mqtt.push("aquaponics/cmd", b"capture");
    rig.tick(0);

    assert_eq!(rig.camera.captures, 0);
    assert_eq!(
        rig.sink.count(|e| *e == AppEvent::CommandRejected(CommandError::Unknown)),
        1
    );
}

#[test]
fn failures_counted_and_next_cycle_proceeds() {
    let mut rig = Rig::new(false);
    rig.camera.fail_next = true;
    rig.inference = MockInference::new()
        .answer(Err(CommsError::HttpStatus(500)))
        .answer(Ok(PlantHealth::Wilting));

    rig.tick(0);
    rig.tick(30_000); // camera fails
    rig.tick(60_000); // server 500
    rig.tick(90_000); // classified

    let stats = rig.svc.stats();
    assert_eq!(stats.failures, 2);
    assert_eq!(stats.captures, 1);
    assert_eq!(rig.svc.last_health(), Some(PlantHealth::Wilting));
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::CaptureFailed(_))), 2);
}

#[test]
fn report_published_when_topic_configured() {
    let mut rig = Rig::new(true);
    rig.inference = MockInference::new().answer(Ok(PlantHealth::Yellowing));
    rig.mqtt.push(CAMERA_CMD_TOPIC, b"capture");
    rig.tick(0);

    let docs = rig.mqtt.json_on(CAMERA_REPORT_TOPIC);
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0]["result"], "yellowing");
    assert_eq!(docs[0]["captures"], 1);
}

#[test]
fn no_report_without_topic() {
    let mut rig = Rig::new(false);
    rig.mqtt.push(CAMERA_CMD_TOPIC, b"capture");
    rig.tick(0);

    assert_eq!(rig.camera.captures, 1);
    assert!(rig.mqtt.published.is_empty());
}

#[test]
fn classified_event_carries_upload_size() {
    let mut rig = Rig::new(false);
    rig.mqtt.push(CAMERA_CMD_TOPIC, b"capture");
    rig.tick(0);

    assert!(rig.sink.events.contains(&AppEvent::CaptureClassified {
        health: PlantHealth::Healthy,
        bytes: 36,
        captures: 1,
    }));
    assert_eq!(rig.inference.uploads, vec![36]);
}
