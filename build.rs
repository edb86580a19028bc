use std::{collections::HashSet, env, error::Error, fs, path::Path};

use serde::Deserialize;

const DEFAULT_MQTT_PORT: u16 = 1883;

#[derive(Deserialize)]
struct RawConfig {
    wifi: RawWifi,
    controller: RawController,
    camera: RawCamera,
}

#[derive(Deserialize)]
struct RawWifi {
    ssid: String,
    #[serde(default)]
    password: String,
}

#[derive(Deserialize)]
struct RawMqtt {
    broker: String,
    #[serde(default = "default_port")]
    port: u16,
    client_id: String,
    cmd_topic: String,
    status_topic: Option<String>,
    #[serde(default)]
    append_mac_suffix: bool,
}

#[derive(Deserialize)]
struct RawPins {
    dht: i32,
    relay_pump: i32,
    relay_light: i32,
    float_switch: i32,
}

#[derive(Deserialize)]
struct RawController {
    mqtt: RawMqtt,
    pins: RawPins,
    publish_interval_ms: u32,
    reconnect_interval_ms: u32,
    #[serde(default = "yes")]
    relay_active_low: bool,
    #[serde(default = "yes")]
    float_switch_active_low: bool,
}

#[derive(Deserialize)]
struct RawCamera {
    mqtt: RawMqtt,
    server_url: String,
    capture_interval_ms: u32,
    reconnect_interval_ms: u32,
    #[serde(default = "default_frame_size")]
    frame_size: String,
    #[serde(default = "default_jpeg_quality")]
    jpeg_quality: u8,
}

fn default_port() -> u16 {
    DEFAULT_MQTT_PORT
}

fn yes() -> bool {
    true
}

fn default_frame_size() -> String {
    "vga".into()
}

fn default_jpeg_quality() -> u8 {
    12
}

fn frame_size_variant(name: &str) -> Result<&'static str, Box<dyn Error>> {
    Ok(match name.to_ascii_lowercase().as_str() {
        "qvga" => "FrameSize::Qvga",
        "vga" => "FrameSize::Vga",
        "svga" => "FrameSize::Svga",
        "xga" => "FrameSize::Xga",
        other => return Err(format!("cfg.toml: unknown camera.frame_size '{other}'").into()),
    })
}

fn check(raw: &RawConfig) -> Result<(), Box<dyn Error>> {
    let intervals = [
        ("controller.publish_interval_ms", raw.controller.publish_interval_ms),
        ("controller.reconnect_interval_ms", raw.controller.reconnect_interval_ms),
        ("camera.capture_interval_ms", raw.camera.capture_interval_ms),
        ("camera.reconnect_interval_ms", raw.camera.reconnect_interval_ms),
    ];
    for (name, value) in intervals {
        if value == 0 {
            return Err(format!("cfg.toml: {name} must be a positive number of milliseconds").into());
        }
    }

    let mut seen = HashSet::new();
    for mqtt in [&raw.controller.mqtt, &raw.camera.mqtt] {
        if mqtt.port == 0 {
            return Err(format!("cfg.toml: MQTT port for '{}' must be non-zero", mqtt.client_id).into());
        }
        if mqtt.client_id.is_empty() {
            return Err("cfg.toml: MQTT client_id must not be empty".into());
        }
        if !seen.insert(mqtt.client_id.as_str()) {
            return Err(format!(
                "cfg.toml: MQTT client_id '{}' is used by more than one device",
                mqtt.client_id
            )
            .into());
        }
    }
    Ok(())
}

fn mqtt_literal(m: &RawMqtt) -> String {
    format!(
        "MqttSettings {{ broker: {:?}, port: {}, client_id: {:?}, cmd_topic: {:?}, \
         status_topic: {:?}, append_mac_suffix: {} }}",
        m.broker, m.port, m.client_id, m.cmd_topic, m.status_topic, m.append_mac_suffix
    )
}

fn main() -> Result<(), Box<dyn Error>> {
    let cfg_path = env::var("AQUAPONICS_CFG").unwrap_or_else(|_| "cfg.toml".into());
    println!("cargo:rerun-if-changed={cfg_path}");
    println!("cargo:rerun-if-env-changed=AQUAPONICS_CFG");

    let toml_str = fs::read_to_string(&cfg_path)
        .map_err(|e| format!("cannot read {cfg_path}: {e}"))?;
    let raw: RawConfig = toml::from_str(&toml_str)?;
    check(&raw)?;

    let c = &raw.controller;
    let k = &raw.camera;
    let code = format!(
        r#"
pub const WIFI: WifiSettings = WifiSettings {{
    ssid: {ssid:?},
    password: {psk:?},
}};

pub const CONTROLLER: ControllerConfig = ControllerConfig {{
    mqtt: {c_mqtt},
    pins: PinMap {{ dht: {dht}, relay_pump: {pump}, relay_light: {light}, float_switch: {float} }},
    relay_active_low: {relay_low},
    float_switch_active_low: {float_low},
    publish_interval_ms: {publish},
    reconnect_interval_ms: {c_reconnect},
}};

pub const CAMERA: CameraConfig = CameraConfig {{
    mqtt: {k_mqtt},
    server_url: {url:?},
    capture_interval_ms: {capture},
    reconnect_interval_ms: {k_reconnect},
    frame_size: {frame},
    jpeg_quality: {quality},
}};
"#,
        ssid = raw.wifi.ssid,
        psk = raw.wifi.password,
        c_mqtt = mqtt_literal(&c.mqtt),
        dht = c.pins.dht,
        pump = c.pins.relay_pump,
        light = c.pins.relay_light,
        float = c.pins.float_switch,
        relay_low = c.relay_active_low,
        float_low = c.float_switch_active_low,
        publish = c.publish_interval_ms,
        c_reconnect = c.reconnect_interval_ms,
        k_mqtt = mqtt_literal(&k.mqtt),
        url = k.server_url,
        capture = k.capture_interval_ms,
        k_reconnect = k.reconnect_interval_ms,
        frame = frame_size_variant(&k.frame_size)?,
        quality = k.jpeg_quality,
    );

    let out_dir = env::var("OUT_DIR")?;
    fs::write(Path::new(&out_dir).join("config.rs"), code)?;

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();

    Ok(())
}
