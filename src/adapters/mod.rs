//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter      | Implements        | Connects to                  |
//! |--------------|-------------------|------------------------------|
//! | `hardware`   | SensorPort        | DHT22, float switch (GPIO)   |
//! |              | ActuatorPort      | Pump + light relays (GPIO)   |
//! |              | CameraPort        | OV2640 via esp32-camera      |
//! | `inference`  | InferencePort     | HTTP(S) `/predict` endpoint  |
//! | `log_sink`   | EventSink         | Serial log output            |
//! | `mqtt`       | MessagingPort     | ESP-IDF MQTT client          |
//! | `wifi`       | ConnectivityPort  | ESP-IDF WiFi STA             |
//!
//! `device_id`, `reconnect` and `time` are shared helpers.

pub mod device_id;
pub mod hardware;
pub mod inference;
pub mod log_sink;
pub mod mqtt;
pub mod reconnect;
pub mod time;
pub(crate) mod utils;
pub mod wifi;
