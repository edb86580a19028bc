//! MQTT 3.1.1 client adapter.
//!
//! Implements [`MessagingPort`] for both nodes.  On every (re)connect the
//! adapter subscribes to the node's command topic; publishes are QoS 0.
//!
//! ```text
//!  ESP-IDF MQTT task ──callback──▶ Channel<InboundMessage, 8> ──take_inbound──▶ main loop
//!                    └─atomics──▶ connected / needs_subscribe ──poll──────────▶ subscribe
//! ```
//!
//! The callback never blocks: a full queue or an oversized message is
//! dropped and counted.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `EspMqttClient` callback API.  The driver
//!   reconnects on its own every `reconnect_interval_ms`; this adapter only
//!   retries creating the client if that fails.
//! - **all other targets**: an in-memory broker with a reachability switch,
//!   a publish log, and message injection for host tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{info, warn};

use crate::app::ports::{InboundMessage, MessagingPort};
use crate::config::{self, ConfigError, MAX_BROKER_URL_LEN, MqttSettings};
use crate::error::CommsError;

use super::device_id::ClientId;
use super::reconnect::ReconnectPolicy;

#[cfg(target_os = "espidf")]
use core::sync::atomic::AtomicBool;
#[cfg(target_os = "espidf")]
use esp_idf_svc::mqtt::client::{EspMqttClient, QoS};

/// Inbound messages buffered between the MQTT task and the main loop.
pub const INBOUND_DEPTH: usize = 8;

pub type InboundChannel = Channel<CriticalSectionRawMutex, InboundMessage, INBOUND_DEPTH>;

/// Keep-alive sent to the broker.
pub const KEEP_ALIVE_SECS: u64 = 30;

pub struct MqttAdapter {
    cmd_topic: &'static str,
    client_id: ClientId,
    url: heapless::String<MAX_BROKER_URL_LEN>,
    inbound: Arc<InboundChannel>,
    dropped: Arc<AtomicU32>,
    policy: ReconnectPolicy,
    #[cfg(target_os = "espidf")]
    client: Option<EspMqttClient<'static>>,
    #[cfg(target_os = "espidf")]
    link: Arc<LinkFlags>,
    #[cfg(not(target_os = "espidf"))]
    sim: SimBroker,
}

/// Connection state written by the MQTT task, read by the main loop.
#[cfg(target_os = "espidf")]
#[derive(Default)]
struct LinkFlags {
    connected: AtomicBool,
    needs_subscribe: AtomicBool,
}

#[cfg(not(target_os = "espidf"))]
#[derive(Debug)]
struct SimBroker {
    reachable: bool,
    session: bool,
    connects: u32,
    subscriptions: Vec<String>,
    published: Vec<(String, Vec<u8>)>,
}

impl MqttAdapter {
    /// `client_id` is the final identifier (see
    /// [`client_id_for`](super::device_id::client_id_for)).
    pub fn new(
        settings: &MqttSettings,
        client_id: ClientId,
        reconnect_interval_ms: u32,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            cmd_topic: settings.cmd_topic,
            client_id,
            url: settings.broker_url()?,
            inbound: Arc::new(Channel::new()),
            dropped: Arc::new(AtomicU32::new(0)),
            policy: ReconnectPolicy::new(reconnect_interval_ms),
            #[cfg(target_os = "espidf")]
            client: None,
            #[cfg(target_os = "espidf")]
            link: Arc::new(LinkFlags::default()),
            #[cfg(not(target_os = "espidf"))]
            sim: SimBroker {
                reachable: true,
                session: false,
                connects: 0,
                subscriptions: Vec::new(),
                published: Vec::new(),
            },
        })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Inbound messages discarded (queue full, oversized, or fragmented).
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Connection attempts since the last successful session.
    pub fn attempts(&self) -> u32 {
        self.policy.attempts()
    }

    fn enqueue(inbound: &InboundChannel, dropped: &AtomicU32, topic: &str, payload: &[u8]) -> bool {
        let Some(msg) = InboundMessage::new(topic, payload) else {
            dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        };
        if inbound.try_send(msg).is_err() {
            dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        true
    }

    // ── ESP-IDF ───────────────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn create_client(&mut self) -> Result<(), CommsError> {
        use core::time::Duration;
        use esp_idf_svc::mqtt::client::{Details, EventPayload, MqttClientConfiguration};

        let conf = MqttClientConfiguration {
            client_id: Some(self.client_id.as_str()),
            keep_alive_interval: Some(Duration::from_secs(KEEP_ALIVE_SECS)),
            reconnect_timeout: Some(Duration::from_millis(self.policy.interval_ms())),
            ..Default::default()
        };

        let link = Arc::clone(&self.link);
        let inbound = Arc::clone(&self.inbound);
        let dropped = Arc::clone(&self.dropped);

        let client = EspMqttClient::new_cb(&self.url, &conf, move |event| match event.payload() {
            EventPayload::Connected(_) => {
                link.connected.store(true, Ordering::Release);
                link.needs_subscribe.store(true, Ordering::Release);
            }
            EventPayload::Disconnected => link.connected.store(false, Ordering::Release),
            EventPayload::Received { topic, data, details, .. } => {
                match (topic, details) {
                    (Some(topic), Details::Complete) => {
                        Self::enqueue(&inbound, &dropped, topic, data);
                    }
                    _ => {
                        dropped.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
            _ => {}
        })
        .map_err(|e| {
            warn!("MQTT: client creation failed: {e}");
            CommsError::MqttConnectFailed
        })?;

        info!("MQTT: connecting to {} as '{}'", self.url, self.client_id);
        self.client = Some(client);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_poll(&mut self, now_ms: u64) {
        if self.client.is_none() {
            if self.policy.should_attempt(now_ms) {
                let _ = self.create_client();
            }
            return;
        }

        let up = self.link.connected.load(Ordering::Acquire);
        if up && !self.policy.is_connected() {
            info!("MQTT: connected");
            self.policy.on_connected();
        } else if !up && self.policy.is_connected() {
            warn!("MQTT: connection lost, driver retries every {} ms", self.policy.interval_ms());
            self.policy.on_disconnected();
        }

        if up && self.link.needs_subscribe.swap(false, Ordering::AcqRel) {
            let topic = self.cmd_topic;
            if let Some(client) = self.client.as_mut() {
                match client.subscribe(topic, QoS::AtMostOnce) {
                    Ok(_) => info!("MQTT: subscribed to '{}'", topic),
                    Err(e) => {
                        warn!("MQTT: subscribe to '{}' failed: {e}", topic);
                        self.link.needs_subscribe.store(true, Ordering::Release);
                    }
                }
            }
        }
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.client.is_some() && self.link.connected.load(Ordering::Acquire)
    }

    #[cfg(target_os = "espidf")]
    fn platform_publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError> {
        let client = self.client.as_mut().ok_or(CommsError::NotConnected)?;
        client
            .publish(topic, QoS::AtMostOnce, false, payload)
            .map(|_| ())
            .map_err(|_| CommsError::MqttPublishFailed)
    }

    // ── Simulation ────────────────────────────────────────────

    #[cfg(not(target_os = "espidf"))]
    fn platform_poll(&mut self, now_ms: u64) {
        if self.sim.session && !self.sim.reachable {
            warn!("MQTT(sim): connection lost");
            self.sim.session = false;
            self.policy.on_disconnected();
        }
        if self.sim.session || !self.policy.should_attempt(now_ms) {
            return;
        }
        self.sim.connects += 1;
        if !self.sim.reachable {
            warn!("MQTT(sim): broker unreachable (attempt {})", self.policy.attempts());
            return;
        }
        self.sim.session = true;
        self.policy.on_connected();
        self.sim.subscriptions.clear();
        self.sim.subscriptions.push(self.cmd_topic.to_owned());
        info!("MQTT(sim): '{}' connected, subscribed to '{}'", self.client_id, self.cmd_topic);
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.sim.session
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError> {
        if !self.sim.session {
            return Err(CommsError::NotConnected);
        }
        self.sim.published.push((topic.to_owned(), payload.to_vec()));
        Ok(())
    }

    /// Make the simulated broker reachable or not.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_set_reachable(&mut self, reachable: bool) {
        self.sim.reachable = reachable;
    }

    /// Deliver a message as the broker would; `false` if not delivered.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_inject(&mut self, topic: &str, payload: &[u8]) -> bool {
        let subscribed = self
            .sim
            .subscriptions
            .iter()
            .any(|f| config::topic_matches(f, topic));
        if !self.sim.session || !subscribed {
            return false;
        }
        Self::enqueue(&self.inbound, &self.dropped, topic, payload)
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_published(&self) -> &[(String, Vec<u8>)] {
        &self.sim.published
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_subscriptions(&self) -> &[String] {
        &self.sim.subscriptions
    }

    /// Connection attempts made against the simulated broker.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_connects(&self) -> u32 {
        self.sim.connects
    }
}

impl MessagingPort for MqttAdapter {
    fn poll(&mut self, now_ms: u64) {
        self.platform_poll(now_ms);
    }

    fn is_connected(&self) -> bool {
        self.platform_is_connected()
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError> {
        config::validate_topic_name(topic).map_err(|_| CommsError::MqttPublishFailed)?;
        self.platform_publish(topic, payload)
    }

    fn take_inbound(&mut self) -> Option<InboundMessage> {
        self.inbound.try_receive().ok()
    }
}
