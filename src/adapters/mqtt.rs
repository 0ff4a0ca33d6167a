//! MQTT transport adapter.
//!
//! Outbound: implements [`PublishPort`] — one retained-nothing message per
//! measurement on `airnode/<module-id>/<unit>/<channel>`, plain decimal
//! text payload (`"412"`, `"21.6"`, `"NaN"`).
//!
//! Inbound: the ESP-IDF MQTT client delivers messages on its own task.
//! A bounded `embassy-sync` channel bridges them to the synchronous main
//! loop; the loop drains with [`try_recv_inbound`] at the top of every
//! tick.  A full queue drops the message with a warning — commands are
//! idempotent requests the hub re-sends.
//!
//! ```text
//! ┌──────────────┐  InboundMsg   ┌──────────────┐
//! │  MQTT task   │─────────────▶│   main loop   │
//! │  (client cb) │◀─────────────│  (publishes)  │
//! └──────────────┘   enqueue()   └──────────────┘
//! ```
//!
//! Broker reconnection is the ESP-IDF client's own affair; this adapter
//! never retries beyond the initial subscribe loop.

use core::fmt::Write;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{info, warn};

use crate::app::commands;
use crate::app::ports::PublishPort;
use crate::registry::{self, HardwareId};

// ───────────────────────────────────────────────────────────────
// Compile-time identity
// ───────────────────────────────────────────────────────────────

/// Stable module identity: topic prefix segment and MQTT client id.
pub const MODULE_ID: &str = match option_env!("AIRNODE_MODULE_ID") {
    Some(id) => id,
    None => "module-esp32-1",
};

/// Broker URL.  Overridden per site at build time.
pub const BROKER_URL: &str = match option_env!("AIRNODE_MQTT_URL") {
    Some(url) => url,
    None => "mqtt://192.168.1.10:1883",
};

// ───────────────────────────────────────────────────────────────
// Inbound bridge
// ───────────────────────────────────────────────────────────────

/// One inbound MQTT message, bounded copies of topic and payload.
pub struct InboundMsg {
    pub topic: heapless::String<128>,
    pub payload: heapless::Vec<u8, 512>,
}

/// Channel depth for inbound command messages.
const INBOUND_DEPTH: usize = 8;

static INBOUND: Channel<CriticalSectionRawMutex, InboundMsg, INBOUND_DEPTH> = Channel::new();

/// Non-blocking receive for the main loop.
pub fn try_recv_inbound() -> Option<InboundMsg> {
    INBOUND.try_receive().ok()
}

/// Copy an incoming message into the bridge.  Oversized topics or
/// payloads and a full queue all drop the message.
fn enqueue_inbound(topic: &str, payload: &[u8]) {
    let mut msg = InboundMsg {
        topic: heapless::String::new(),
        payload: heapless::Vec::new(),
    };
    if msg.topic.push_str(topic).is_err() {
        warn!("MQTT: inbound topic exceeds {} bytes, dropped", 128);
        return;
    }
    if msg.payload.extend_from_slice(payload).is_err() {
        warn!("MQTT: inbound payload on '{}' exceeds {} bytes, dropped", topic, 512);
        return;
    }
    if INBOUND.try_send(msg).is_err() {
        warn!("MQTT: inbound queue full, dropped message on '{}'", topic);
    }
}

/// Test/simulation entry point for the inbound bridge.
#[cfg(not(target_os = "espidf"))]
pub fn sim_inject_inbound(topic: &str, payload: &[u8]) {
    enqueue_inbound(topic, payload);
}

// ───────────────────────────────────────────────────────────────
// Topic construction
// ───────────────────────────────────────────────────────────────

/// `airnode/<module-id><suffix>` — the three command subscriptions.
fn command_topic(suffix: &str) -> heapless::String<64> {
    let mut t = heapless::String::new();
    let _ = write!(t, "airnode/{}{}", MODULE_ID, suffix);
    t
}

/// `airnode/<module-id>/<unit>/<channel>` — one measurement publication.
fn measurement_topic(hw: HardwareId, channel: registry::Channel) -> heapless::String<96> {
    let mut t = heapless::String::new();
    let _ = write!(t, "airnode/{}/{}/{}", MODULE_ID, hw.id(), channel.name());
    t
}

/// Decimal text rendering; `f32::NAN` renders as `NaN`.
fn format_value(value: f32) -> heapless::String<24> {
    let mut s = heapless::String::new();
    let _ = write!(s, "{}", value);
    s
}

// ───────────────────────────────────────────────────────────────
// Adapter
// ───────────────────────────────────────────────────────────────

pub struct MqttAdapter {
    #[cfg(target_os = "espidf")]
    client: esp_idf_svc::mqtt::client::EspMqttClient<'static>,
}

#[cfg(target_os = "espidf")]
impl MqttAdapter {
    /// Connect to the broker, spawn the event-pump thread, and subscribe
    /// to the three command topics.
    pub fn connect() -> anyhow::Result<Self> {
        use esp_idf_svc::mqtt::client::{EspMqttClient, EventPayload, MqttClientConfiguration, QoS};

        let conf = MqttClientConfiguration {
            client_id: Some(MODULE_ID),
            keep_alive_interval: Some(core::time::Duration::from_secs(30)),
            ..Default::default()
        };
        info!("MQTT: connecting to {} as '{}'", BROKER_URL, MODULE_ID);
        let (client, mut connection) = EspMqttClient::new(BROKER_URL, &conf)?;

        // The connection must be pumped continuously or the client stalls.
        // Received messages cross to the main loop through the bridge.
        std::thread::Builder::new()
            .name("mqtt-events".into())
            .stack_size(6 * 1024)
            .spawn(move || {
                while let Ok(event) = connection.next() {
                    if let EventPayload::Received {
                        topic: Some(topic),
                        data,
                        ..
                    } = event.payload()
                    {
                        enqueue_inbound(topic, data);
                    }
                }
                warn!("MQTT: event loop terminated");
            })?;

        let mut adapter = Self { client };
        for suffix in [
            commands::CONFIG_SUFFIX,
            commands::RESET_SUFFIX,
            commands::ENABLE_SUFFIX,
        ] {
            let topic = command_topic(suffix);
            // Subscribing before the broker session is up returns an
            // error; retry until the client has connected.
            while let Err(e) = adapter.client.subscribe(&topic, QoS::AtLeastOnce) {
                warn!("MQTT: subscribe {} failed ({}), retrying", topic, e);
                std::thread::sleep(core::time::Duration::from_millis(500));
            }
            info!("MQTT: subscribed {}", topic);
        }
        Ok(adapter)
    }
}

#[cfg(not(target_os = "espidf"))]
impl MqttAdapter {
    /// Host build: no broker, publications go to the log.
    pub fn connect() -> anyhow::Result<Self> {
        info!("MQTT(sim): no broker, publications logged");
        Ok(Self {})
    }
}

impl PublishPort for MqttAdapter {
    fn publish(&mut self, hw: HardwareId, channel: registry::Channel, value: f32) {
        let topic = measurement_topic(hw, channel);
        let payload = format_value(value);

        #[cfg(target_os = "espidf")]
        {
            use esp_idf_svc::mqtt::client::QoS;
            // Non-blocking: the client owns an outbox; a full outbox or a
            // dropped broker session loses the sample, never the loop.
            if let Err(e) =
                self.client
                    .enqueue(&topic, QoS::AtMostOnce, false, payload.as_bytes())
            {
                warn!("MQTT: publish {} failed: {}", topic, e);
            }
        }

        #[cfg(not(target_os = "espidf"))]
        info!("MQTT(sim): {} <- {}", topic, payload);
    }
}
