// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MQTT broker connection for the bridge.
//!
//! The connection publishes unit state and hands every inbound message to
//! the caller through a channel. Acknowledgements are manual: a QoS 1
//! message is only acknowledged once [`Acknowledger::ack`] is called for
//! it, which the bridge does after the command has been processed.
//!
//! # Examples
//!
//! ```no_run
//! use zhonghong_bridge::protocol::{Acknowledger, MqttBroker};
//!
//! # async fn example() -> zhonghong_bridge::Result<()> {
//! let (broker, mut inbound) = MqttBroker::builder()
//!     .host("192.168.1.2")
//!     .port(1883)
//!     .credentials("user", "password")
//!     .build()
//!     .await?;
//!
//! broker.subscribe(&["zhonghong/+/+/fan/set".to_string()]).await?;
//!
//! while let Some(message) = inbound.recv().await {
//!     println!("{} = {}", message.topic(), message.payload());
//!     broker.ack(&message).await?;
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::RwLock;
use rumqttc::{AsyncClient, EventLoop, MqttOptions, Publish, QoS};
use tokio::sync::{mpsc, oneshot};

use crate::error::ProtocolError;
use crate::protocol::{Acknowledger, Publisher};

/// Capacity of the inbound message channel.
const INBOUND_CAPACITY: usize = 64;

/// Delay before polling the event loop again after a connection error.
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Configuration for an MQTT broker connection.
#[derive(Debug, Clone)]
pub struct MqttBrokerConfig {
    host: String,
    port: u16,
    credentials: Option<(String, String)>,
    client_id: Option<String>,
    keep_alive: Duration,
    connection_timeout: Duration,
}

impl Default for MqttBrokerConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 1883,
            credentials: None,
            client_id: None,
            keep_alive: Duration::from_secs(30),
            connection_timeout: Duration::from_secs(10),
        }
    }
}

/// A message received on one of the bridge's subscriptions.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    topic: String,
    payload: String,
    publish: Publish,
}

impl From<Publish> for InboundMessage {
    fn from(publish: Publish) -> Self {
        Self {
            topic: publish.topic.clone(),
            payload: String::from_utf8_lossy(&publish.payload).into_owned(),
            publish,
        }
    }
}

impl InboundMessage {
    /// Returns the topic the message was published on.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Returns the payload as text. Invalid UTF-8 is replaced lossily.
    #[must_use]
    pub fn payload(&self) -> &str {
        &self.payload
    }
}

/// A persistent connection to an MQTT broker.
///
/// `MqttBroker` is cheaply cloneable (via `Arc`) and can be shared between
/// the poll loop and the command handlers.
#[derive(Clone)]
pub struct MqttBroker {
    inner: Arc<MqttBrokerInner>,
}

struct MqttBrokerInner {
    /// The MQTT async client for publishing.
    client: AsyncClient,
    /// Configuration used for this connection.
    config: MqttBrokerConfig,
    /// Client identifier sent to the broker.
    client_id: String,
    /// Connection status.
    connected: AtomicBool,
    /// Filters to restore after a reconnect.
    filters: RwLock<Vec<String>>,
}

impl MqttBroker {
    /// Creates a new builder for configuring an MQTT broker connection.
    #[must_use]
    pub fn builder() -> MqttBrokerBuilder {
        MqttBrokerBuilder::default()
    }

    /// Returns whether the broker is currently connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::Acquire)
    }

    /// Returns the host address of the broker.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.inner.config.host
    }

    /// Returns the port of the broker.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.inner.config.port
    }

    /// Returns the client identifier used for this connection.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.inner.client_id
    }

    /// Subscribes to the given topic filters with QoS 1.
    ///
    /// The filters are remembered and restored whenever the connection is
    /// re-established.
    ///
    /// # Errors
    ///
    /// Returns error if a subscription request cannot be queued.
    pub async fn subscribe(&self, filters: &[String]) -> Result<(), ProtocolError> {
        for filter in filters {
            self.inner
                .client
                .subscribe(filter, QoS::AtLeastOnce)
                .await
                .map_err(ProtocolError::Mqtt)?;
            tracing::debug!(filter = %filter, "Subscribed to topic filter");
        }
        self.inner.filters.write().extend(filters.iter().cloned());
        Ok(())
    }

    /// Disconnects from the broker.
    ///
    /// # Errors
    ///
    /// Returns error if the disconnect operation fails.
    pub async fn disconnect(&self) -> Result<(), ProtocolError> {
        tracing::info!(
            host = %self.inner.config.host,
            port = %self.inner.config.port,
            "Disconnecting from MQTT broker"
        );

        self.inner
            .client
            .disconnect()
            .await
            .map_err(ProtocolError::Mqtt)?;

        self.inner.connected.store(false, Ordering::Release);
        Ok(())
    }

    /// Re-issues remembered subscriptions from a separate task.
    ///
    /// The request channel may be full of publishes queued while the
    /// connection was down, so the requests are awaited rather than tried;
    /// the event loop drains the channel while they wait.
    fn restore_subscriptions(&self) {
        let filters = self.inner.filters.read().clone();
        if filters.is_empty() {
            return;
        }

        let client = self.inner.client.clone();
        tokio::spawn(async move {
            let restored = resubscribe(&client, &filters).await;
            tracing::info!(
                restored,
                total = filters.len(),
                "Restored subscriptions after reconnect"
            );
        });
    }
}

/// Subscribes to every filter, waiting for room in the request channel.
///
/// Returns the number of subscription requests queued.
async fn resubscribe(client: &AsyncClient, filters: &[String]) -> usize {
    let mut restored = 0;
    for filter in filters {
        match client.subscribe(filter, QoS::AtLeastOnce).await {
            Ok(()) => restored += 1,
            Err(e) => {
                tracing::warn!(filter = %filter, error = %e, "Failed to restore subscription");
            }
        }
    }
    restored
}

impl Publisher for MqttBroker {
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), ProtocolError> {
        tracing::debug!(topic = %topic, payload = %payload, "Publishing MQTT message");

        self.inner
            .client
            .publish(topic, QoS::AtLeastOnce, false, payload.as_bytes().to_vec())
            .await
            .map_err(ProtocolError::Mqtt)
    }
}

impl Acknowledger for MqttBroker {
    async fn ack(&self, message: &InboundMessage) -> Result<(), ProtocolError> {
        self.inner
            .client
            .ack(&message.publish)
            .await
            .map_err(ProtocolError::Mqtt)
    }
}

impl std::fmt::Debug for MqttBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqttBroker")
            .field("host", &self.inner.config.host)
            .field("port", &self.inner.config.port)
            .field("client_id", &self.inner.client_id)
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// Builder for creating an MQTT broker connection.
///
/// # Examples
///
/// ```no_run
/// use zhonghong_bridge::protocol::MqttBroker;
/// use std::time::Duration;
///
/// # async fn example() -> zhonghong_bridge::Result<()> {
/// let (broker, inbound) = MqttBroker::builder()
///     .host("192.168.1.2")
///     .port(1883)
///     .credentials("user", "password")
///     .client_id("zhm-living-room")
///     .keep_alive(Duration::from_secs(60))
///     .connection_timeout(Duration::from_secs(5))
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MqttBrokerBuilder {
    config: MqttBrokerConfig,
}

impl MqttBrokerBuilder {
    /// Sets the broker host address.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Sets the broker port (default: 1883).
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Sets authentication credentials.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.credentials = Some((username.into(), password.into()));
        self
    }

    /// Sets the client identifier (default: `zhm-<uuid>`).
    #[must_use]
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.config.client_id = Some(client_id.into());
        self
    }

    /// Sets the keep-alive interval (default: 30 seconds).
    #[must_use]
    pub fn keep_alive(mut self, duration: Duration) -> Self {
        self.config.keep_alive = duration;
        self
    }

    /// Sets the connection timeout (default: 10 seconds).
    #[must_use]
    pub fn connection_timeout(mut self, duration: Duration) -> Self {
        self.config.connection_timeout = duration;
        self
    }

    /// Connects to the broker.
    ///
    /// Returns the broker handle and the receiver of inbound messages.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Host is not set
    /// - Connection fails
    /// - Connection times out
    pub async fn build(
        self,
    ) -> Result<(MqttBroker, mpsc::Receiver<InboundMessage>), ProtocolError> {
        if self.config.host.is_empty() {
            return Err(ProtocolError::InvalidAddress(
                "MQTT broker host is required".to_string(),
            ));
        }

        let client_id = self
            .config
            .client_id
            .clone()
            .unwrap_or_else(|| format!("zhm-{}", uuid::Uuid::new_v4()));

        let mut mqtt_options = MqttOptions::new(&client_id, &self.config.host, self.config.port);
        mqtt_options.set_keep_alive(self.config.keep_alive);
        mqtt_options.set_clean_session(true);
        mqtt_options.set_manual_acks(true);

        if let Some((ref username, ref password)) = self.config.credentials {
            mqtt_options.set_credentials(username, password);
        }

        let (client, event_loop) = AsyncClient::new(mqtt_options, 10);

        let inner = MqttBrokerInner {
            client,
            config: self.config.clone(),
            client_id,
            connected: AtomicBool::new(false),
            filters: RwLock::new(Vec::new()),
        };

        let broker = MqttBroker {
            inner: Arc::new(inner),
        };

        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_CAPACITY);
        let (connack_tx, connack_rx) = oneshot::channel();

        let broker_clone = broker.clone();
        tokio::spawn(async move {
            handle_broker_events(event_loop, broker_clone, inbound_tx, connack_tx).await;
        });

        let timeout = self.config.connection_timeout;
        match tokio::time::timeout(timeout, connack_rx).await {
            Ok(Ok(())) => {
                tracing::info!(
                    host = %self.config.host,
                    port = %self.config.port,
                    client_id = %broker.client_id(),
                    "Connected to MQTT broker"
                );
            }
            Ok(Err(_)) => {
                return Err(ProtocolError::ConnectionFailed(
                    "MQTT event loop terminated before connecting".to_string(),
                ));
            }
            Err(_) => {
                return Err(ProtocolError::ConnectionFailed(format!(
                    "MQTT connection timeout after {}s",
                    timeout.as_secs()
                )));
            }
        }

        Ok((broker, inbound_rx))
    }
}

/// Drives the event loop for the lifetime of the connection.
///
/// An error before the first `ConnAck` ends the loop so that `build` fails.
/// Later errors are logged and the loop keeps polling, which makes
/// `rumqttc` reconnect.
async fn handle_broker_events(
    mut event_loop: EventLoop,
    broker: MqttBroker,
    inbound_tx: mpsc::Sender<InboundMessage>,
    connack_tx: oneshot::Sender<()>,
) {
    use rumqttc::{Event, Packet};

    let mut connack_tx = Some(connack_tx);

    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(connack))) => {
                tracing::debug!(?connack, "MQTT broker connected");
                broker.inner.connected.store(true, Ordering::Release);
                match connack_tx.take() {
                    Some(tx) => {
                        let _ = tx.send(());
                    }
                    None => broker.restore_subscriptions(),
                }
            }
            Ok(Event::Incoming(Packet::SubAck(suback))) => {
                tracing::debug!(?suback, "MQTT subscription acknowledged");
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let message = InboundMessage::from(publish);
                tracing::debug!(
                    topic = %message.topic(),
                    payload = %message.payload(),
                    "MQTT message received"
                );
                if inbound_tx.send(message).await.is_err() {
                    tracing::warn!("Inbound message receiver dropped, stopping event loop");
                    break;
                }
            }
            Ok(Event::Incoming(Packet::Disconnect)) => {
                tracing::info!("MQTT broker disconnected");
                broker.inner.connected.store(false, Ordering::Release);
            }
            Ok(_) => {}
            Err(e) => {
                broker.inner.connected.store(false, Ordering::Release);
                if connack_tx.is_some() {
                    tracing::error!(error = %e, "MQTT connection failed");
                    break;
                }
                tracing::error!(error = %e, "MQTT broker event loop error, reconnecting");
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
}
