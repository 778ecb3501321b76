// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Transports on both sides of the bridge.
//!
//! # Protocols
//!
//! - [`HttpGateway`]: request/response client for the gateway's HTTP API
//! - [`MqttBroker`]: persistent broker connection that publishes state and
//!   delivers inbound `set` messages
//!
//! The synchronizer only sees the [`Gateway`] and [`Publisher`] traits, and
//! the command handler additionally needs [`Acknowledger`], so either side
//! can be replaced by a fake in tests.

mod http;
mod mqtt_broker;

use std::future::Future;

pub use http::{GatewayConfig, HttpGateway};
pub use mqtt_broker::{InboundMessage, MqttBroker, MqttBrokerBuilder, MqttBrokerConfig};

use crate::error::{ProtocolError, Result};
use crate::state::UnitState;

/// Request/response access to the gateway.
///
/// Each call is an independent exchange; implementations hold no state
/// beyond their connection and may be shared freely between tasks.
pub trait Gateway: Send + Sync {
    /// Fetches the full state of every unit, in gateway order.
    ///
    /// # Errors
    ///
    /// Returns `Error::Gateway` naming the operation if the gateway cannot
    /// be reached, reports a failure, or sends an unreadable payload.
    fn list_units(&self) -> impl Future<Output = Result<Vec<UnitState>>> + Send;

    /// Writes state for the unit at `index` in the most recent list.
    ///
    /// # Arguments
    ///
    /// * `index` - Position of the unit in a list returned by [`Gateway::list_units`]
    /// * `fields` - Gateway parameters to send alongside the index
    ///
    /// # Errors
    ///
    /// Same as [`Gateway::list_units`].
    fn write_unit(
        &self,
        index: usize,
        fields: Vec<(&'static str, String)>,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Publishes state messages to MQTT.
pub trait Publisher: Send + Sync {
    /// Publishes `payload` on `topic` with QoS 1, not retained.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the message cannot be handed to the broker.
    fn publish(
        &self,
        topic: &str,
        payload: &str,
    ) -> impl Future<Output = std::result::Result<(), ProtocolError>> + Send;
}

/// Acknowledges inbound messages once they have been handled.
pub trait Acknowledger: Send + Sync {
    /// Acknowledges `message` to the broker.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the acknowledgement cannot be queued.
    fn ack(
        &self,
        message: &InboundMessage,
    ) -> impl Future<Output = std::result::Result<(), ProtocolError>> + Send;
}
