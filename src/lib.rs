// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Zhonghong Bridge - exposes Zhonghong HVAC gateway units over MQTT.
//!
//! The bridge polls the gateway's HTTP API for the state of every indoor
//! unit, publishes each field to its own MQTT topic, and turns `set`
//! messages back into gateway writes.
//!
//! # Topics
//!
//! Every unit lives under `zhonghong/{outdoor}/{indoor}/`:
//!
//! | Channel               | `set` payload                      | `state` payload |
//! |-----------------------|------------------------------------|-----------------|
//! | `power`               | `on` / `off`                       | `on` / `off`    |
//! | `mode`                | `cool` / `dry` / `fan_only` / `heat` | same          |
//! | `temperature`         | setpoint as text                   | setpoint        |
//! | `fan`                 | `high` / `medium` / `low`          | same            |
//! | `current_temperature` | read-only                          | room temperature|
//!
//! With [`ChannelLayout::folded_power`] the `power` channel disappears and
//! `mode` also accepts and reports `off`.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use zhonghong_bridge::{GatewayConfig, MqttBroker, PollLoop, Synchronizer, ChannelLayout};
//!
//! #[tokio::main]
//! async fn main() -> zhonghong_bridge::Result<()> {
//!     let gateway = GatewayConfig::new("192.168.1.10")
//!         .with_credentials("admin", "admin")
//!         .into_client()?;
//!
//!     let (broker, inbound) = MqttBroker::builder()
//!         .host("192.168.1.2")
//!         .build()
//!         .await?;
//!
//!     let layout = ChannelLayout::default();
//!     broker.subscribe(&layout.subscription_filters()).await?;
//!
//!     let synchronizer = Arc::new(Synchronizer::new(gateway, broker, layout));
//!     tokio::spawn(zhonghong_bridge::serve_commands(Arc::clone(&synchronizer), inbound));
//!     PollLoop::new(synchronizer).run().await;
//!     Ok(())
//! }
//! ```

pub mod bridge;
pub mod config;
pub mod error;
pub mod poll;
pub mod protocol;
pub mod state;
pub mod sync;
pub mod topic;
pub mod types;

pub use bridge::{MessageOutcome, handle_message, serve_commands};
pub use config::Config;
pub use error::{ConfigError, Error, GatewayError, ProtocolError, Result};
pub use poll::{POLL_INTERVAL, PollLoop, PollState};
pub use protocol::{
    Acknowledger, Gateway, GatewayConfig, HttpGateway, InboundMessage, MqttBroker,
    MqttBrokerBuilder, MqttBrokerConfig, Publisher,
};
pub use state::{GatewayCodes, UnitCommand, UnitState};
pub use sync::{PublishReport, Synchronizer};
pub use topic::{Channel, ChannelLayout, Direction, TOPIC_ROOT};
pub use types::{FanSpeed, Mode, PowerState, UnitAddress};
