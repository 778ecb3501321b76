// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Gateway/MQTT state synchronization.
//!
//! The [`Synchronizer`] is the hub between the two protocols. It keeps no
//! state of its own: every command and every publish pass starts from a
//! freshly fetched unit list.
//!
//! # Architecture
//!
//! ```text
//! zhonghong/1/2/fan/set → low
//!             ↓
//!     UnitCommand { fan: Low }
//!             ↓
//!     apply_command()
//!       list_units() → [u0, u1, u2 = 1/2]
//!       merge(command, u2)
//!       write_unit(2, {on, mode, tempSet, fan})
//!
//! poll tick
//!             ↓
//!     publish_all()
//!       list_units() → [u0, u1, ...]
//!       zhonghong/<oa>/<ia>/<channel>/state for every unit and channel
//! ```

use crate::error::{Error, Result};
use crate::protocol::{Gateway, Publisher};
use crate::state::UnitCommand;
use crate::topic::{ChannelLayout, Direction};

/// Outcome of one [`Synchronizer::publish_all`] pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PublishReport {
    /// Units in the fetched list.
    pub units: usize,
    /// Publish calls issued.
    pub attempted: usize,
    /// Publish calls that failed.
    pub failed: usize,
}

/// Keeps MQTT topics and gateway state in step.
///
/// # Examples
///
/// ```no_run
/// use zhonghong_bridge::protocol::{GatewayConfig, MqttBroker};
/// use zhonghong_bridge::state::UnitCommand;
/// use zhonghong_bridge::sync::Synchronizer;
/// use zhonghong_bridge::topic::ChannelLayout;
/// use zhonghong_bridge::types::{FanSpeed, UnitAddress};
///
/// # async fn example() -> zhonghong_bridge::Result<()> {
/// let gateway = GatewayConfig::new("192.168.1.10").into_client()?;
/// let (broker, _inbound) = MqttBroker::builder().host("192.168.1.2").build().await?;
/// let sync = Synchronizer::new(gateway, broker, ChannelLayout::default());
///
/// let command = UnitCommand::new(UnitAddress::new(1, 2)).with_fan(FanSpeed::Low);
/// sync.apply_command(&command).await?;
/// sync.publish_all().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Synchronizer<G, P> {
    gateway: G,
    publisher: P,
    layout: ChannelLayout,
}

impl<G: Gateway, P: Publisher> Synchronizer<G, P> {
    /// Creates a synchronizer over the given gateway and publisher.
    #[must_use]
    pub fn new(gateway: G, publisher: P, layout: ChannelLayout) -> Self {
        Self {
            gateway,
            publisher,
            layout,
        }
    }

    /// Returns the channel layout.
    #[must_use]
    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    /// Returns the gateway.
    #[must_use]
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Returns the publisher.
    #[must_use]
    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    /// Applies a partial command to its unit.
    ///
    /// The unit is located in a freshly fetched list, unset fields are
    /// filled from that unit's reported state, and the full state is written
    /// back under the unit's position in the same list.
    ///
    /// The gateway only identifies units by list position. If its ordering
    /// changes between the list call and the write call, the write lands on
    /// whichever unit now holds that position. The gateway offers nothing to
    /// close this window.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnitNotFound` if the address is not in the list (no
    /// write is issued), and any error from the list or write call.
    pub async fn apply_command(&self, command: &UnitCommand) -> Result<()> {
        let units = self.gateway.list_units().await?;

        let index = units
            .iter()
            .position(|unit| unit.address == command.address)
            .ok_or(Error::UnitNotFound(command.address))?;

        let merged = command.merge(&units[index]);

        tracing::info!(
            unit = %command.address,
            index,
            power = %merged.power,
            mode = %merged.mode,
            temp_set = %merged.temp_set,
            fan = %merged.fan,
            "Writing unit state"
        );

        self.gateway.write_unit(index, merged.write_params()).await
    }

    /// Publishes every channel of every unit.
    ///
    /// Nothing is published if the unit list cannot be fetched. Once it has
    /// been fetched, each publish is attempted regardless of earlier
    /// failures; failures are logged and counted in the report.
    ///
    /// # Errors
    ///
    /// Returns the error from the unit list call.
    pub async fn publish_all(&self) -> Result<PublishReport> {
        let units = self.gateway.list_units().await?;
        let channels = self.layout.channels();

        let mut report = PublishReport {
            units: units.len(),
            ..PublishReport::default()
        };

        for unit in &units {
            tracing::trace!(unit = %unit.address, "Publishing unit state");

            for &channel in &channels {
                let topic = unit.address.topic(channel, Direction::State);
                let payload = unit.channel_payload(channel, self.layout);

                report.attempted += 1;
                if let Err(e) = self.publisher.publish(&topic, &payload).await {
                    report.failed += 1;
                    tracing::warn!(
                        unit = %unit.address,
                        topic = %topic,
                        payload = %payload,
                        error = %e,
                        "Failed to publish channel state"
                    );
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;

    use super::*;
    use crate::error::{GatewayError, ProtocolError};
    use crate::state::{GatewayCodes, UnitState};
    use crate::types::{FanSpeed, Mode, PowerState, UnitAddress};

    type Write = (usize, Vec<(&'static str, String)>);

    #[derive(Default)]
    struct FakeGateway {
        units: Vec<UnitState>,
        status: i64,
        lists: AtomicUsize,
        writes: Mutex<Vec<Write>>,
    }

    impl FakeGateway {
        fn with_units(units: Vec<UnitState>) -> Self {
            Self {
                units,
                ..Self::default()
            }
        }

        fn failing(status: i64) -> Self {
            Self {
                status,
                ..Self::default()
            }
        }
    }

    impl Gateway for FakeGateway {
        async fn list_units(&self) -> Result<Vec<UnitState>> {
            self.lists.fetch_add(1, Ordering::SeqCst);
            if self.status != 0 {
                return Err(GatewayError::Status {
                    function: "list units",
                    code: self.status,
                }
                .into());
            }
            Ok(self.units.clone())
        }

        async fn write_unit(
            &self,
            index: usize,
            fields: Vec<(&'static str, String)>,
        ) -> Result<()> {
            self.writes.lock().push((index, fields));
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingPublisher {
        fail_topics: Vec<String>,
        published: Mutex<Vec<(String, String)>>,
    }

    impl Publisher for RecordingPublisher {
        async fn publish(
            &self,
            topic: &str,
            payload: &str,
        ) -> std::result::Result<(), ProtocolError> {
            self.published
                .lock()
                .push((topic.to_string(), payload.to_string()));
            if self.fail_topics.iter().any(|t| t == topic) {
                return Err(ProtocolError::ConnectionFailed("broker gone".to_string()));
            }
            Ok(())
        }
    }

    fn unit(outdoor: i64, indoor: i64) -> UnitState {
        UnitState {
            address: UnitAddress::new(outdoor, indoor),
            power: PowerState::On,
            mode: Mode::Dry,
            temp_set: "24".to_string(),
            temp_in: Some("26".to_string()),
            fan: FanSpeed::Low,
            codes: GatewayCodes::new(PowerState::On, Mode::Dry, FanSpeed::Low),
        }
    }

    fn entry(topic: &str, payload: &str) -> (String, String) {
        (topic.to_string(), payload.to_string())
    }

    fn sync(
        gateway: FakeGateway,
        publisher: RecordingPublisher,
    ) -> Synchronizer<FakeGateway, RecordingPublisher> {
        Synchronizer::new(gateway, publisher, ChannelLayout::default())
    }

    #[tokio::test]
    async fn apply_command_merges_and_writes_by_index() {
        let gateway = FakeGateway::with_units(vec![unit(1, 1), unit(1, 2), unit(1, 3)]);
        let sync = sync(gateway, RecordingPublisher::default());

        let command = UnitCommand::new(UnitAddress::new(1, 3)).with_fan(FanSpeed::High);
        sync.apply_command(&command).await.unwrap();

        let writes = sync.gateway().writes.lock();
        assert_eq!(writes.len(), 1);
        let (index, fields) = &writes[0];
        assert_eq!(*index, 2);
        assert_eq!(
            fields,
            &vec![
                ("on", "1".to_string()),
                ("mode", "2".to_string()),
                ("tempSet", "24".to_string()),
                ("fan", "1".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn apply_command_unknown_unit_issues_no_write() {
        let gateway = FakeGateway::with_units(vec![unit(1, 1)]);
        let sync = sync(gateway, RecordingPublisher::default());

        let command = UnitCommand::new(UnitAddress::new(9, 9)).with_mode(Mode::Heat);
        let result = sync.apply_command(&command).await;

        assert!(matches!(result, Err(Error::UnitNotFound(addr)) if addr == UnitAddress::new(9, 9)));
        assert!(sync.gateway().writes.lock().is_empty());
    }

    #[tokio::test]
    async fn apply_command_list_failure_issues_no_write() {
        let sync = sync(FakeGateway::failing(1), RecordingPublisher::default());

        let command = UnitCommand::new(UnitAddress::new(1, 1)).with_power(PowerState::Off);
        let result = sync.apply_command(&command).await;

        assert!(matches!(result, Err(Error::Gateway(GatewayError::Status { code: 1, .. }))));
        assert!(sync.gateway().writes.lock().is_empty());
    }

    #[tokio::test]
    async fn apply_command_fetches_fresh_list_every_time() {
        let gateway = FakeGateway::with_units(vec![unit(1, 1)]);
        let sync = sync(gateway, RecordingPublisher::default());
        let command = UnitCommand::new(UnitAddress::new(1, 1)).with_fan(FanSpeed::Medium);

        sync.apply_command(&command).await.unwrap();
        sync.apply_command(&command).await.unwrap();

        assert_eq!(sync.gateway().lists.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn publish_all_publishes_every_channel() {
        let gateway = FakeGateway::with_units(vec![unit(1, 1), unit(2, 5)]);
        let sync = sync(gateway, RecordingPublisher::default());

        let report = sync.publish_all().await.unwrap();

        assert_eq!(
            report,
            PublishReport {
                units: 2,
                attempted: 10,
                failed: 0
            }
        );
        let published = sync.publisher().published.lock();
        assert_eq!(published[0], entry("zhonghong/1/1/power/state", "on"));
        assert_eq!(published[1], entry("zhonghong/1/1/mode/state", "dry"));
        assert_eq!(published[2], entry("zhonghong/1/1/temperature/state", "24"));
        assert_eq!(
            published[3],
            entry("zhonghong/1/1/current_temperature/state", "26")
        );
        assert_eq!(published[4], entry("zhonghong/1/1/fan/state", "low"));
        assert_eq!(published[5].0, "zhonghong/2/5/power/state");
    }

    #[tokio::test]
    async fn publish_all_isolates_failures() {
        let gateway = FakeGateway::with_units(vec![unit(1, 1), unit(1, 2)]);
        let publisher = RecordingPublisher {
            fail_topics: vec!["zhonghong/1/1/mode/state".to_string()],
            ..RecordingPublisher::default()
        };
        let sync = sync(gateway, publisher);

        let report = sync.publish_all().await.unwrap();

        assert_eq!(report.attempted, 10);
        assert_eq!(report.failed, 1);
        let published = sync.publisher().published.lock();
        assert!(published.iter().any(|(t, _)| t == "zhonghong/1/1/temperature/state"));
        assert!(published.iter().any(|(t, _)| t == "zhonghong/1/2/mode/state"));
    }

    #[tokio::test]
    async fn publish_all_list_failure_publishes_nothing() {
        let sync = sync(FakeGateway::failing(5), RecordingPublisher::default());

        let result = sync.publish_all().await;

        assert!(matches!(result, Err(Error::Gateway(GatewayError::Status { code: 5, .. }))));
        assert!(sync.publisher().published.lock().is_empty());
    }

    #[tokio::test]
    async fn publish_all_folded_layout() {
        let mut off = unit(1, 1);
        off.power = PowerState::Off;
        let gateway = FakeGateway::with_units(vec![off]);
        let sync = Synchronizer::new(
            gateway,
            RecordingPublisher::default(),
            ChannelLayout::folded_power(),
        );

        let report = sync.publish_all().await.unwrap();

        assert_eq!(report.attempted, 4);
        let published = sync.publisher().published.lock();
        assert_eq!(published[0], entry("zhonghong/1/1/mode/state", "off"));
        assert!(!published.iter().any(|(t, _)| t.contains("/power/")));
    }

    #[tokio::test]
    async fn publish_all_empty_list() {
        let sync = sync(FakeGateway::default(), RecordingPublisher::default());
        let report = sync.publish_all().await.unwrap();
        assert_eq!(report, PublishReport::default());
    }
}
