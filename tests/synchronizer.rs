// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end tests of command application and state publishing against a
//! mocked gateway.

use parking_lot::Mutex;
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zhonghong_bridge::error::{Error, ProtocolError};
use zhonghong_bridge::protocol::{GatewayConfig, HttpGateway, Publisher};
use zhonghong_bridge::types::{FanSpeed, UnitAddress};
use zhonghong_bridge::{ChannelLayout, MessageOutcome, Synchronizer, UnitCommand, handle_message};

/// Records every publish instead of sending it.
#[derive(Default)]
struct RecordingPublisher {
    published: Mutex<Vec<(String, String)>>,
}

impl Publisher for RecordingPublisher {
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), ProtocolError> {
        self.published
            .lock()
            .push((topic.to_string(), payload.to_string()));
        Ok(())
    }
}

fn gateway_for(server: &MockServer) -> HttpGateway {
    let address = server.address();
    GatewayConfig::new(address.ip().to_string())
        .with_port(address.port())
        .into_client()
        .unwrap()
}

fn synchronizer(
    server: &MockServer,
    layout: ChannelLayout,
) -> Synchronizer<HttpGateway, RecordingPublisher> {
    Synchronizer::new(gateway_for(server), RecordingPublisher::default(), layout)
}

fn published(sync: &Synchronizer<HttpGateway, RecordingPublisher>) -> Vec<(String, String)> {
    sync.publisher().published.lock().clone()
}

fn pair(topic: &str, payload: &str) -> (String, String) {
    (topic.to_string(), payload.to_string())
}

async fn mount_units(server: &MockServer, units: serde_json::Value) {
    Mock::given(method("GET"))
        .and(query_param("f", "17"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "err": 0, "unit": units })),
        )
        .mount(server)
        .await;
}

fn three_units() -> serde_json::Value {
    serde_json::json!([
        { "oa": 1, "ia": 0, "on": 0, "mode": 1, "tempSet": "26", "tempIn": "27", "fan": 1 },
        { "oa": 1, "ia": 1, "on": 0, "mode": 8, "tempSet": "22", "tempIn": "19", "fan": 2 },
        { "oa": 2, "ia": 0, "on": 1, "mode": 2, "tempSet": "24", "tempIn": "23", "fan": 4 }
    ])
}

// ============================================================================
// Applying Commands
// ============================================================================

mod apply_command {
    use super::*;

    #[tokio::test]
    async fn fan_change_preserves_other_fields() {
        let server = MockServer::start().await;
        mount_units(&server, three_units()).await;

        Mock::given(method("GET"))
            .and(query_param("f", "18"))
            .and(query_param("idx", "2"))
            .and(query_param("on", "1"))
            .and(query_param("mode", "2"))
            .and(query_param("tempSet", "24"))
            .and(query_param("fan", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "err": 0 })))
            .expect(1)
            .mount(&server)
            .await;

        let sync = synchronizer(&server, ChannelLayout::default());
        let command = UnitCommand::new(UnitAddress::new(2, 0)).with_fan(FanSpeed::High);

        sync.apply_command(&command).await.unwrap();
    }

    #[tokio::test]
    async fn fan_change_keeps_unrecognized_mode_code() {
        let server = MockServer::start().await;
        mount_units(
            &server,
            serde_json::json!([
                { "oa": 1, "ia": 1, "on": 1, "mode": 16, "tempSet": "25", "fan": 2 }
            ]),
        )
        .await;

        Mock::given(method("GET"))
            .and(query_param("f", "18"))
            .and(query_param("idx", "0"))
            .and(query_param("on", "1"))
            .and(query_param("mode", "16"))
            .and(query_param("tempSet", "25"))
            .and(query_param("fan", "4"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "err": 0 })))
            .expect(1)
            .mount(&server)
            .await;

        let sync = synchronizer(&server, ChannelLayout::default());
        let command = UnitCommand::new(UnitAddress::new(1, 1)).with_fan(FanSpeed::Low);

        sync.apply_command(&command).await.unwrap();
    }

    #[tokio::test]
    async fn unknown_unit_writes_nothing() {
        let server = MockServer::start().await;
        mount_units(&server, three_units()).await;

        Mock::given(method("GET"))
            .and(query_param("f", "18"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "err": 0 })))
            .expect(0)
            .mount(&server)
            .await;

        let sync = synchronizer(&server, ChannelLayout::default());
        let command = UnitCommand::new(UnitAddress::new(9, 9)).with_fan(FanSpeed::Low);

        let err = sync.apply_command(&command).await.unwrap_err();

        assert!(matches!(err, Error::UnitNotFound(address) if address == UnitAddress::new(9, 9)));
    }

    #[tokio::test]
    async fn failed_list_writes_nothing() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(query_param("f", "17"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "err": 3 })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("f", "18"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "err": 0 })))
            .expect(0)
            .mount(&server)
            .await;

        let sync = synchronizer(&server, ChannelLayout::default());
        let command = UnitCommand::new(UnitAddress::new(1, 0)).with_fan(FanSpeed::Low);

        assert!(matches!(
            sync.apply_command(&command).await,
            Err(Error::Gateway(_))
        ));
    }

    #[tokio::test]
    async fn folded_mode_message_powers_unit_on() {
        let server = MockServer::start().await;
        mount_units(&server, three_units()).await;

        Mock::given(method("GET"))
            .and(query_param("f", "18"))
            .and(query_param("idx", "1"))
            .and(query_param("on", "1"))
            .and(query_param("mode", "1"))
            .and(query_param("tempSet", "22"))
            .and(query_param("fan", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "err": 0 })))
            .expect(1)
            .mount(&server)
            .await;

        let sync = synchronizer(&server, ChannelLayout::folded_power());

        let outcome = handle_message(&sync, "zhonghong/1/1/mode/set", "cool")
            .await
            .unwrap();

        assert!(matches!(outcome, MessageOutcome::Applied(_)));
    }

    #[tokio::test]
    async fn temperature_message_passes_setpoint_through() {
        let server = MockServer::start().await;
        mount_units(&server, three_units()).await;

        Mock::given(method("GET"))
            .and(query_param("f", "18"))
            .and(query_param("idx", "0"))
            .and(query_param("on", "0"))
            .and(query_param("tempSet", "21.5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "err": 0 })))
            .expect(1)
            .mount(&server)
            .await;

        let sync = synchronizer(&server, ChannelLayout::default());

        handle_message(&sync, "zhonghong/1/0/temperature/set", "21.5")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn rejected_write_is_reported() {
        let server = MockServer::start().await;
        mount_units(&server, three_units()).await;

        Mock::given(method("GET"))
            .and(query_param("f", "18"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "err": 1 })))
            .mount(&server)
            .await;

        let sync = synchronizer(&server, ChannelLayout::default());

        let result = handle_message(&sync, "zhonghong/1/0/power/set", "on").await;

        assert!(matches!(result, Err(Error::Gateway(_))));
    }
}

// ============================================================================
// Publishing State
// ============================================================================

mod publish_all {
    use super::*;

    #[tokio::test]
    async fn publishes_every_channel_of_every_unit() {
        let server = MockServer::start().await;
        mount_units(&server, three_units()).await;

        let sync = synchronizer(&server, ChannelLayout::default());
        let report = sync.publish_all().await.unwrap();

        assert_eq!(report.units, 3);
        assert_eq!(report.attempted, 15);
        assert_eq!(report.failed, 0);

        let messages = published(&sync);
        assert_eq!(messages.len(), 15);
        assert_eq!(
            &messages[10..],
            &[
                pair("zhonghong/2/0/power/state", "on"),
                pair("zhonghong/2/0/mode/state", "dry"),
                pair("zhonghong/2/0/temperature/state", "24"),
                pair("zhonghong/2/0/current_temperature/state", "23"),
                pair("zhonghong/2/0/fan/state", "low"),
            ]
        );
    }

    #[tokio::test]
    async fn folded_layout_reports_off_as_mode() {
        let server = MockServer::start().await;
        mount_units(&server, three_units()).await;

        let sync = synchronizer(&server, ChannelLayout::folded_power());
        sync.publish_all().await.unwrap();

        let messages = published(&sync);
        assert_eq!(messages.len(), 12);
        assert!(messages.contains(&pair("zhonghong/1/1/mode/state", "off")));
        assert!(messages.contains(&pair("zhonghong/2/0/mode/state", "dry")));
        assert!(!messages.iter().any(|(topic, _)| topic.contains("/power/")));
    }

    #[tokio::test]
    async fn gateway_error_publishes_nothing() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "err": 1 })))
            .mount(&server)
            .await;

        let sync = synchronizer(&server, ChannelLayout::default());

        assert!(sync.publish_all().await.is_err());
        assert!(published(&sync).is_empty());
    }

    #[tokio::test]
    async fn empty_unit_list_publishes_nothing() {
        let server = MockServer::start().await;
        mount_units(&server, serde_json::json!([])).await;

        let sync = synchronizer(&server, ChannelLayout::default());
        let report = sync.publish_all().await.unwrap();

        assert_eq!(report.units, 0);
        assert!(published(&sync).is_empty());
    }
}
