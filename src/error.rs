// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the bridge.
//!
//! Only [`ConfigError`] is fatal; the runtime treats every other variant as
//! an isolated failure of one poll tick or one inbound message.

use thiserror::Error;

use crate::types::UnitAddress;

/// The main error type for this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be resolved.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// The gateway or the broker could not be reached.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// A gateway operation failed in transport, status or payload.
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// A command addressed a unit that is absent from the current unit list.
    #[error("unit {0} not found in gateway unit list")]
    UnitNotFound(UnitAddress),
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// Path of the file.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for this schema.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A required value is missing after file and environment are merged.
    #[error("missing required setting: {0}")]
    Missing(&'static str),

    /// An environment override could not be parsed.
    #[error("invalid value for {key}: {value}")]
    InvalidOverride {
        /// Environment variable name.
        key: &'static str,
        /// The rejected value.
        value: String,
    },
}

/// Transport-level failures talking to the gateway or the MQTT broker.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// MQTT client request failed.
    #[error("MQTT error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    /// Connection could not be established or was refused.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The gateway rejected the credentials.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Invalid host or port.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Internal channel was closed.
    #[error("channel closed: {0}")]
    ChannelClosed(String),
}

/// Failures of a gateway operation.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request for an operation did not complete.
    #[error("{function} request failed: {source}")]
    Request {
        /// The operation that failed.
        function: &'static str,
        /// Underlying transport error.
        #[source]
        source: ProtocolError,
    },

    /// The gateway returned a non-zero `err` field.
    #[error("{function} returned status {code}")]
    Status {
        /// The operation that failed.
        function: &'static str,
        /// The `err` value reported by the gateway.
        code: i64,
    },

    /// The response body did not match the expected shape.
    #[error("{function} response could not be parsed: {source}")]
    Parse {
        /// The operation that failed.
        function: &'static str,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
