// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bridge configuration.
//!
//! Settings come from an optional TOML file, then `ZHONGHONG_*` environment
//! variables override individual values. Gateway and broker hosts are
//! required once both sources are merged.
//!
//! # Examples
//!
//! ```
//! use zhonghong_bridge::config::Config;
//!
//! let config: Config = toml::from_str(r#"
//!     [gateway]
//!     host = "192.168.1.10"
//!     username = "admin"
//!     password = "admin"
//!
//!     [mqtt]
//!     host = "192.168.1.2"
//!
//!     [bridge]
//!     power_channel = false
//! "#).unwrap();
//!
//! config.validate().unwrap();
//! assert_eq!(config.gateway.port, 80);
//! assert_eq!(config.mqtt.port, 1883);
//! assert!(!config.bridge.power_channel);
//! ```

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::protocol::{GatewayConfig, MqttBrokerBuilder};
use crate::topic::ChannelLayout;

/// Resolved configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Gateway connection.
    pub gateway: GatewaySettings,
    /// Broker connection.
    pub mqtt: MqttSettings,
    /// Channel layout spoken on MQTT.
    pub bridge: ChannelLayout,
}

/// Gateway connection settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewaySettings {
    /// Hostname or IP address.
    pub host: String,
    /// HTTP port.
    pub port: u16,
    /// Basic auth username.
    pub username: Option<String>,
    /// Basic auth password.
    pub password: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: GatewayConfig::DEFAULT_PORT,
            username: None,
            password: None,
            timeout_secs: GatewayConfig::DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

/// Broker connection settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MqttSettings {
    /// Hostname or IP address.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Username.
    pub username: Option<String>,
    /// Password.
    pub password: Option<String>,
    /// Client identifier; generated per process when absent.
    pub client_id: Option<String>,
}

impl Default for MqttSettings {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 1883,
            username: None,
            password: None,
            client_id: None,
        }
    }
}

impl Config {
    /// Default configuration file location.
    pub const DEFAULT_PATH: &'static str = "/config.toml";

    /// Loads the file (if given or present at the default path), applies
    /// environment overrides and validates the result.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or parsed, an
    /// override is malformed, or a required value is missing.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(Self::DEFAULT_PATH).exists() => {
                Self::from_file(Path::new(Self::DEFAULT_PATH))?
            }
            None => {
                tracing::info!("No configuration file, using environment only");
                Self::default()
            }
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        tracing::info!(path = %path.display(), "Loading configuration");

        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Ok(toml::from_str(&text)?)
    }

    /// Applies overrides looked up by environment variable name.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidOverride` if a numeric or boolean value
    /// does not parse.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("ZHONGHONG_GATEWAY_HOST") {
            self.gateway.host = v;
        }
        if let Some(v) = parsed(&lookup, "ZHONGHONG_GATEWAY_PORT")? {
            self.gateway.port = v;
        }
        if let Some(v) = lookup("ZHONGHONG_GATEWAY_USERNAME") {
            self.gateway.username = Some(v);
        }
        if let Some(v) = lookup("ZHONGHONG_GATEWAY_PASSWORD") {
            self.gateway.password = Some(v);
        }
        if let Some(v) = lookup("ZHONGHONG_MQTT_HOST") {
            self.mqtt.host = v;
        }
        if let Some(v) = parsed(&lookup, "ZHONGHONG_MQTT_PORT")? {
            self.mqtt.port = v;
        }
        if let Some(v) = lookup("ZHONGHONG_MQTT_USERNAME") {
            self.mqtt.username = Some(v);
        }
        if let Some(v) = lookup("ZHONGHONG_MQTT_PASSWORD") {
            self.mqtt.password = Some(v);
        }
        if let Some(v) = lookup("ZHONGHONG_MQTT_CLIENT_ID") {
            self.mqtt.client_id = Some(v);
        }
        if let Some(v) = parsed(&lookup, "ZHONGHONG_POWER_CHANNEL")? {
            self.bridge.power_channel = v;
        }
        if let Some(v) = parsed(&lookup, "ZHONGHONG_CURRENT_TEMPERATURE")? {
            self.bridge.current_temperature = v;
        }
        Ok(())
    }

    /// Checks that required values are present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` naming the first absent value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gateway.host.is_empty() {
            return Err(ConfigError::Missing("gateway.host"));
        }
        if self.mqtt.host.is_empty() {
            return Err(ConfigError::Missing("mqtt.host"));
        }
        Ok(())
    }

    /// Builds the gateway client configuration.
    #[must_use]
    pub fn gateway_config(&self) -> GatewayConfig {
        let config = GatewayConfig::new(&self.gateway.host)
            .with_port(self.gateway.port)
            .with_timeout(Duration::from_secs(self.gateway.timeout_secs));

        match &self.gateway.username {
            Some(username) => config.with_credentials(
                username,
                self.gateway.password.clone().unwrap_or_default(),
            ),
            None => config,
        }
    }

    /// Builds the broker connection builder.
    #[must_use]
    pub fn mqtt_builder(&self) -> MqttBrokerBuilder {
        let mut builder = MqttBrokerBuilder::default()
            .host(&self.mqtt.host)
            .port(self.mqtt.port);

        if let Some(username) = &self.mqtt.username {
            builder = builder.credentials(username, self.mqtt.password.clone().unwrap_or_default());
        }
        if let Some(client_id) = &self.mqtt.client_id {
            builder = builder.client_id(client_id);
        }
        builder
    }
}

/// Looks up and parses one override.
fn parsed<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidOverride { key, value })
        })
        .transpose()
}
