// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MQTT topic vocabulary.
//!
//! Every unit exposes one topic pair per channel:
//!
//! ```text
//! zhonghong/<oa>/<ia>/<channel>/set    ← commands from MQTT
//! zhonghong/<oa>/<ia>/<channel>/state  → state published by the bridge
//! ```
//!
//! Which channels exist depends on the [`ChannelLayout`].

use std::fmt;

use serde::Deserialize;

/// First segment of every topic handled by the bridge.
pub const TOPIC_ROOT: &str = "zhonghong";

/// One observable or controllable attribute of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// On/off.
    Power,
    /// Operating mode (and power, in the folded layout).
    Mode,
    /// Temperature setpoint.
    Temperature,
    /// Fan speed.
    Fan,
    /// Measured room temperature. Read-only.
    CurrentTemperature,
}

impl Channel {
    /// Returns the topic segment for this channel.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Power => "power",
            Self::Mode => "mode",
            Self::Temperature => "temperature",
            Self::Fan => "fan",
            Self::CurrentTemperature => "current_temperature",
        }
    }

    /// Parses a topic segment.
    #[must_use]
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "power" => Some(Self::Power),
            "mode" => Some(Self::Mode),
            "temperature" => Some(Self::Temperature),
            "fan" => Some(Self::Fan),
            "current_temperature" => Some(Self::CurrentTemperature),
            _ => None,
        }
    }

    /// Extracts the channel from a full topic (its fourth segment).
    #[must_use]
    pub fn from_topic(topic: &str) -> Option<Self> {
        topic.split('/').nth(3).and_then(Self::from_segment)
    }

    /// Returns whether MQTT clients can write this channel.
    #[must_use]
    pub const fn is_settable(&self) -> bool {
        !matches!(self, Self::CurrentTemperature)
    }

    /// Returns the wildcard filter matching `set` messages for all units.
    #[must_use]
    pub fn subscription_filter(&self) -> String {
        format!("{TOPIC_ROOT}/+/+/{}/{}", self.as_str(), Direction::Set.as_str())
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last topic segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Inbound command.
    Set,
    /// Outbound state.
    State,
}

impl Direction {
    /// Returns the topic segment.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Set => "set",
            Self::State => "state",
        }
    }
}

/// Selects which of the two deployed channel layouts the bridge speaks.
///
/// With `power_channel` disabled, power is folded into the mode channel:
/// `mode/state` reads `"off"` while the unit is off and `mode/set` accepts
/// `"off"` to switch it off.
///
/// # Examples
///
/// ```
/// use zhonghong_bridge::topic::{Channel, ChannelLayout};
///
/// let legacy = ChannelLayout::folded_power();
/// assert_eq!(
///     legacy.channels(),
///     vec![Channel::Mode, Channel::Temperature, Channel::CurrentTemperature, Channel::Fan]
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChannelLayout {
    /// Expose power as its own channel.
    pub power_channel: bool,
    /// Publish the measured room temperature.
    pub current_temperature: bool,
}

impl Default for ChannelLayout {
    fn default() -> Self {
        Self {
            power_channel: true,
            current_temperature: true,
        }
    }
}

impl ChannelLayout {
    /// Legacy layout: power folded into mode, current temperature published.
    #[must_use]
    pub const fn folded_power() -> Self {
        Self {
            power_channel: false,
            current_temperature: true,
        }
    }

    /// Returns the channels published for every unit, in publish order.
    #[must_use]
    pub fn channels(&self) -> Vec<Channel> {
        let mut channels = Vec::with_capacity(5);
        if self.power_channel {
            channels.push(Channel::Power);
        }
        channels.push(Channel::Mode);
        channels.push(Channel::Temperature);
        if self.current_temperature {
            channels.push(Channel::CurrentTemperature);
        }
        channels.push(Channel::Fan);
        channels
    }

    /// Returns the channels the bridge accepts commands on.
    #[must_use]
    pub fn settable_channels(&self) -> Vec<Channel> {
        self.channels()
            .into_iter()
            .filter(Channel::is_settable)
            .collect()
    }

    /// Returns the wildcard filters to subscribe to.
    #[must_use]
    pub fn subscription_filters(&self) -> Vec<String> {
        self.settable_channels()
            .iter()
            .map(Channel::subscription_filter)
            .collect()
    }
}
