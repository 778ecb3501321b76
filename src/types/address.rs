// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Unit addressing.

use std::fmt;

use serde::Deserialize;

use crate::topic::{Channel, Direction, TOPIC_ROOT};

/// Identifies one indoor unit behind the gateway.
///
/// Units are addressed by the outdoor unit they hang off and their own
/// indoor index. The same pair appears as `oa`/`ia` in gateway JSON and as
/// the second and third segments of MQTT topics.
///
/// # Examples
///
/// ```
/// use zhonghong_bridge::types::UnitAddress;
/// use zhonghong_bridge::topic::{Channel, Direction};
///
/// let addr = UnitAddress::from_topic("zhonghong/3/7/mode/set");
/// assert_eq!(addr, UnitAddress::new(3, 7));
/// assert_eq!(
///     addr.topic(Channel::Fan, Direction::State),
///     "zhonghong/3/7/fan/state"
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
pub struct UnitAddress {
    /// Outdoor unit id.
    #[serde(rename = "oa")]
    pub outdoor: i64,
    /// Indoor unit id.
    #[serde(rename = "ia")]
    pub indoor: i64,
}

impl UnitAddress {
    /// Creates an address from its two ids.
    #[must_use]
    pub const fn new(outdoor: i64, indoor: i64) -> Self {
        Self { outdoor, indoor }
    }

    /// Derives an address from an MQTT topic.
    ///
    /// Missing or non-numeric segments become `0` rather than an error.
    #[must_use]
    pub fn from_topic(topic: &str) -> Self {
        let mut segments = topic.split('/').skip(1);
        let mut next_id = || {
            segments
                .next()
                .and_then(|s| s.parse::<i64>().ok())
                .unwrap_or_default()
        };
        let outdoor = next_id();
        let indoor = next_id();
        Self { outdoor, indoor }
    }

    /// Returns the channel base topic, `zhonghong/{oa}/{ia}/{channel}`.
    #[must_use]
    pub fn channel_topic(&self, channel: Channel) -> String {
        format!(
            "{TOPIC_ROOT}/{}/{}/{}",
            self.outdoor,
            self.indoor,
            channel.as_str()
        )
    }

    /// Returns the full topic for a channel and direction.
    #[must_use]
    pub fn topic(&self, channel: Channel, direction: Direction) -> String {
        format!("{}/{}", self.channel_topic(channel), direction.as_str())
    }
}

impl fmt::Display for UnitAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.outdoor, self.indoor)
    }
}
