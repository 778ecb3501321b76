// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Full state of one unit as reported by the gateway.

use serde::Deserialize;

use crate::topic::{Channel, ChannelLayout};
use crate::types::{FanSpeed, Mode, PowerState, UnitAddress};

/// The gateway's view of one unit.
///
/// Enum fields are always concrete; unknown gateway codes are normalized
/// through the codec fallbacks when the record is decoded. The codes as
/// reported are kept in [`UnitState::codes`] and are what a write echoes
/// for fields a command leaves untouched.
///
/// # Examples
///
/// ```
/// use zhonghong_bridge::state::UnitState;
/// use zhonghong_bridge::types::{FanSpeed, Mode, PowerState};
///
/// let json = r#"{"oa":1,"ia":2,"on":1,"mode":8,"tempSet":"26","tempIn":"21.5","fan":2}"#;
/// let unit: UnitState = serde_json::from_str(json).unwrap();
///
/// assert_eq!(unit.power, PowerState::On);
/// assert_eq!(unit.mode, Mode::Heat);
/// assert_eq!(unit.fan, FanSpeed::Medium);
/// assert_eq!(unit.temp_in.as_deref(), Some("21.5"));
/// assert_eq!(unit.codes.mode, 8);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "GatewayUnit")]
pub struct UnitState {
    /// Unit address.
    pub address: UnitAddress,
    /// Power state.
    pub power: PowerState,
    /// Operating mode.
    pub mode: Mode,
    /// Setpoint, passed through untouched.
    pub temp_set: String,
    /// Measured temperature, when the gateway reports it.
    pub temp_in: Option<String>,
    /// Fan speed.
    pub fan: FanSpeed,
    /// Raw gateway codes behind `power`, `mode` and `fan`.
    pub codes: GatewayCodes,
}

/// Gateway codes of a unit's enum fields, unmodified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GatewayCodes {
    /// `on` field.
    pub on: i64,
    /// `mode` field.
    pub mode: i64,
    /// `fan` field.
    pub fan: i64,
}

impl GatewayCodes {
    /// Codes of known values.
    #[must_use]
    pub const fn new(power: PowerState, mode: Mode, fan: FanSpeed) -> Self {
        Self {
            on: power.code(),
            mode: mode.code(),
            fan: fan.code(),
        }
    }
}

impl UnitState {
    /// Returns the `state` payload for a channel under the given layout.
    ///
    /// In the folded layout the mode channel reads `"off"` whenever the unit
    /// is off, regardless of its stored mode.
    #[must_use]
    pub fn channel_payload(&self, channel: Channel, layout: ChannelLayout) -> String {
        match channel {
            Channel::Power => self.power.as_payload().to_string(),
            Channel::Mode if !layout.power_channel && self.power == PowerState::Off => {
                "off".to_string()
            }
            Channel::Mode => self.mode.as_payload().to_string(),
            Channel::Temperature => self.temp_set.clone(),
            Channel::CurrentTemperature => self.temp_in.clone().unwrap_or_default(),
            Channel::Fan => self.fan.as_payload().to_string(),
        }
    }

    /// Returns the unit-state parameters of a gateway write request.
    ///
    /// Enum fields are sent as their raw codes.
    #[must_use]
    pub fn write_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("on", self.codes.on.to_string()),
            ("mode", self.codes.mode.to_string()),
            ("tempSet", self.temp_set.clone()),
            ("fan", self.codes.fan.to_string()),
        ]
    }
}

/// Wire shape of a unit record in the gateway's list response.
#[derive(Debug, Deserialize)]
struct GatewayUnit {
    #[serde(flatten)]
    address: UnitAddress,
    on: i64,
    mode: i64,
    #[serde(rename = "tempSet")]
    temp_set: String,
    #[serde(rename = "tempIn", default)]
    temp_in: Option<String>,
    fan: i64,
}

impl From<GatewayUnit> for UnitState {
    fn from(raw: GatewayUnit) -> Self {
        Self {
            address: raw.address,
            power: PowerState::from_code(raw.on),
            mode: Mode::from_code(raw.mode),
            temp_set: raw.temp_set,
            temp_in: raw.temp_in,
            fan: FanSpeed::from_code(raw.fan),
            codes: GatewayCodes {
                on: raw.on,
                mode: raw.mode,
                fan: raw.fan,
            },
        }
    }
}
