// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Partial updates requested over MQTT.
//!
//! A [`UnitCommand`] names a unit and the fields to change. Before it reaches
//! the gateway it is merged with the unit's freshly fetched [`UnitState`]:
//! set fields win, unset fields are copied from the fetched state. A command
//! never clears or guesses a field.
//!
//! # Examples
//!
//! ```
//! use zhonghong_bridge::state::UnitCommand;
//! use zhonghong_bridge::topic::ChannelLayout;
//! use zhonghong_bridge::types::{FanSpeed, UnitAddress};
//!
//! let cmd = UnitCommand::from_message("zhonghong/1/2/fan/set", "low", ChannelLayout::default())
//!     .unwrap();
//!
//! assert_eq!(cmd.address, UnitAddress::new(1, 2));
//! assert_eq!(cmd.fan, Some(FanSpeed::Low));
//! assert!(cmd.mode.is_none());
//! ```

use super::{GatewayCodes, UnitState};
use crate::topic::{Channel, ChannelLayout};
use crate::types::{FanSpeed, Mode, PowerState, UnitAddress};

/// A partial update for one unit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UnitCommand {
    /// Target unit.
    pub address: UnitAddress,
    /// New power state.
    pub power: Option<PowerState>,
    /// New mode.
    pub mode: Option<Mode>,
    /// New setpoint.
    pub temp_set: Option<String>,
    /// New fan speed.
    pub fan: Option<FanSpeed>,
}

impl UnitCommand {
    /// Creates an empty command for a unit.
    #[must_use]
    pub fn new(address: UnitAddress) -> Self {
        Self {
            address,
            ..Self::default()
        }
    }

    /// Sets the power state.
    #[must_use]
    pub fn with_power(mut self, power: PowerState) -> Self {
        self.power = Some(power);
        self
    }

    /// Sets the mode.
    #[must_use]
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Sets the temperature setpoint.
    #[must_use]
    pub fn with_temp_set(mut self, temp_set: impl Into<String>) -> Self {
        self.temp_set = Some(temp_set.into());
        self
    }

    /// Sets the fan speed.
    #[must_use]
    pub fn with_fan(mut self, fan: FanSpeed) -> Self {
        self.fan = Some(fan);
        self
    }

    /// Returns `true` if no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.power.is_none() && self.mode.is_none() && self.temp_set.is_none() && self.fan.is_none()
    }

    /// Translates an inbound `set` message into a command.
    ///
    /// Returns `None` when the topic does not name a channel the layout
    /// accepts commands on. Payloads are decoded permissively; an empty
    /// temperature payload leaves the setpoint unset.
    ///
    /// In the folded layout, `mode/set` with `"off"` switches the unit off
    /// and any other payload switches it on in the decoded mode.
    #[must_use]
    pub fn from_message(topic: &str, payload: &str, layout: ChannelLayout) -> Option<Self> {
        let channel = Channel::from_topic(topic)?;
        let command = Self::new(UnitAddress::from_topic(topic));

        let command = match channel {
            Channel::Power if layout.power_channel => {
                command.with_power(PowerState::from_payload(payload))
            }
            Channel::Mode if !layout.power_channel => {
                if payload == "off" {
                    command.with_power(PowerState::Off)
                } else {
                    command
                        .with_power(PowerState::On)
                        .with_mode(Mode::from_payload(payload))
                }
            }
            Channel::Mode => command.with_mode(Mode::from_payload(payload)),
            Channel::Temperature if payload.is_empty() => command,
            Channel::Temperature => command.with_temp_set(payload),
            Channel::Fan => command.with_fan(FanSpeed::from_payload(payload)),
            Channel::Power | Channel::CurrentTemperature => return None,
        };

        Some(command)
    }

    /// Fills every unset field from `current`.
    ///
    /// Unset enum fields keep `current`'s raw gateway codes, including codes
    /// the bridge does not recognize. The address of the result is the
    /// command's own address.
    #[must_use]
    pub fn merge(&self, current: &UnitState) -> UnitState {
        UnitState {
            address: self.address,
            power: self.power.unwrap_or(current.power),
            mode: self.mode.unwrap_or(current.mode),
            temp_set: self
                .temp_set
                .clone()
                .unwrap_or_else(|| current.temp_set.clone()),
            temp_in: current.temp_in.clone(),
            fan: self.fan.unwrap_or(current.fan),
            codes: GatewayCodes {
                on: self.power.map_or(current.codes.on, |power| power.code()),
                mode: self.mode.map_or(current.codes.mode, |mode| mode.code()),
                fan: self.fan.map_or(current.codes.fan, |fan| fan.code()),
            },
        }
    }
}
