// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Power state of an indoor unit.

use std::fmt;

/// Represents whether a unit is running.
///
/// Decoding never fails: anything other than `"on"` (or gateway code `1`)
/// is treated as [`PowerState::Off`].
///
/// # Examples
///
/// ```
/// use zhonghong_bridge::types::PowerState;
///
/// assert_eq!(PowerState::from_payload("on"), PowerState::On);
/// assert_eq!(PowerState::from_payload("garbage"), PowerState::Off);
/// assert_eq!(PowerState::On.code(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PowerState {
    /// Unit is off.
    #[default]
    Off,
    /// Unit is on.
    On,
}

impl PowerState {
    /// Decodes an MQTT payload token.
    #[must_use]
    pub fn from_payload(payload: &str) -> Self {
        match payload {
            "on" => Self::On,
            _ => Self::Off,
        }
    }

    /// Returns the MQTT payload token.
    #[must_use]
    pub const fn as_payload(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::On => "on",
        }
    }

    /// Decodes the gateway `on` field.
    #[must_use]
    pub const fn from_code(code: i64) -> Self {
        match code {
            1 => Self::On,
            _ => Self::Off,
        }
    }

    /// Returns the gateway `on` field value.
    #[must_use]
    pub const fn code(&self) -> i64 {
        match self {
            Self::Off => 0,
            Self::On => 1,
        }
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_payload())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_round_trip() {
        for token in ["on", "off"] {
            assert_eq!(PowerState::from_payload(token).as_payload(), token);
        }
    }

    #[test]
    fn unknown_payload_falls_back_to_off() {
        assert_eq!(PowerState::from_payload("ON"), PowerState::Off);
        assert_eq!(PowerState::from_payload(""), PowerState::Off);
        assert_eq!(PowerState::from_payload("toggle").as_payload(), "off");
    }

    #[test]
    fn gateway_codes() {
        assert_eq!(PowerState::from_code(0), PowerState::Off);
        assert_eq!(PowerState::from_code(1), PowerState::On);
        assert_eq!(PowerState::from_code(7), PowerState::Off);
        assert_eq!(PowerState::Off.code(), 0);
        assert_eq!(PowerState::On.code(), 1);
    }
}
