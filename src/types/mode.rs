// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Operating mode of an indoor unit.

use std::fmt;

/// HVAC operating mode.
///
/// The gateway encodes modes as single bits. Unknown payloads and unknown
/// gateway codes both decode to [`Mode::Cool`].
///
/// # Examples
///
/// ```
/// use zhonghong_bridge::types::Mode;
///
/// assert_eq!(Mode::from_payload("fan_only"), Mode::FanOnly);
/// assert_eq!(Mode::FanOnly.code(), 4);
/// assert_eq!(Mode::from_payload("auto").as_payload(), "cool");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// Cooling.
    #[default]
    Cool,
    /// Dehumidifying.
    Dry,
    /// Fan only, no compressor.
    FanOnly,
    /// Heating.
    Heat,
}

impl Mode {
    /// All supported modes in gateway code order.
    pub const ALL: [Self; 4] = [Self::Cool, Self::Dry, Self::FanOnly, Self::Heat];

    /// Decodes an MQTT payload token.
    #[must_use]
    pub fn from_payload(payload: &str) -> Self {
        match payload {
            "dry" => Self::Dry,
            "fan_only" => Self::FanOnly,
            "heat" => Self::Heat,
            _ => Self::Cool,
        }
    }

    /// Returns the MQTT payload token.
    #[must_use]
    pub const fn as_payload(&self) -> &'static str {
        match self {
            Self::Cool => "cool",
            Self::Dry => "dry",
            Self::FanOnly => "fan_only",
            Self::Heat => "heat",
        }
    }

    /// Decodes the gateway `mode` field.
    #[must_use]
    pub const fn from_code(code: i64) -> Self {
        match code {
            2 => Self::Dry,
            4 => Self::FanOnly,
            8 => Self::Heat,
            _ => Self::Cool,
        }
    }

    /// Returns the gateway `mode` field value.
    #[must_use]
    pub const fn code(&self) -> i64 {
        match self {
            Self::Cool => 1,
            Self::Dry => 2,
            Self::FanOnly => 4,
            Self::Heat => 8,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_payload())
    }
}
