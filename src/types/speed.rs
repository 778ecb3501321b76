// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fan speed of an indoor unit.

use std::fmt;

/// Fan speed setting.
///
/// The gateway uses `1` for the fastest setting and larger bits for slower
/// ones. Unknown payloads and codes decode to [`FanSpeed::High`].
///
/// # Examples
///
/// ```
/// use zhonghong_bridge::types::FanSpeed;
///
/// assert_eq!(FanSpeed::from_payload("low").code(), 4);
/// assert_eq!(FanSpeed::from_code(2), FanSpeed::Medium);
/// assert_eq!(FanSpeed::from_payload("turbo"), FanSpeed::High);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FanSpeed {
    /// Fastest setting.
    #[default]
    High,
    /// Middle setting.
    Medium,
    /// Slowest setting.
    Low,
}

impl FanSpeed {
    /// Decodes an MQTT payload token.
    #[must_use]
    pub fn from_payload(payload: &str) -> Self {
        match payload {
            "medium" => Self::Medium,
            "low" => Self::Low,
            _ => Self::High,
        }
    }

    /// Returns the MQTT payload token.
    #[must_use]
    pub const fn as_payload(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Decodes the gateway `fan` field.
    #[must_use]
    pub const fn from_code(code: i64) -> Self {
        match code {
            2 => Self::Medium,
            4 => Self::Low,
            _ => Self::High,
        }
    }

    /// Returns the gateway `fan` field value.
    #[must_use]
    pub const fn code(&self) -> i64 {
        match self {
            Self::High => 1,
            Self::Medium => 2,
            Self::Low => 4,
        }
    }
}

impl fmt::Display for FanSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_payload())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_round_trip() {
        for token in ["high", "medium", "low"] {
            assert_eq!(FanSpeed::from_payload(token).as_payload(), token);
        }
    }

    #[test]
    fn unknown_payload_falls_back_to_high() {
        assert_eq!(FanSpeed::from_payload("auto"), FanSpeed::High);
        assert_eq!(FanSpeed::from_payload("auto").as_payload(), "high");
    }

    #[test]
    fn gateway_codes() {
        assert_eq!(FanSpeed::High.code(), 1);
        assert_eq!(FanSpeed::Medium.code(), 2);
        assert_eq!(FanSpeed::Low.code(), 4);
        assert_eq!(FanSpeed::from_code(4), FanSpeed::Low);
        assert_eq!(FanSpeed::from_code(0), FanSpeed::High);
        assert_eq!(FanSpeed::from_code(8), FanSpeed::High);
    }
}
