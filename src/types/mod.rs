// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types shared by the MQTT and gateway sides.
//!
//! Each enum converts both ways between an MQTT payload token and a gateway
//! integer code. Every conversion is total: unrecognized input maps to a
//! fixed fallback instead of an error.
//!
//! # Types
//!
//! - [`PowerState`] - `on`/`off`, gateway `1`/`0`, fallback off
//! - [`Mode`] - `cool`/`dry`/`fan_only`/`heat`, gateway `1`/`2`/`4`/`8`, fallback cool
//! - [`FanSpeed`] - `high`/`medium`/`low`, gateway `1`/`2`/`4`, fallback high
//! - [`UnitAddress`] - outdoor/indoor id pair

mod address;
mod mode;
mod power;
mod speed;

pub use address::UnitAddress;
pub use mode::Mode;
pub use power::PowerState;
pub use speed::FanSpeed;
