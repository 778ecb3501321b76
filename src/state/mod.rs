// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Unit state and partial commands.
//!
//! [`UnitState`] is what the gateway reports for a unit; [`UnitCommand`] is
//! what an MQTT client asks to change. Neither outlives a single poll tick or
//! command cycle.
//!
//! # Examples
//!
//! ```
//! use zhonghong_bridge::state::{UnitCommand, UnitState};
//! use zhonghong_bridge::types::{FanSpeed, UnitAddress};
//!
//! let json = r#"{"oa":1,"ia":1,"on":1,"mode":2,"tempSet":"24","fan":4}"#;
//! let current: UnitState = serde_json::from_str(json).unwrap();
//!
//! let merged = UnitCommand::new(UnitAddress::new(1, 1))
//!     .with_fan(FanSpeed::High)
//!     .merge(&current);
//!
//! assert_eq!(merged.temp_set, "24");
//! assert_eq!(merged.fan, FanSpeed::High);
//! ```

mod unit_command;
mod unit_state;

pub use unit_command::UnitCommand;
pub use unit_state::{GatewayCodes, UnitState};
