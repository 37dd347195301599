// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed models for Phyn cloud API payloads.
//!
//! The Phyn API reports device state as nested JSON objects. This module
//! maps those payloads onto typed structs:
//!
//! - [`DeviceState`] - one device's reported state, replaced wholesale on
//!   each successful poll
//! - [`ConsumptionReport`] - water usage totals for one calendar day
//! - [`Home`] / [`HomeDevice`] - account-level device discovery
//!
//! # Examples
//!
//! ```
//! use phyn_lib::state::{DeviceState, ValveState};
//!
//! let payload = serde_json::json!({
//!     "product_code": "PW1",
//!     "signal_strength": -61.0,
//!     "online_status": {"v": "online"},
//!     "flow": {"mean": 0.0},
//!     "pressure": {"mean": 62.4},
//!     "temperature": {"mean": 71.2},
//!     "fw_version": "5.2.1",
//!     "serial_number": "PW1-000123",
//!     "sov_status": {"v": "Open"}
//! });
//!
//! let state: DeviceState = serde_json::from_value(payload).unwrap();
//! assert!(state.is_online());
//! assert_eq!(state.sov_status.v, ValveState::Open);
//! ```

mod consumption;
mod device_state;
mod home;

pub use consumption::ConsumptionReport;
pub use device_state::{DeviceState, Measurement, OnlineStatus, StatusValue, ValveState};
pub use home::{Home, HomeDevice};
