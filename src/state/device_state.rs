// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device state snapshot as reported by the Phyn cloud API.

use std::fmt;

use serde::Deserialize;

/// A timestamped value wrapper used throughout Phyn payloads.
///
/// Most scalar fields arrive as `{"v": <value>, "ts": <epoch-millis>}`.
/// The timestamp is not always present.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusValue<T> {
    /// The reported value.
    pub v: T,
    /// Epoch milliseconds at which the value was sampled.
    #[serde(default)]
    pub ts: Option<i64>,
}

/// An averaged measurement, e.g. flow rate or line pressure.
///
/// The API reports rolling statistics per field; only the mean is
/// surfaced by this library.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Measurement {
    /// Mean value over the reporting window.
    pub mean: f64,
    /// Epoch milliseconds at which the window closed.
    #[serde(default)]
    pub ts: Option<i64>,
}

/// Cloud connectivity status of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnlineStatus {
    /// Device is connected to the Phyn cloud.
    Online,
    /// Device is known but currently unreachable.
    Offline,
    /// Any other status string reported by the API.
    #[serde(other)]
    Unknown,
}

impl OnlineStatus {
    /// Returns the status string as reported by the API.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for OnlineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// State of the shutoff valve built into Phyn Plus devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ValveState {
    /// Valve is fully open.
    Open,
    /// Valve is fully closed.
    Closed,
    /// Valve is moving or in an unreported position.
    #[serde(other)]
    Unknown,
}

impl ValveState {
    /// Returns the valve state string as reported by the API.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::Closed => "Closed",
            Self::Unknown => "Unknown",
        }
    }

    /// Returns `true` if the valve is open.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

impl fmt::Display for ValveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One device's reported state.
///
/// A snapshot is parsed in full from the `state` endpoint and replaced
/// wholesale on each successful poll. Fields every device reports are
/// required here, so an incomplete payload fails deserialization instead
/// of producing a half-populated snapshot. Measurement fields depend on
/// the hardware variant: single-zone monitors report `flow`, `pressure`
/// and `temperature`, while dual-zone (hot/cold) hardware reports the
/// numbered variants instead.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeviceState {
    /// Hardware model code, e.g. `"PW1"` or `"PC1"`.
    pub product_code: String,
    /// WiFi signal strength in dBm.
    pub signal_strength: f64,
    /// Cloud connectivity status.
    pub online_status: StatusValue<OnlineStatus>,
    /// Mean water flow in gallons per minute.
    #[serde(default)]
    pub flow: Option<Measurement>,
    /// Mean line pressure in psi.
    #[serde(default)]
    pub pressure: Option<Measurement>,
    /// Mean hot-line pressure in psi (dual-zone hardware).
    #[serde(default)]
    pub pressure1: Option<Measurement>,
    /// Mean cold-line pressure in psi (dual-zone hardware).
    #[serde(default)]
    pub pressure2: Option<Measurement>,
    /// Mean water temperature in degrees Fahrenheit.
    #[serde(default)]
    pub temperature: Option<Measurement>,
    /// Mean hot-line temperature in degrees Fahrenheit (dual-zone hardware).
    #[serde(default)]
    pub temperature1: Option<Measurement>,
    /// Mean cold-line temperature in degrees Fahrenheit (dual-zone hardware).
    #[serde(default)]
    pub temperature2: Option<Measurement>,
    /// Firmware version string.
    pub fw_version: String,
    /// Device serial number.
    pub serial_number: String,
    /// Shutoff valve state.
    pub sov_status: StatusValue<ValveState>,
    /// Away mode flag.
    #[serde(default)]
    pub away_mode: Option<StatusValue<bool>>,
}

impl DeviceState {
    /// Returns `true` if the device reports itself online.
    ///
    /// Any status other than `"online"` counts as unavailable.
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.online_status.v == OnlineStatus::Online
    }

    /// Returns `true` if away mode is enabled.
    ///
    /// Defaults to `false` when the device does not report the field.
    #[must_use]
    pub fn away_mode_enabled(&self) -> bool {
        self.away_mode.as_ref().is_some_and(|m| m.v)
    }
}
