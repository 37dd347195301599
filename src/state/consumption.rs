// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Water consumption report for one calendar day.

use serde::Deserialize;

/// Water usage totals for a single vendor-local calendar day.
///
/// Fetched alongside the device state on every poll cycle and replaced
/// wholesale. The total may be absent early in the day before the cloud
/// has aggregated any usage.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConsumptionReport {
    /// Cumulative water consumption for the day, in gallons.
    #[serde(default)]
    pub water_consumption: Option<f64>,
}

impl ConsumptionReport {
    /// Returns an empty report with no recorded consumption.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            water_consumption: None,
        }
    }
}
