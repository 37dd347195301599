// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Account-level home and device discovery payloads.

use serde::Deserialize;

/// A home registered to a Phyn account.
///
/// Homes group the physical devices installed at one address. Device
/// discovery at setup walks every home of the account.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Home {
    /// Vendor-assigned home identifier.
    pub id: String,
    /// User-chosen display name for the home.
    pub alias_name: String,
    /// Devices installed in this home.
    #[serde(default)]
    pub devices: Vec<HomeDevice>,
}

/// A device reference inside a [`Home`] listing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HomeDevice {
    /// Vendor-assigned device identifier.
    pub device_id: String,
}
