// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP client for the Phyn cloud API.
//!
//! All device data flows through the vendor's cloud service; there is no
//! local transport. The client authenticates once with account
//! credentials and attaches the resulting bearer token to every request.
//!
//! # Examples
//!
//! ```no_run
//! use phyn_lib::api::ApiConfig;
//!
//! # async fn example() -> phyn_lib::Result<()> {
//! let api = ApiConfig::new("user@example.com", "password")
//!     .connect()
//!     .await?;
//!
//! let homes = api.get_homes("user@example.com").await?;
//! for home in &homes {
//!     for device in &home.devices {
//!         let state = api.get_state(&device.device_id).await?;
//!         println!("{}: {}", device.device_id, state.online_status.v);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod client;

pub use client::{ApiClient, ApiConfig};

#[cfg(test)]
pub(crate) use client::test_client;
