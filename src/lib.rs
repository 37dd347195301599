// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Phyn Lib - A Rust library for Phyn smart water devices.
//!
//! This library bridges the Phyn cloud water-monitoring API to a
//! home-automation entity model: it polls device state and consumption
//! data on a fixed interval and exposes the derived measurements as
//! read-only sensors and read/write switches.
//!
//! # Supported Features
//!
//! - **State polling**: per-device synchronizer with a 60-second poll
//!   interval, a 20-second cycle deadline and single-flight coalescing
//! - **Sensors**: daily water usage, flow rate, pressure and temperature
//!   (single-zone and hot/cold dual-zone hardware)
//! - **Switches**: shutoff valve and away mode with optimistic local state
//! - **Discovery**: account-level home and device enumeration at setup
//!
//! # Quick Start
//!
//! ## One Device
//!
//! ```no_run
//! use std::sync::Arc;
//! use phyn_lib::api::ApiConfig;
//! use phyn_lib::device::{Device, Poller};
//!
//! #[tokio::main]
//! async fn main() -> phyn_lib::Result<()> {
//!     let api = ApiConfig::new("user@example.com", "password")
//!         .connect()
//!         .await?;
//!
//!     let device = Arc::new(Device::new(api, "home-1", "dev-1"));
//!     device.refresh().await?;
//!
//!     println!("online: {}", device.available());
//!     println!("pressure: {:?} psi", device.current_psi());
//!     println!("used today: {:?} gal", device.consumption_today());
//!
//!     // Keep the state fresh in the background
//!     Arc::clone(&device).start(Device::DEFAULT_POLL_INTERVAL);
//!     Ok(())
//! }
//! ```
//!
//! ## Full Integration Setup
//!
//! ```no_run
//! use phyn_lib::manager::{Credentials, setup_entry};
//!
//! #[tokio::main]
//! async fn main() -> phyn_lib::Result<()> {
//!     let credentials = Credentials::new("user@example.com", "password");
//!
//!     // Discovers every device, runs the initial refresh and starts
//!     // the pollers.
//!     let entry = setup_entry(credentials.api_config()).await?;
//!
//!     for entity in entry.entities() {
//!         println!("{} -> {:?}", entity.unique_id(), entity.value());
//!     }
//!
//!     // Open the valve on the first device
//!     entry.switches()[0].turn_on().await?;
//!
//!     // Stops the pollers and releases everything
//!     entry.unload();
//!     Ok(())
//! }
//! ```
//!
//! ## Reacting to Refreshes
//!
//! ```no_run
//! use std::sync::Arc;
//! use phyn_lib::api::ApiConfig;
//! use phyn_lib::device::Device;
//!
//! # async fn example() -> phyn_lib::Result<()> {
//! # let api = ApiConfig::new("u", "p").connect().await?;
//! let device = Arc::new(Device::new(api, "home-1", "dev-1"));
//!
//! let handle = Arc::clone(&device);
//! device.add_listener(move || {
//!     println!("fresh snapshot: {:?} gpm", handle.current_flow_rate());
//! });
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod device;
pub mod entity;
pub mod error;
pub mod manager;
pub mod state;
pub mod subscription;

pub use api::{ApiClient, ApiConfig};
pub use device::{Device, Poller, Snapshot};
pub use entity::{
    DeviceSwitch, Entity, EntityValue, SensorKind, SwitchKind, Unit, WaterSensor, sensors_for,
    switches_for,
};
pub use error::{ApiError, Error, ParseError, Result};
pub use manager::{Credentials, EntryContext, EntryId, setup_entry, validate_credentials};
pub use state::{ConsumptionReport, DeviceState, Home, HomeDevice, OnlineStatus, ValveState};
pub use subscription::{ListenerId, ListenerRegistry};
