// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity adapters over device snapshots.
//!
//! Entities translate synchronizer state into the host platform's value
//! model. Read-only sensors derive a rounded measurement live from the
//! current snapshot; write-capable switches additionally forward commands
//! to the vendor API and keep an optimistic local state.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use phyn_lib::api::ApiConfig;
//! use phyn_lib::device::Device;
//! use phyn_lib::entity::{Entity, sensors_for, switches_for};
//!
//! # async fn example() -> phyn_lib::Result<()> {
//! let api = ApiConfig::new("user@example.com", "password").connect().await?;
//! let device = Arc::new(Device::new(api, "home-1", "dev-1"));
//! device.refresh().await?;
//!
//! for sensor in sensors_for(&device) {
//!     println!("{}: {:?}", sensor.name(), sensor.value());
//! }
//!
//! let switches = switches_for(&device);
//! switches[0].turn_off().await?;
//! # Ok(())
//! # }
//! ```

mod sensor;
mod switch;

pub use sensor::{SensorKind, Unit, WaterSensor, sensors_for};
pub use switch::{DeviceSwitch, SwitchKind, switches_for};

use crate::device::Device;

/// A value presented to the host platform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntityValue {
    /// The underlying field is absent or no snapshot exists yet.
    Unknown,
    /// A numeric measurement, rounded to one decimal place.
    Measurement(f64),
    /// A boolean switch state.
    OnOff(bool),
}

/// Device registry metadata shared by all entities of one device.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInfo {
    /// Vendor-assigned device identifier.
    pub device_id: String,
    /// Manufacturer name.
    pub manufacturer: &'static str,
    /// Hardware model code.
    pub model: String,
    /// Display name, e.g. `"Phyn PW1"`.
    pub name: String,
    /// Firmware version.
    pub sw_version: String,
}

/// Capability implemented by every entity adapter.
///
/// All methods are pure reads; write commands live on the concrete
/// switch type.
pub trait Entity {
    /// Stable unique identifier, `{device_id}_{entity_type}`.
    fn unique_id(&self) -> String;

    /// Human-readable entity name.
    fn name(&self) -> &str;

    /// Returns `true` while the backing device reports itself online.
    fn available(&self) -> bool;

    /// Current value derived from the snapshot (or local switch state).
    fn value(&self) -> EntityValue;

    /// Icon identifier for the host's presentation layer.
    fn icon(&self) -> &'static str;

    /// Registry metadata, once a snapshot is available.
    fn device_info(&self) -> Option<DeviceInfo>;
}

/// Builds registry metadata from a synchronizer's current snapshot.
fn device_info_for(device: &Device) -> Option<DeviceInfo> {
    let model = device.model()?;
    Some(DeviceInfo {
        device_id: device.id().to_string(),
        manufacturer: device.manufacturer(),
        model: model.clone(),
        name: format!("{} {model}", device.manufacturer()),
        sw_version: device.firmware_version()?,
    })
}
