// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-entry setup and lifecycle.

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::api::{ApiClient, ApiConfig};
use crate::device::{Device, Poller};
use crate::entity::{DeviceSwitch, Entity, WaterSensor, sensors_for, switches_for};
use crate::error::{Error, Result};

/// Unique identifier for a set-up entry.
///
/// A wrapper around UUID v4 providing a distinct type for entry
/// identification.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId(Uuid);

impl EntryId {
    /// Creates a new unique entry identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short = &self.0.to_string()[..8];
        write!(f, "EntryId({short}...)")
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything one set-up entry owns: the API client, the device
/// synchronizers and their entities.
///
/// Ownership ends at unload; there is no global registry. Dropping the
/// context stops every poller.
pub struct EntryContext {
    entry_id: EntryId,
    api: ApiClient,
    devices: Vec<Arc<Device>>,
    sensors: Vec<WaterSensor>,
    switches: Vec<Arc<DeviceSwitch>>,
}

impl EntryContext {
    /// Returns the entry identifier.
    #[must_use]
    pub fn entry_id(&self) -> EntryId {
        self.entry_id
    }

    /// Returns the shared vendor API client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Returns the device synchronizers, one per discovered device.
    #[must_use]
    pub fn devices(&self) -> &[Arc<Device>] {
        &self.devices
    }

    /// Returns the registered sensors.
    #[must_use]
    pub fn sensors(&self) -> &[WaterSensor] {
        &self.sensors
    }

    /// Returns the registered switches.
    #[must_use]
    pub fn switches(&self) -> &[Arc<DeviceSwitch>] {
        &self.switches
    }

    /// Iterates over every registered entity.
    pub fn entities(&self) -> impl Iterator<Item = &dyn Entity> {
        self.sensors
            .iter()
            .map(|sensor| sensor as &dyn Entity)
            .chain(
                self.switches
                    .iter()
                    .map(|switch| switch.as_ref() as &dyn Entity),
            )
    }

    /// Stops every poller and releases all per-device resources.
    pub fn unload(self) {
        // Explicit for callers; Drop performs the same teardown.
        self.stop_pollers();
    }

    fn stop_pollers(&self) {
        for device in &self.devices {
            device.stop();
        }
    }
}

impl Drop for EntryContext {
    fn drop(&mut self) {
        self.stop_pollers();
    }
}

impl fmt::Debug for EntryContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryContext")
            .field("entry_id", &self.entry_id)
            .field("device_count", &self.devices.len())
            .field("sensor_count", &self.sensors.len())
            .field("switch_count", &self.switches.len())
            .finish_non_exhaustive()
    }
}

/// Sets up one entry: authenticate, discover, build, start polling.
///
/// Authentication and home discovery failures surface as
/// [`Error::NotReady`] so the host retries setup later. Initial refresh
/// failures are logged and tolerated; the affected entities start
/// Unknown and recover on a later poll.
///
/// # Errors
///
/// Returns [`Error::NotReady`] when the vendor service is unreachable
/// during authentication or home discovery.
pub async fn setup_entry(config: ApiConfig) -> Result<EntryContext> {
    let username = config.username().to_string();

    let api = config
        .connect()
        .await
        .map_err(|err| Error::NotReady(err.to_string()))?;

    let homes = api
        .get_homes(&username)
        .await
        .map_err(|err| Error::NotReady(err.to_string()))?;

    tracing::debug!(home_count = homes.len(), "Discovered Phyn homes");

    let devices: Vec<Arc<Device>> = homes
        .iter()
        .flat_map(|home| {
            home.devices.iter().map(|device| {
                Arc::new(Device::new(
                    api.clone(),
                    home.id.clone(),
                    device.device_id.clone(),
                ))
            })
        })
        .collect();

    // Initial refresh for all devices concurrently. Failures are logged
    // by refresh() and do not abort setup.
    let handles: Vec<_> = devices
        .iter()
        .map(|device| {
            let device = Arc::clone(device);
            tokio::spawn(async move {
                let _ = device.refresh().await;
            })
        })
        .collect();
    for handle in handles {
        let _ = handle.await;
    }

    let mut sensors = Vec::new();
    let mut switches = Vec::new();
    for device in &devices {
        sensors.extend(sensors_for(device));
        switches.extend(switches_for(device));
    }

    for device in &devices {
        Arc::clone(device).start(Device::DEFAULT_POLL_INTERVAL);
    }

    let context = EntryContext {
        entry_id: EntryId::new(),
        api,
        devices,
        sensors,
        switches,
    };

    tracing::debug!(context = ?context, "Entry setup complete");

    Ok(context)
}
