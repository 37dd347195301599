// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Write-capable switch adapters.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::device::Device;
use crate::error::Result;
use crate::subscription::{ListenerId, ListenerRegistry};

use super::{DeviceInfo, Entity, EntityValue, device_info_for};

/// The controllable feature a [`DeviceSwitch`] exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchKind {
    /// The shutoff valve; ON means open.
    ShutoffValve,
    /// The vendor-defined away mode, distinct from the valve state.
    AwayMode,
}

impl SwitchKind {
    /// Entity-type suffix used in the unique id.
    #[must_use]
    pub const fn entity_type(&self) -> &'static str {
        match self {
            Self::ShutoffValve => "shutoff_valve",
            Self::AwayMode => "away_mode",
        }
    }

    /// Human-readable switch name.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::ShutoffValve => "Shutoff valve",
            Self::AwayMode => "Away mode",
        }
    }

    /// Icon shown while the switch is ON.
    #[must_use]
    pub const fn icon_on(&self) -> &'static str {
        match self {
            Self::ShutoffValve => "mdi:valve-open",
            Self::AwayMode => "mdi:bag-suitcase",
        }
    }

    /// Icon shown while the switch is OFF.
    #[must_use]
    pub const fn icon_off(&self) -> &'static str {
        match self {
            Self::ShutoffValve => "mdi:valve-closed",
            Self::AwayMode => "mdi:home-circle",
        }
    }
}

/// Write-capable switch over one controllable device feature.
///
/// Local state is optimistic: a successful command flips it immediately
/// without waiting for the next poll, and a failed command leaves it
/// untouched. Every new snapshot re-derives the state, so a manual write
/// racing a background refresh resolves as "last write observed wins".
pub struct DeviceSwitch {
    device: Arc<Device>,
    kind: SwitchKind,
    unique_id: String,
    /// Last-known or optimistically-set state.
    state: AtomicBool,
    /// Listeners notified on every local state write.
    listeners: ListenerRegistry,
}

impl DeviceSwitch {
    /// Creates a switch and subscribes it to the device's refresh cycle.
    ///
    /// The initial state derives from the current snapshot; OFF when no
    /// snapshot exists yet.
    #[must_use]
    pub fn new(device: Arc<Device>, kind: SwitchKind) -> Arc<Self> {
        let unique_id = format!("{}_{}", device.id(), kind.entity_type());
        let initial = Self::derive(&device, kind).unwrap_or(false);

        let switch = Arc::new(Self {
            device: Arc::clone(&device),
            kind,
            unique_id,
            state: AtomicBool::new(initial),
            listeners: ListenerRegistry::new(),
        });

        let weak = Arc::downgrade(&switch);
        device.add_listener(move || {
            if let Some(switch) = weak.upgrade() {
                switch.sync_from_snapshot();
            }
        });

        switch
    }

    /// Derives the switch boolean from the device's current snapshot.
    fn derive(device: &Device, kind: SwitchKind) -> Option<bool> {
        match kind {
            SwitchKind::ShutoffValve => device.valve_state().map(|v| v.is_open()),
            SwitchKind::AwayMode => device.away_mode(),
        }
    }

    /// Returns the feature this switch controls.
    #[must_use]
    pub fn kind(&self) -> SwitchKind {
        self.kind
    }

    /// Returns `true` if the switch is ON.
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.state.load(Ordering::Acquire)
    }

    /// Turns the switch ON (opens the valve / enables away mode).
    ///
    /// On success the local state flips immediately and listeners are
    /// notified once, without waiting for the next poll.
    ///
    /// # Errors
    ///
    /// Propagates the API failure; local state is left unchanged.
    pub async fn turn_on(&self) -> Result<()> {
        match self.kind {
            SwitchKind::ShutoffValve => self.device.api().open_valve(self.device.id()).await?,
            SwitchKind::AwayMode => {
                self.device.api().enable_away_mode(self.device.id()).await?;
            }
        }
        self.write_local(true);
        Ok(())
    }

    /// Turns the switch OFF (closes the valve / disables away mode).
    ///
    /// # Errors
    ///
    /// Propagates the API failure; local state is left unchanged.
    pub async fn turn_off(&self) -> Result<()> {
        match self.kind {
            SwitchKind::ShutoffValve => self.device.api().close_valve(self.device.id()).await?,
            SwitchKind::AwayMode => {
                self.device
                    .api()
                    .disable_away_mode(self.device.id())
                    .await?;
            }
        }
        self.write_local(false);
        Ok(())
    }

    /// Stores a new local state and notifies listeners once.
    fn write_local(&self, on: bool) {
        self.state.store(on, Ordering::Release);
        self.listeners.notify();
    }

    /// Re-derives the state from a freshly swapped snapshot.
    fn sync_from_snapshot(&self) {
        if let Some(derived) = Self::derive(&self.device, self.kind) {
            self.write_local(derived);
        }
    }

    /// Registers a listener invoked after every local state write.
    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.listeners.add(listener)
    }

    /// Removes a previously registered listener.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Requests an on-demand refresh of the backing device.
    ///
    /// Coalesces with any refresh cycle already in flight.
    ///
    /// # Errors
    ///
    /// Returns error if the cycle fails; cached state is unchanged.
    pub async fn request_refresh(&self) -> Result<()> {
        self.device.refresh().await
    }
}

impl Entity for DeviceSwitch {
    fn unique_id(&self) -> String {
        self.unique_id.clone()
    }

    fn name(&self) -> &str {
        self.kind.display_name()
    }

    fn available(&self) -> bool {
        self.device.available()
    }

    fn value(&self) -> EntityValue {
        EntityValue::OnOff(self.is_on())
    }

    fn icon(&self) -> &'static str {
        if self.is_on() {
            self.kind.icon_on()
        } else {
            self.kind.icon_off()
        }
    }

    fn device_info(&self) -> Option<DeviceInfo> {
        device_info_for(&self.device)
    }
}

impl std::fmt::Debug for DeviceSwitch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSwitch")
            .field("unique_id", &self.unique_id)
            .field("kind", &self.kind)
            .field("is_on", &self.is_on())
            .finish_non_exhaustive()
    }
}

/// Builds the switch set for a device: shutoff valve and away mode.
#[must_use]
pub fn switches_for(device: &Arc<Device>) -> Vec<Arc<DeviceSwitch>> {
    vec![
        DeviceSwitch::new(Arc::clone(device), SwitchKind::ShutoffValve),
        DeviceSwitch::new(Arc::clone(device), SwitchKind::AwayMode),
    ]
}
