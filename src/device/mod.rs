// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-device state synchronizer.
//!
//! A [`Device`] owns the polling cycle for one physical Phyn device. Each
//! cycle fetches the device state and today's consumption report from the
//! cloud, swaps both cached snapshots atomically, and notifies registered
//! listeners. Entities read the cached snapshot through the accessor
//! methods; they never talk to the API for reads.
//!
//! # Refresh semantics
//!
//! - One cycle may be in flight per device. Concurrent refresh requests
//!   coalesce into the in-flight cycle's outcome instead of issuing
//!   duplicate fetches.
//! - The whole cycle is bounded by a single 20-second deadline. A cycle
//!   that fails or times out leaves the previous snapshot untouched.
//! - Listeners are notified after successful cycles only, once each, in
//!   registration order.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use phyn_lib::api::ApiConfig;
//! use phyn_lib::device::{Device, Poller};
//!
//! # async fn example() -> phyn_lib::Result<()> {
//! let api = ApiConfig::new("user@example.com", "password")
//!     .connect()
//!     .await?;
//!
//! let device = Arc::new(Device::new(api, "home-1", "dev-1"));
//! device.refresh().await?;
//!
//! if device.available() {
//!     println!("flow: {:?} gpm", device.current_flow_rate());
//! }
//!
//! // Poll every 60 seconds until stopped
//! Arc::clone(&device).start(Device::DEFAULT_POLL_INTERVAL);
//! # Ok(())
//! # }
//! ```

mod poller;

pub use poller::Poller;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::api::ApiClient;
use crate::error::{ApiError, Error, Result};
use crate::state::{ConsumptionReport, DeviceState, ValveState};
use crate::subscription::{ListenerId, ListenerRegistry};

/// Manufacturer name reported for all devices.
const MANUFACTURER: &str = "Phyn";

/// The snapshot pair owned by a [`Device`].
///
/// Both halves are captured in the same refresh cycle and only ever
/// replaced together.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Device state as reported by the cloud.
    pub state: DeviceState,
    /// Consumption report for the vendor-local current day.
    pub consumption: ConsumptionReport,
}

/// Returns the vendor-local calendar date key for today, `YYYY/MM/DD`.
pub(crate) fn today_key() -> String {
    chrono::Local::now().format("%Y/%m/%d").to_string()
}

/// State synchronizer for one physical device.
///
/// Identified by the home and device ids assigned by the vendor; both are
/// immutable for the synchronizer's lifetime. The synchronizer is the
/// single writer of its snapshot pair; entities are read-only consumers.
pub struct Device {
    api: ApiClient,
    home_id: String,
    device_id: String,
    /// Current snapshot pair; `None` until the first successful refresh.
    snapshot: RwLock<Option<Arc<Snapshot>>>,
    listeners: ListenerRegistry,
    /// Serializes refresh cycles; waiters coalesce instead of re-fetching.
    refresh_lock: tokio::sync::Mutex<()>,
    /// Completed-cycle counter, successful or not.
    cycle: AtomicU64,
    last_update_success: AtomicBool,
    /// Failure reason of the last completed cycle, `None` after success.
    last_error: RwLock<Option<String>>,
    refresh_timeout: Duration,
    poll_task: Mutex<Option<JoinHandle<()>>>,
}

impl Device {
    /// Default interval between scheduled refresh cycles.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);
    /// Wall-clock deadline for one complete refresh cycle.
    pub const REFRESH_TIMEOUT: Duration = Duration::from_secs(20);

    /// Creates a synchronizer for the given device.
    #[must_use]
    pub fn new(api: ApiClient, home_id: impl Into<String>, device_id: impl Into<String>) -> Self {
        Self {
            api,
            home_id: home_id.into(),
            device_id: device_id.into(),
            snapshot: RwLock::new(None),
            listeners: ListenerRegistry::new(),
            refresh_lock: tokio::sync::Mutex::new(()),
            cycle: AtomicU64::new(0),
            last_update_success: AtomicBool::new(false),
            last_error: RwLock::new(None),
            refresh_timeout: Self::REFRESH_TIMEOUT,
            poll_task: Mutex::new(None),
        }
    }

    /// Overrides the per-cycle deadline.
    #[must_use]
    pub fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = timeout;
        self
    }

    /// Returns the vendor API client used by this synchronizer.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Returns the home identifier.
    #[must_use]
    pub fn home_id(&self) -> &str {
        &self.home_id
    }

    /// Returns the device identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.device_id
    }

    /// Returns the manufacturer name.
    #[must_use]
    pub fn manufacturer(&self) -> &'static str {
        MANUFACTURER
    }

    // =========================================================================
    // Refresh cycle
    // =========================================================================

    /// Runs one refresh cycle, or joins the cycle already in flight.
    ///
    /// Concurrent callers coalesce: while a cycle is running, additional
    /// requests wait for it and adopt its outcome rather than fetching
    /// again.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UpdateFailed`] when the cycle (or the joined
    /// in-flight cycle) fails; the previous snapshot stays authoritative.
    pub async fn refresh(&self) -> Result<()> {
        let observed = self.cycle.load(Ordering::Acquire);
        let _guard = self.refresh_lock.lock().await;

        if self.cycle.load(Ordering::Acquire) != observed {
            // A cycle completed while we waited for the lock; adopt its
            // outcome instead of starting another one.
            return match &*self.last_error.read() {
                None => Ok(()),
                Some(reason) => Err(Error::UpdateFailed(reason.clone())),
            };
        }

        let outcome = self.run_cycle().await;
        let result = match outcome {
            Ok(()) => {
                *self.last_error.write() = None;
                self.last_update_success.store(true, Ordering::Release);
                Ok(())
            }
            Err(err) => {
                let reason = err.to_string();
                tracing::warn!(device_id = %self.device_id, error = %reason, "Refresh cycle failed");
                *self.last_error.write() = Some(reason.clone());
                self.last_update_success.store(false, Ordering::Release);
                Err(Error::UpdateFailed(reason))
            }
        };
        self.cycle.fetch_add(1, Ordering::Release);
        drop(_guard);

        if result.is_ok() {
            self.listeners.notify();
        }
        result
    }

    /// Fetches both snapshots and swaps them in atomically.
    async fn run_cycle(&self) -> Result<()> {
        let fetches = async {
            let state = self.api.get_state(&self.device_id).await?;
            let date_key = today_key();
            let consumption = self.api.get_consumption(&self.device_id, &date_key).await?;
            Ok::<_, Error>((state, consumption))
        };

        let (state, consumption) = tokio::time::timeout(self.refresh_timeout, fetches)
            .await
            .map_err(|_| {
                let millis = u64::try_from(self.refresh_timeout.as_millis()).unwrap_or(u64::MAX);
                Error::Api(ApiError::Timeout(millis))
            })??;

        tracing::debug!(device_id = %self.device_id, state = ?state, "Device state refreshed");

        *self.snapshot.write() = Some(Arc::new(Snapshot { state, consumption }));
        Ok(())
    }

    /// Returns whether the most recently completed cycle succeeded.
    ///
    /// `false` until the first cycle completes.
    #[must_use]
    pub fn last_update_success(&self) -> bool {
        self.last_update_success.load(Ordering::Acquire)
    }

    // =========================================================================
    // Snapshot accessors
    // =========================================================================

    /// Returns the current snapshot pair, if any cycle has succeeded yet.
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.snapshot.read().clone()
    }

    /// Returns `true` if the device reports itself online.
    ///
    /// `false` before the first successful refresh.
    #[must_use]
    pub fn available(&self) -> bool {
        self.snapshot().is_some_and(|s| s.state.is_online())
    }

    /// Returns the hardware model code, e.g. `"PW1"` or `"PC1"`.
    #[must_use]
    pub fn model(&self) -> Option<String> {
        self.snapshot().map(|s| s.state.product_code.clone())
    }

    /// Returns the display name, e.g. `"Phyn PW1"`.
    #[must_use]
    pub fn device_name(&self) -> Option<String> {
        self.model().map(|model| format!("{MANUFACTURER} {model}"))
    }

    /// Returns the WiFi signal strength in dBm.
    #[must_use]
    pub fn rssi(&self) -> Option<f64> {
        self.snapshot().map(|s| s.state.signal_strength)
    }

    /// Returns the mean flow rate in gallons per minute.
    #[must_use]
    pub fn current_flow_rate(&self) -> Option<f64> {
        self.snapshot().and_then(|s| s.state.flow.as_ref().map(|m| m.mean))
    }

    /// Returns the mean line pressure in psi.
    #[must_use]
    pub fn current_psi(&self) -> Option<f64> {
        self.snapshot().and_then(|s| s.state.pressure.as_ref().map(|m| m.mean))
    }

    /// Returns the mean hot-line pressure in psi (dual-zone hardware).
    #[must_use]
    pub fn current_psi1(&self) -> Option<f64> {
        self.snapshot().and_then(|s| s.state.pressure1.as_ref().map(|m| m.mean))
    }

    /// Returns the mean cold-line pressure in psi (dual-zone hardware).
    #[must_use]
    pub fn current_psi2(&self) -> Option<f64> {
        self.snapshot().and_then(|s| s.state.pressure2.as_ref().map(|m| m.mean))
    }

    /// Returns the mean water temperature in degrees Fahrenheit.
    #[must_use]
    pub fn temperature(&self) -> Option<f64> {
        self.snapshot().and_then(|s| s.state.temperature.as_ref().map(|m| m.mean))
    }

    /// Returns the mean hot-line temperature in degrees Fahrenheit.
    #[must_use]
    pub fn temperature1(&self) -> Option<f64> {
        self.snapshot().and_then(|s| s.state.temperature1.as_ref().map(|m| m.mean))
    }

    /// Returns the mean cold-line temperature in degrees Fahrenheit.
    #[must_use]
    pub fn temperature2(&self) -> Option<f64> {
        self.snapshot().and_then(|s| s.state.temperature2.as_ref().map(|m| m.mean))
    }

    /// Returns the firmware version string.
    #[must_use]
    pub fn firmware_version(&self) -> Option<String> {
        self.snapshot().map(|s| s.state.fw_version.clone())
    }

    /// Returns the device serial number.
    #[must_use]
    pub fn serial_number(&self) -> Option<String> {
        self.snapshot().map(|s| s.state.serial_number.clone())
    }

    /// Returns the shutoff valve state.
    #[must_use]
    pub fn valve_state(&self) -> Option<ValveState> {
        self.snapshot().map(|s| s.state.sov_status.v)
    }

    /// Returns whether away mode is enabled.
    #[must_use]
    pub fn away_mode(&self) -> Option<bool> {
        self.snapshot().map(|s| s.state.away_mode_enabled())
    }

    /// Returns today's cumulative water consumption in gallons.
    #[must_use]
    pub fn consumption_today(&self) -> Option<f64> {
        self.snapshot().and_then(|s| s.consumption.water_consumption)
    }

    // =========================================================================
    // Listeners
    // =========================================================================

    /// Registers a listener invoked after every successful refresh.
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

    /// Installs a snapshot pair directly, as if a cycle had succeeded.
    #[cfg(test)]
    pub(crate) fn install_snapshot(&self, state: DeviceState, consumption: ConsumptionReport) {
        *self.snapshot.write() = Some(Arc::new(Snapshot { state, consumption }));
        self.last_update_success.store(true, Ordering::Release);
        self.listeners.notify();
    }
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("home_id", &self.home_id)
            .field("device_id", &self.device_id)
            .field("has_snapshot", &self.snapshot.read().is_some())
            .field("listener_count", &self.listeners.count())
            .finish_non_exhaustive()
    }
}
