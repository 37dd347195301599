// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polling capability for device synchronizers.
//!
//! The host integration drives refresh scheduling through this trait
//! instead of subclassing a framework coordinator: `start` spawns the
//! interval task, `stop` cancels it, `force_refresh` runs an on-demand
//! cycle, and listeners observe successful refreshes.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::error::Result;
use crate::subscription::ListenerId;

use super::Device;

/// Capability for periodically refreshed device state.
///
/// Implemented by [`Device`]; the scheduler is a plain tokio interval
/// task owned by the implementor.
#[allow(async_fn_in_trait)]
pub trait Poller {
    /// Starts periodic refreshing at the given interval.
    ///
    /// Takes an `Arc` receiver so the spawned task can hold a weak
    /// handle to the implementor. Calling `start` while a poll task is
    /// already running is a no-op.
    fn start(self: Arc<Self>, interval: Duration);

    /// Stops periodic refreshing and cancels the pending timer.
    ///
    /// Safe to call when polling was never started.
    fn stop(&self);

    /// Returns `true` while a poll task is running.
    fn is_polling(&self) -> bool;

    /// Runs one refresh cycle on demand, coalescing with any cycle
    /// already in flight.
    ///
    /// # Errors
    ///
    /// Returns error if the cycle fails; cached state is unchanged.
    async fn force_refresh(&self) -> Result<()>;

    /// Registers a listener invoked after every successful refresh.
    fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static;

    /// Removes a previously registered listener.
    fn remove_listener(&self, id: ListenerId) -> bool;
}

impl Poller for Device {
    fn start(self: Arc<Self>, interval: Duration) {
        let mut task = self.poll_task.lock();
        if task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        tracing::debug!(device_id = %self.id(), interval_secs = interval.as_secs(), "Starting poll task");

        // The task holds a weak handle so dropping the synchronizer ends
        // polling without an explicit stop.
        let device = Arc::downgrade(&self);
        *task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick fires immediately; the initial refresh is
            // the bootstrap's job.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(device) = device.upgrade() else { break };
                // Failures are logged by refresh(); the next tick retries.
                let _ = device.refresh().await;
            }
        }));
    }

    fn stop(&self) {
        if let Some(handle) = self.poll_task.lock().take() {
            tracing::debug!(device_id = %self.id(), "Stopping poll task");
            handle.abort();
        }
    }

    fn is_polling(&self) -> bool {
        self.poll_task
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    async fn force_refresh(&self) -> Result<()> {
        self.refresh().await
    }

    fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        Device::add_listener(self, listener)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        Device::remove_listener(self, id)
    }
}
