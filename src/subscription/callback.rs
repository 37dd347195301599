// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Listener management for refresh notifications.
//!
//! This module provides the core types for update subscriptions:
//!
//! - [`ListenerId`] - Unique handle for removing a listener
//! - [`ListenerRegistry`] - Ordered registry that stores and notifies listeners

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

/// Unique handle for a registered listener.
///
/// Returned when adding a listener and used to remove it later. Handles
/// are unique within a registry's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Creates a new listener handle with the given value.
    #[must_use]
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw handle value.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Listener({})", self.0)
    }
}

/// Type alias for update listener callbacks.
type Listener = Arc<dyn Fn() + Send + Sync>;

/// Ordered registry of update listeners.
///
/// Listeners are notified synchronously, once each, in registration order.
/// Notification iterates over a copy of the listener list, so a listener
/// may remove itself (or any other listener) during notification without
/// corrupting the iteration; the removal takes effect on the next
/// [`notify`](Self::notify).
///
/// # Thread Safety
///
/// The registry is fully thread-safe. Callbacks are wrapped in `Arc` so
/// the copied list is cheap to produce.
pub struct ListenerRegistry {
    /// Counter for generating unique listener handles.
    next_id: AtomicU64,
    /// Registered listeners, in registration order.
    listeners: RwLock<Vec<(ListenerId, Listener)>>,
}

impl ListenerRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Registers a listener and returns its handle.
    pub fn add<F>(&self, listener: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = ListenerId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, Arc::new(listener)));
        id
    }

    /// Removes a listener by its handle.
    ///
    /// Returns `true` if a listener was found and removed. Removing an
    /// already-removed handle is a no-op.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(entry_id, _)| *entry_id != id);
        listeners.len() != before
    }

    /// Removes all listeners.
    pub fn clear(&self) {
        self.listeners.write().clear();
    }

    /// Notifies every registered listener, in registration order.
    ///
    /// The listener list is copied before iteration; registrations and
    /// removals performed by a listener apply to subsequent notifications.
    pub fn notify(&self) {
        let snapshot: Vec<Listener> = self
            .listeners
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in snapshot {
            listener();
        }
    }

    /// Returns the number of registered listeners.
    #[must_use]
    pub fn count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Returns `true` if no listeners are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("count", &self.count())
            .finish()
    }
}
