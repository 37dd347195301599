// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Listener registration for refresh notifications.
//!
//! Entities subscribe to a device's refresh cycle (and to each other's
//! optimistic updates) through the [`ListenerRegistry`]. Listeners are
//! plain callbacks invoked synchronously after every successful state
//! change, in registration order.
//!
//! # Usage
//!
//! ```
//! use phyn_lib::subscription::ListenerRegistry;
//!
//! let registry = ListenerRegistry::new();
//! let id = registry.add(|| println!("device refreshed"));
//!
//! registry.notify();
//!
//! // Later, unsubscribe
//! registry.remove(id);
//! ```

mod callback;

pub use callback::{ListenerId, ListenerRegistry};
