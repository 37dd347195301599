// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration bootstrap: credential validation, device discovery and
//! per-entry lifecycle.
//!
//! [`setup_entry`] authenticates against the Phyn cloud, discovers every
//! device across the account's homes, builds a synchronizer plus its
//! entities for each, and starts the pollers. The returned
//! [`EntryContext`] owns all of it; dropping the context (or calling
//! [`unload`](EntryContext::unload)) stops the pollers and releases every
//! per-device resource.
//!
//! # Examples
//!
//! ```no_run
//! use phyn_lib::manager::{Credentials, setup_entry, validate_credentials};
//!
//! # async fn example() -> phyn_lib::Result<()> {
//! let credentials = Credentials::new("user@example.com", "password");
//!
//! // Config-flow style validation; returns a suggested entry title.
//! let title = validate_credentials(credentials.api_config()).await?;
//! println!("Setting up {title}");
//!
//! let entry = setup_entry(credentials.api_config()).await?;
//! for entity in entry.entities() {
//!     println!("{} -> {:?}", entity.unique_id(), entity.value());
//! }
//!
//! entry.unload();
//! # Ok(())
//! # }
//! ```

mod credentials;
mod entry;

pub use credentials::{Credentials, validate_credentials};
pub use entry::{EntryContext, EntryId, setup_entry};
