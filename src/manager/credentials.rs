// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Account credentials and config-flow validation.

use crate::api::ApiConfig;
use crate::error::{Error, Result};

/// The integration's entire configuration surface: one username and one
/// password, collected once at setup time.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Account username (the Phyn login email).
    pub username: String,
    /// Account password.
    pub password: String,
}

impl Credentials {
    /// Creates credentials for the given account.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Builds an API configuration from these credentials.
    #[must_use]
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig::new(&self.username, &self.password)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Validates credentials the way a config flow does.
///
/// Authenticates and lists the account's homes; on success returns the
/// first home's alias as the suggested entry title.
///
/// # Errors
///
/// Returns [`Error::CannotConnect`] when authentication or discovery
/// fails (the caller shows a form error and creates no entry), or
/// [`Error::NoHomes`] for an account without homes.
pub async fn validate_credentials(config: ApiConfig) -> Result<String> {
    let username = config.username().to_string();

    let api = match config.connect().await {
        Ok(api) => api,
        Err(err) => {
            tracing::error!(error = %err, "Error connecting to the Phyn API");
            return Err(Error::CannotConnect);
        }
    };

    let homes = match api.get_homes(&username).await {
        Ok(homes) => homes,
        Err(err) => {
            tracing::error!(error = %err, "Error listing Phyn homes");
            return Err(Error::CannotConnect);
        }
    };

    homes
        .first()
        .map(|home| home.alias_name.clone())
        .ok_or(Error::NoHomes)
}
