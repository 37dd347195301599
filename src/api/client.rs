// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Authenticated HTTP client implementation.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::error::{ApiError, Error, Result};
use crate::state::{ConsumptionReport, DeviceState, Home};

// ============================================================================
// ApiConfig - Connection parameters for the Phyn cloud
// ============================================================================

/// Configuration for connecting to the Phyn cloud API.
///
/// # Examples
///
/// ```
/// use phyn_lib::api::ApiConfig;
/// use std::time::Duration;
///
/// // Production endpoint
/// let config = ApiConfig::new("user@example.com", "password");
///
/// // Against a different endpoint, e.g. a test double
/// let config = ApiConfig::new("user@example.com", "password")
///     .with_base_url("http://127.0.0.1:8080")
///     .with_timeout(Duration::from_secs(5));
/// ```
#[derive(Clone)]
pub struct ApiConfig {
    username: String,
    password: String,
    base_url: String,
    timeout: Duration,
}

impl ApiConfig {
    /// Production API endpoint.
    pub const DEFAULT_BASE_URL: &'static str = "https://api.phyn.com";
    /// Default per-request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a configuration for the given account credentials.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Overrides the API base URL.
    ///
    /// A trailing slash is stripped so endpoint paths can be appended
    /// directly.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let mut url = base_url.into();
        while url.ends_with('/') {
            url.pop();
        }
        self.base_url = url;
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the account username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the API base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Authenticates against the API and returns a ready client.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::AuthenticationFailed`] for rejected credentials
    /// and a request error for transport failures.
    pub async fn connect(self) -> Result<ApiClient> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ApiError::InvalidAddress(self.base_url).into());
        }

        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(ApiError::Http)?;

        let token = login(&client, &self.base_url, &self.username, &self.password).await?;

        Ok(ApiClient {
            base_url: self.base_url,
            client,
            token,
        })
    }
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("username", &self.username)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// ApiClient - Authenticated vendor API client
// ============================================================================

/// Token returned by the login endpoint.
#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

async fn login(client: &Client, base_url: &str, username: &str, password: &str) -> Result<String> {
    let url = format!("{base_url}/users/login");

    tracing::debug!(url = %url, username = %username, "Authenticating with Phyn cloud");

    let response = client
        .post(&url)
        .json(&serde_json::json!({
            "email": username,
            "password": password,
        }))
        .send()
        .await
        .map_err(ApiError::Http)?;

    if response.status() == reqwest::StatusCode::UNAUTHORIZED
        || response.status() == reqwest::StatusCode::FORBIDDEN
    {
        return Err(ApiError::AuthenticationFailed.into());
    }

    if !response.status().is_success() {
        return Err(status_error(&response).into());
    }

    let body: LoginResponse = response.json().await.map_err(ApiError::Http)?;
    Ok(body.token)
}

fn status_error(response: &reqwest::Response) -> ApiError {
    ApiError::RequestFailed {
        status: response.status().as_u16(),
        message: response
            .status()
            .canonical_reason()
            .unwrap_or("Unknown")
            .to_string(),
    }
}

/// Authenticated client for the Phyn cloud API.
///
/// The underlying `reqwest::Client` holds a shared connection pool and is
/// safe to use concurrently from any number of device synchronizers.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: Client,
    token: String,
}

impl ApiClient {
    /// Returns the API base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds the URL for an endpoint path.
    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Issues an authenticated GET and parses the JSON response body.
    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);

        tracing::debug!(url = %url, "Sending API request");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(ApiError::Http)?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ApiError::AuthenticationFailed.into());
        }

        if !response.status().is_success() {
            return Err(status_error(&response).into());
        }

        let body = response.text().await.map_err(ApiError::Http)?;

        tracing::debug!(body = %body, "Received API response");

        serde_json::from_str(&body).map_err(|err| Error::Parse(err.into()))
    }

    /// Issues an authenticated POST with an empty body.
    async fn post(&self, path: &str) -> Result<()> {
        let url = self.url(path);

        tracing::debug!(url = %url, "Sending API command");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(ApiError::Http)?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ApiError::AuthenticationFailed.into());
        }

        if !response.status().is_success() {
            return Err(status_error(&response).into());
        }

        Ok(())
    }

    // =========================================================================
    // Discovery
    // =========================================================================

    /// Lists the homes registered to the account.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the payload cannot be parsed.
    pub async fn get_homes(&self, username: &str) -> Result<Vec<Home>> {
        let path = format!("/homes?user_id={}", urlencoding::encode(username));
        self.get_json(&path).await
    }

    // =========================================================================
    // Device state
    // =========================================================================

    /// Fetches the current state snapshot for a device.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the payload cannot be parsed.
    pub async fn get_state(&self, device_id: &str) -> Result<DeviceState> {
        let path = format!("/devices/{}/state", urlencoding::encode(device_id));
        self.get_json(&path).await
    }

    /// Fetches the consumption report for a device and calendar day.
    ///
    /// The `duration` key uses the vendor's `YYYY/MM/DD` format; the
    /// slashes are percent-encoded into the query string.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the payload cannot be parsed.
    pub async fn get_consumption(
        &self,
        device_id: &str,
        duration: &str,
    ) -> Result<ConsumptionReport> {
        let path = format!(
            "/devices/{}/consumption?duration={}",
            urlencoding::encode(device_id),
            urlencoding::encode(duration)
        );
        self.get_json(&path).await
    }

    // =========================================================================
    // Valve and away-mode commands
    // =========================================================================

    /// Opens the shutoff valve.
    ///
    /// # Errors
    ///
    /// Returns error if the command fails; the valve state is unchanged.
    pub async fn open_valve(&self, device_id: &str) -> Result<()> {
        let path = format!("/devices/{}/sov/Open", urlencoding::encode(device_id));
        self.post(&path).await
    }

    /// Closes the shutoff valve.
    ///
    /// # Errors
    ///
    /// Returns error if the command fails; the valve state is unchanged.
    pub async fn close_valve(&self, device_id: &str) -> Result<()> {
        let path = format!("/devices/{}/sov/Close", urlencoding::encode(device_id));
        self.post(&path).await
    }

    /// Enables away mode.
    ///
    /// # Errors
    ///
    /// Returns error if the command fails; the mode is unchanged.
    pub async fn enable_away_mode(&self, device_id: &str) -> Result<()> {
        let path = format!("/devices/{}/away_mode/enable", urlencoding::encode(device_id));
        self.post(&path).await
    }

    /// Disables away mode.
    ///
    /// # Errors
    ///
    /// Returns error if the command fails; the mode is unchanged.
    pub async fn disable_away_mode(&self, device_id: &str) -> Result<()> {
        let path = format!(
            "/devices/{}/away_mode/disable",
            urlencoding::encode(device_id)
        );
        self.post(&path).await
    }
}

/// Client wired to an unroutable local endpoint, for unit tests that
/// exercise failure paths without a server.
#[cfg(test)]
pub(crate) fn test_client() -> ApiClient {
    ApiClient {
        base_url: "http://127.0.0.1:9".to_string(),
        client: Client::new(),
        token: "test-token".to_string(),
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
