// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the Phyn library.
//!
//! This module provides the error hierarchy for handling failures across
//! the library: vendor API communication, JSON parsing, refresh cycles,
//! and integration setup.

use thiserror::Error;

/// The main error type for this library.
///
/// This enum encompasses all possible errors that can occur when talking
/// to the Phyn cloud service or operating on device entities.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during an API request.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Error occurred while parsing an API response.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// A refresh cycle failed; the previous snapshot remains authoritative.
    #[error("update failed: {0}")]
    UpdateFailed(String),

    /// Initial setup could not reach the vendor service. The caller should
    /// retry setup later rather than treating this as permanent.
    #[error("integration not ready: {0}")]
    NotReady(String),

    /// The provided credentials could not be validated.
    #[error("cannot connect with the provided credentials")]
    CannotConnect,

    /// No homes are registered for the account.
    #[error("no homes found for account")]
    NoHomes,
}

/// Errors related to communication with the Phyn cloud API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API rejected the access token or credentials.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// The API answered with a non-success status code.
    #[error("request failed with HTTP {status}: {message}")]
    RequestFailed {
        /// HTTP status code returned by the API.
        status: u16,
        /// Reason phrase or response excerpt.
        message: String,
    },

    /// The operation exceeded its wall-clock deadline.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// Invalid base URL or endpoint address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

/// Errors related to parsing Phyn API responses.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Expected field is missing from the response.
    #[error("missing field in response: {0}")]
    MissingField(String),

    /// Unexpected response format.
    #[error("unexpected response format: {0}")]
    UnexpectedFormat(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
