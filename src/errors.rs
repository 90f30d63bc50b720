// ABOUTME: Unified error type for the support relay with error codes and HTTP mapping
// ABOUTME: Converts relay, upstream, and configuration failures into widget-facing JSON bodies
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Unified Error Handling
//!
//! Every fallible operation in the relay returns [`AppError`]. The error carries an
//! [`ErrorCode`] that decides the HTTP status and a human-readable message.
//!
//! The widget only distinguishes three outcomes, so the HTTP mapping is coarse:
//! validation problems are `400`, a wrong method is `405`, and everything else
//! (upstream failures, failed or stalled runs, configuration) is `500` with the
//! detail carried in the `error` field of the body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Message returned in the body of every `500` response
pub const INTERNAL_SERVER_ERROR_MESSAGE: &str = "Internal Server Error";

/// Standard error codes used throughout the relay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Validation
    /// The request body could not be interpreted
    InvalidInput,
    /// A required request field is absent or empty
    MissingRequiredField,
    /// The endpoint does not support the request method
    MethodNotAllowed,

    // Assistant runs
    /// The assistant run ended in a failure status
    RunFailed,
    /// The assistant run did not settle within the poll budget
    RunTimedOut,

    // External services
    /// The assistant service returned an error
    ExternalServiceError,
    /// The assistant service could not be reached
    ExternalServiceUnavailable,
    /// The assistant service rejected our credentials
    ExternalAuthFailed,
    /// The assistant service is rate limiting us
    ExternalRateLimited,

    // Configuration
    /// Configuration could not be applied
    ConfigError,
    /// A required configuration value is missing
    ConfigMissing,
    /// A configuration value could not be parsed
    ConfigInvalid,

    // Internal
    /// Unexpected internal failure
    InternalError,
    /// Ticket storage failed
    DatabaseError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(self) -> StatusCode {
        match self {
            Self::InvalidInput | Self::MissingRequiredField => StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::RunFailed
            | Self::RunTimedOut
            | Self::ExternalServiceError
            | Self::ExternalServiceUnavailable
            | Self::ExternalAuthFailed
            | Self::ExternalRateLimited
            | Self::ConfigError
            | Self::ConfigMissing
            | Self::ConfigInvalid
            | Self::InternalError
            | Self::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get a short description of this error
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::InvalidInput => "The provided input is invalid",
            Self::MissingRequiredField => "A required field is missing from the request",
            Self::MethodNotAllowed => "The request method is not allowed",
            Self::RunFailed => "The assistant run failed",
            Self::RunTimedOut => "The assistant run did not complete in time",
            Self::ExternalServiceError => "An external service encountered an error",
            Self::ExternalServiceUnavailable => "An external service is currently unavailable",
            Self::ExternalAuthFailed => "Authentication with external service failed",
            Self::ExternalRateLimited => "External service rate limit exceeded",
            Self::ConfigError => "Configuration error encountered",
            Self::ConfigMissing => "Required configuration is missing",
            Self::ConfigInvalid => "Configuration is invalid",
            Self::InternalError => "An internal server error occurred",
            Self::DatabaseError => "Database operation failed",
        }
    }
}

/// Unified error type for the relay
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Add a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    /// A required field is missing
    pub fn missing_field(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MissingRequiredField, message)
    }

    /// Invalid input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Method not allowed on this endpoint
    pub fn method_not_allowed() -> Self {
        Self::new(ErrorCode::MethodNotAllowed, "Method Not Allowed")
    }

    /// Run reached a terminal failure status
    pub fn run_failed(status: impl fmt::Display, detail: Option<&str>) -> Self {
        let message = detail.map_or_else(
            || format!("Run failed with status: {status}"),
            |detail| format!("Run failed with status: {status} ({detail})"),
        );
        Self::new(ErrorCode::RunFailed, message)
    }

    /// Run did not settle within the poll budget
    pub fn run_timed_out(run_id: &str, attempts: u32) -> Self {
        Self::new(
            ErrorCode::RunTimedOut,
            format!("Run {run_id} timed out after {attempts} status checks"),
        )
    }

    /// External service error
    pub fn external_service(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ExternalServiceError,
            format!("{}: {}", service.into(), message.into()),
        )
    }

    /// External service unreachable
    pub fn external_unavailable(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ExternalServiceUnavailable,
            format!("{}: {}", service.into(), message.into()),
        )
    }

    /// Internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Database error
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Required configuration value missing
    pub fn config_missing(variable: &str) -> Self {
        Self::new(
            ErrorCode::ConfigMissing,
            format!("{variable} environment variable is required"),
        )
    }

    /// Configuration value could not be parsed
    pub fn config_invalid(variable: &str, message: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::ConfigInvalid,
            format!("{variable} is invalid: {message}"),
        )
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// HTTP error body understood by the support widget
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short message; the fixed "Internal Server Error" for `500`s
    pub message: String,
    /// Failure detail, only present on `500`s
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&AppError> for ErrorResponse {
    fn from(error: &AppError) -> Self {
        if error.http_status().is_server_error() {
            Self {
                message: INTERNAL_SERVER_ERROR_MESSAGE.to_owned(),
                error: Some(error.message.clone()),
            }
        } else {
            Self {
                message: error.message.clone(),
                error: None,
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.http_status();
        if status.is_server_error() {
            tracing::error!(code = ?self.code, "Request failed: {}", self);
        } else {
            tracing::debug!(code = ?self.code, "Request rejected: {}", self);
        }
        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}
