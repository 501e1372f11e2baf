// ABOUTME: Unified error handling with stable error kinds and HTTP/JSON-RPC mapping
// ABOUTME: Defines the request-level error taxonomy shared by routes, gate, and router
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Unified Error Handling
//!
//! Centralized error types for the WHOOP MCP server. Every error carries a
//! stable [`ErrorCode`] that serializes to a fixed kind string, maps to an
//! HTTP status for REST surfaces, and maps to a JSON-RPC error code for the
//! MCP transports. Raw upstream bodies and secrets never travel through
//! these types.

use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Stable error kinds surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    /// Fatal configuration problem; only produced during startup
    #[serde(rename = "CONFIG_ERROR")]
    ConfigError,
    /// Bad or missing API key; terminal for the request
    #[serde(rename = "UNAUTHORIZED")]
    Unauthorized,
    /// No usable upstream token; the caller must complete the OAuth flow
    #[serde(rename = "NOT_AUTHENTICATED")]
    NotAuthenticated,
    /// Authorization state absent, expired, or already consumed
    #[serde(rename = "INVALID_STATE")]
    InvalidState,
    /// The authorization server rejected the code exchange
    #[serde(rename = "AUTHORIZATION_DENIED")]
    AuthorizationDenied,
    /// The upstream revoked consent; re-authentication required
    #[serde(rename = "REFRESH_REVOKED")]
    RefreshRevoked,
    /// Transient upstream network/5xx failure; caller may retry with backoff
    #[serde(rename = "UPSTREAM_UNAVAILABLE")]
    UpstreamUnavailable,
    /// Upstream 4xx other than auth; surfaced with mapped status
    #[serde(rename = "UPSTREAM_REJECTED")]
    UpstreamRejected,
    /// Per-IP request budget exhausted
    #[serde(rename = "RATE_LIMITED")]
    RateLimited,
    /// Malformed tool arguments or request payload
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput,
    /// Unexpected internal failure
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError,
}

impl ErrorCode {
    /// HTTP status code for this error on REST surfaces
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::InvalidState | Self::AuthorizationDenied | Self::InvalidInput => 400,
            Self::Unauthorized => 401,
            Self::NotAuthenticated | Self::RefreshRevoked => 403,
            Self::RateLimited => 429,
            Self::UpstreamUnavailable | Self::UpstreamRejected => 502,
            Self::ConfigError | Self::InternalError => 500,
        }
    }

    /// JSON-RPC error code used when this error crosses the MCP boundary
    #[must_use]
    pub const fn jsonrpc_code(self) -> i32 {
        match self {
            Self::InvalidInput => crate::jsonrpc::error_codes::INVALID_PARAMS,
            Self::ConfigError | Self::InternalError => {
                crate::jsonrpc::error_codes::INTERNAL_ERROR
            }
            // Domain errors live in the implementation-defined server range
            Self::Unauthorized => -32001,
            Self::NotAuthenticated => -32002,
            Self::InvalidState => -32003,
            Self::AuthorizationDenied => -32004,
            Self::RefreshRevoked => -32005,
            Self::UpstreamUnavailable => -32010,
            Self::UpstreamRejected => -32011,
            Self::RateLimited => -32012,
        }
    }

    /// Stable kind string, identical to the serde representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConfigError => "CONFIG_ERROR",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::NotAuthenticated => "NOT_AUTHENTICATED",
            Self::InvalidState => "INVALID_STATE",
            Self::AuthorizationDenied => "AUTHORIZATION_DENIED",
            Self::RefreshRevoked => "REFRESH_REVOKED",
            Self::UpstreamUnavailable => "UPSTREAM_UNAVAILABLE",
            Self::UpstreamRejected => "UPSTREAM_REJECTED",
            Self::RateLimited => "RATE_LIMITED",
            Self::InvalidInput => "INVALID_INPUT",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }
}

/// Unified application error
#[derive(Debug, Error)]
pub struct AppError {
    /// Stable error kind
    pub code: ErrorCode,
    /// Human-readable message; never contains tokens or secrets
    pub message: String,
    /// Source error for chaining
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new error with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Attach a source error for chaining
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// HTTP status code for this error
    #[must_use]
    pub fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// Bad or missing API key
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// No upstream token for the principal
    pub fn not_authenticated(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotAuthenticated, message)
    }

    /// Configuration problem
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Malformed input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Unexpected internal failure
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

/// Result alias for fallible application operations
pub type AppResult<T> = Result<T, AppError>;

/// Wire format for REST error responses
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error payload
    pub error: ErrorResponseDetails,
}

/// Error payload carried by [`ErrorResponse`]
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponseDetails {
    /// Stable kind string
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
}

impl From<&AppError> for ErrorResponse {
    fn from(error: &AppError) -> Self {
        Self {
            error: ErrorResponseDetails {
                code: error.code,
                message: error.message.clone(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = http::StatusCode::from_u16(self.http_status())
            .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::Json(ErrorResponse::from(&self));
        (status, body).into_response()
    }
}
