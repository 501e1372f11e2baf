// ABOUTME: Upstream WHOOP data API access and shared HTTP client infrastructure
// ABOUTME: Defines the provider error taxonomy and the WhoopApi seam used by the router
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Upstream WHOOP API access.

pub mod http_client;
pub mod whoop;

pub use whoop::{WhoopApi, WhoopApiClient};

use crate::errors::{AppError, ErrorCode};

/// Failures talking to the WHOOP data API
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    /// WHOOP rejected the bearer token (HTTP 401)
    #[error("WHOOP rejected the access token")]
    Unauthorized,

    /// WHOOP rejected the request itself (non-auth 4xx)
    #[error("WHOOP rejected the request (HTTP {status})")]
    Rejected {
        /// Upstream status code
        status: u16,
    },

    /// Network failure or upstream 5xx
    #[error("WHOOP unavailable: {0}")]
    Unavailable(String),
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        let code = match err {
            ProviderError::Unauthorized => ErrorCode::NotAuthenticated,
            ProviderError::Rejected { .. } => ErrorCode::UpstreamRejected,
            ProviderError::Unavailable(_) => ErrorCode::UpstreamUnavailable,
        };
        Self::new(code, err.to_string())
    }
}
