// ABOUTME: API key gate validating the X-API-Key header on every protected request
// ABOUTME: Uses constant-time comparison so near-miss keys are indistinguishable from garbage
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Auth Gate
//!
//! Every protected route passes through [`ApiKeyGate`] before any tool logic
//! runs. The supplied key is compared against the configured secret with
//! `subtle::ConstantTimeEq`; failures are terminal for the request and carry
//! no hint of how close the key was.

use crate::constants::API_KEY_HEADER;
use crate::errors::{AppError, AppResult};
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http::HeaderMap;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::warn;

/// Shared-secret gate for inbound requests
#[derive(Clone)]
pub struct ApiKeyGate {
    key: String,
}

impl ApiKeyGate {
    /// Create a gate around the configured API key
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// Authorize a request from its headers.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` when the `X-API-Key` header is missing,
    /// unreadable, or does not match the configured key. The error message
    /// is identical for every failure mode.
    pub fn authorize(&self, headers: &HeaderMap) -> AppResult<()> {
        let supplied = headers
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();

        if supplied.as_bytes().ct_eq(self.key.as_bytes()).into() {
            Ok(())
        } else {
            // No detail about the supplied value: near-miss and wildly-wrong
            // keys must produce identical responses.
            Err(AppError::unauthorized(
                "Unauthorized. Valid X-API-Key header required.",
            ))
        }
    }
}

/// Axum middleware enforcing the gate on protected routes
pub async fn require_api_key(
    State(gate): State<Arc<ApiKeyGate>>,
    request: Request,
    next: Next,
) -> Response {
    match gate.authorize(request.headers()) {
        Ok(()) => next.run(request).await,
        Err(err) => {
            warn!(
                "Unauthorized access attempt to {}",
                request.uri().path()
            );
            err.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn headers_with_key(key: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, HeaderValue::from_str(key).unwrap());
        headers
    }

    #[test]
    fn test_valid_key_passes() {
        let gate = ApiKeyGate::new("s3cret-key");
        assert!(gate.authorize(&headers_with_key("s3cret-key")).is_ok());
    }

    #[test]
    fn test_missing_header_rejected() {
        let gate = ApiKeyGate::new("s3cret-key");
        let err = gate.authorize(&HeaderMap::new()).unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::Unauthorized);
    }

    #[test]
    fn test_near_miss_and_garbage_rejected_identically() {
        let gate = ApiKeyGate::new("s3cret-key");
        let near = gate.authorize(&headers_with_key("s3cret-keX")).unwrap_err();
        let far = gate.authorize(&headers_with_key("zzz")).unwrap_err();
        assert_eq!(near.code, far.code);
        assert_eq!(near.message, far.message);
    }
}
