// ABOUTME: HTTP middleware for per-IP rate limiting and client identification
// ABOUTME: Sliding-window limiter; excess requests get 429 before any handler runs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # HTTP Middleware
//!
//! Per-client-IP sliding-window rate limiting applied in front of every
//! route. Proxied deployments are identified through `X-Forwarded-For`;
//! direct connections fall back to the socket peer address.

use crate::config::RateLimitConfig;
use crate::errors::{AppError, ErrorCode};
use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

/// Sliding-window request counter keyed by client IP
pub struct RateLimiter {
    requests: usize,
    window: Duration,
    hits: DashMap<String, Vec<Instant>>,
}

impl RateLimiter {
    /// Create a limiter from configuration
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            requests: config.requests as usize,
            window: Duration::from_secs(config.window_secs),
            hits: DashMap::new(),
        }
    }

    /// Record a request for the client; `false` means over budget
    #[must_use]
    pub fn check(&self, client: &str) -> bool {
        let now = Instant::now();
        let mut entry = self.hits.entry(client.to_owned()).or_default();

        entry.retain(|hit| now.duration_since(*hit) < self.window);
        if entry.len() >= self.requests {
            return false;
        }
        entry.push(now);
        true
    }
}

/// Client IP from `X-Forwarded-For`, falling back to the socket peer
fn client_ip(request: &Request) -> String {
    if let Some(forwarded) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_owned();
            }
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(|| "unknown".to_owned(), |info| info.0.ip().to_string())
}

/// Axum middleware enforcing the per-IP budget
pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_ip(&request);

    if limiter.check(&client) {
        next.run(request).await
    } else {
        warn!("Rate limit exceeded for {client}");
        AppError::new(
            ErrorCode::RateLimited,
            "Rate limit exceeded. Please try again later.",
        )
        .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(requests: u32, window_secs: u64) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            requests,
            window_secs,
        })
    }

    #[test]
    fn test_allows_up_to_budget() {
        let limiter = limiter(3, 60);
        assert!(limiter.check("1.2.3.4"));
        assert!(limiter.check("1.2.3.4"));
        assert!(limiter.check("1.2.3.4"));
        assert!(!limiter.check("1.2.3.4"));
    }

    #[test]
    fn test_clients_have_independent_budgets() {
        let limiter = limiter(1, 60);
        assert!(limiter.check("1.2.3.4"));
        assert!(!limiter.check("1.2.3.4"));
        assert!(limiter.check("5.6.7.8"));
    }

    #[test]
    fn test_window_expiry_restores_budget() {
        let limiter = limiter(1, 0);
        assert!(limiter.check("1.2.3.4"));
        // A zero-length window expires immediately
        assert!(limiter.check("1.2.3.4"));
    }
}
