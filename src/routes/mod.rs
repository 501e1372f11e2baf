// ABOUTME: HTTP route assembly: public endpoints, gated endpoints, and middleware layering
// ABOUTME: The API key gate wraps only the protected subset; hardening layers wrap everything
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! HTTP routes.
//!
//! Public surface: liveness, the service descriptor, and the OAuth begin and
//! callback endpoints (the authorization server redirects there without our
//! API key). Everything else sits behind [`crate::gate::ApiKeyGate`].

pub mod health;
pub mod mcp;
pub mod oauth;

use crate::config::Environment;
use crate::gate::{require_api_key, ApiKeyGate};
use crate::middleware::{rate_limit, RateLimiter};
use crate::server::ServerResources;
use axum::Router;
use http::header::{HeaderName, HeaderValue};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

/// Security headers applied to every response
const SECURITY_HEADERS: &[(&str, &str)] = &[
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("x-xss-protection", "1; mode=block"),
    ("strict-transport-security", "max-age=31536000; includeSubDomains"),
    ("content-security-policy", "default-src 'self'; frame-ancestors 'none'"),
    ("referrer-policy", "strict-origin-when-cross-origin"),
];

/// Build the complete application router
pub fn build_router(resources: &Arc<ServerResources>) -> Router {
    let gate = Arc::new(ApiKeyGate::new(resources.config.api_key.clone()));
    let limiter = Arc::new(RateLimiter::new(resources.config.rate_limit));

    let protected = Router::new()
        .merge(mcp::McpRoutes::routes(Arc::clone(resources)))
        .merge(oauth::OAuthRoutes::protected_routes(Arc::clone(resources)))
        .layer(axum::middleware::from_fn_with_state(gate, require_api_key));

    let mut router = Router::new()
        .merge(health::HealthRoutes::routes())
        .merge(oauth::OAuthRoutes::public_routes(Arc::clone(resources)))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(resources.config.environment));

    for &(name, value) in SECURITY_HEADERS {
        router = router.layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        ));
    }

    router.layer(axum::middleware::from_fn_with_state(limiter, rate_limit))
}

/// CORS policy: permissive in development, locked to local HTTPS origins in
/// production
fn cors_layer(environment: Environment) -> CorsLayer {
    let origin = if environment.is_production() {
        AllowOrigin::predicate(|origin, _| {
            origin.to_str().is_ok_and(|o| {
                o.starts_with("https://localhost") || o.starts_with("https://127.0.0.1")
            })
        })
    } else {
        AllowOrigin::from(Any)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([http::Method::GET, http::Method::POST, http::Method::OPTIONS])
        .allow_headers([
            HeaderName::from_static("x-api-key"),
            http::header::CONTENT_TYPE,
            http::header::AUTHORIZATION,
        ])
}
