// ABOUTME: Public liveness probe and service descriptor endpoints
// ABOUTME: No secrets and no cache contents; safe without an API key
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Health and service-information routes.

use crate::constants::protocol;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

/// Health and root route implementation
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create the public health and descriptor routes
    pub fn routes() -> Router {
        Router::new()
            .route("/health", get(Self::handle_health))
            .route("/", get(Self::handle_root))
    }

    /// Liveness probe
    async fn handle_health() -> impl IntoResponse {
        Json(json!({ "status": "healthy", "service": protocol::SERVER_NAME }))
    }

    /// Service descriptor with the endpoint map and security summary
    async fn handle_root() -> impl IntoResponse {
        Json(json!({
            "name": "WHOOP MCP Server",
            "version": protocol::SERVER_VERSION,
            "description": "WHOOP Model Context Protocol server",
            "security": {
                "authentication": "X-API-Key header required for protected endpoints",
                "protected_endpoints": ["/mcp", "/mcp/ws", "/auth", "/tools"],
            },
            "endpoints": {
                "health": "/health (public)",
                "oauth_start": "/whoop/auth (public)",
                "oauth_callback": "/whoop/callback (public)",
                "auth_status": "/auth (protected)",
                "tools": "/tools (protected)",
                "mcp_http": "/mcp (protected)",
                "mcp_ws": "/mcp/ws (protected)",
            },
            "usage": {
                "authentication": "Include 'X-API-Key: your-api-key' header for protected endpoints",
                "websocket": "Connect to /mcp/ws with the X-API-Key header for MCP communication",
            },
        }))
    }
}
