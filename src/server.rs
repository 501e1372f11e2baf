// ABOUTME: Server resource wiring and the HTTP serve loop with graceful shutdown
// ABOUTME: Dependency injection bundle shared by routes, transports, and tests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Server Assembly
//!
//! [`ServerResources`] bundles the injectable components (config, OAuth
//! manager, tool router) so routes and tests share one wiring point, and
//! [`WhoopMcpServer`] runs the HTTP listener.

use crate::config::ServerConfig;
use crate::constants::defaults;
use crate::mcp::ToolRouter;
use crate::oauth::{refresh_window_from_secs, OAuthManager, TokenCache, WhoopOAuthClient};
use crate::providers::http_client::initialize_shared_client;
use crate::providers::WhoopApiClient;
use crate::routes::build_router;
use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// Injectable components shared across the server
pub struct ServerResources {
    /// Immutable configuration
    pub config: ServerConfig,
    /// OAuth token lifecycle manager
    pub oauth: Arc<OAuthManager>,
    /// Token-aware MCP tool router
    pub tool_router: Arc<ToolRouter>,
}

impl ServerResources {
    /// Bundle pre-built components (used by tests to inject mocks)
    #[must_use]
    pub fn new(
        config: ServerConfig,
        oauth: Arc<OAuthManager>,
        tool_router: Arc<ToolRouter>,
    ) -> Self {
        Self {
            config,
            oauth,
            tool_router,
        }
    }

    /// Wire the production components from configuration
    #[must_use]
    pub fn from_config(config: ServerConfig) -> Self {
        initialize_shared_client(config.http_timeout_secs, defaults::CONNECT_TIMEOUT_SECS);

        let cache = Arc::new(TokenCache::new());
        let exchanger = Arc::new(WhoopOAuthClient::new(config.whoop.clone()));
        let oauth = Arc::new(OAuthManager::new(
            exchanger,
            cache,
            refresh_window_from_secs(config.token_refresh_window_secs),
        ));
        let api = Arc::new(WhoopApiClient::new());
        let tool_router = Arc::new(ToolRouter::new(Arc::clone(&oauth), api));

        Self {
            config,
            oauth,
            tool_router,
        }
    }
}

/// The WHOOP MCP server
pub struct WhoopMcpServer {
    resources: Arc<ServerResources>,
}

impl WhoopMcpServer {
    /// Create a server around shared resources
    #[must_use]
    pub fn new(resources: Arc<ServerResources>) -> Self {
        Self { resources }
    }

    /// Bind the listener and serve until a shutdown signal arrives.
    ///
    /// # Errors
    ///
    /// Returns an error when the listen address cannot be bound or the
    /// accept loop fails.
    pub async fn run(&self) -> Result<()> {
        let router = build_router(&self.resources);
        let addr = format!(
            "{}:{}",
            self.resources.config.host, self.resources.config.port
        );

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        info!("WHOOP MCP server listening on {addr}");

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        Ok(())
    }
}

/// Resolve when the process receives ctrl-c
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
