// ABOUTME: Server binary: loads configuration, wires resources, and serves
// ABOUTME: Fails fast before binding when required configuration is missing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # WHOOP MCP Server Binary
//!
//! Starts the WHOOP MCP server with OAuth token management and API-key-gated
//! MCP transports over HTTP and WebSocket.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use whoop_mcp_server::{
    config::ServerConfig,
    logging,
    server::{ServerResources, WhoopMcpServer},
};

#[derive(Parser)]
#[command(name = "whoop-mcp-server")]
#[command(about = "WHOOP MCP Server - bridge the WHOOP fitness API to MCP clients")]
struct Args {
    /// Override the HTTP port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_from_env()?;

    // Configuration failures are fatal: never start accepting requests with
    // a broken credential store
    let mut config = ServerConfig::from_env()?;
    if let Some(port) = args.port {
        config.port = port;
    }

    info!("Starting WHOOP MCP Server");
    info!("{}", config.summary());

    let resources = Arc::new(ServerResources::from_config(config));
    display_available_endpoints(&resources.config);

    let server = WhoopMcpServer::new(resources);
    if let Err(e) = server.run().await {
        error!("Server error: {e}");
        return Err(e);
    }

    Ok(())
}

/// Display the available endpoints at startup
fn display_available_endpoints(config: &ServerConfig) {
    let host = &config.host;
    let port = config.port;

    info!("=== Available Endpoints ===");
    info!("MCP Protocol:");
    info!("   HTTP Transport:  POST http://{host}:{port}/mcp");
    info!("   WebSocket:       ws://{host}:{port}/mcp/ws");
    info!("OAuth:");
    info!("   Begin Flow:      GET  http://{host}:{port}/whoop/auth");
    info!("   Callback:        GET  http://{host}:{port}/whoop/callback");
    info!("   Status:          GET  http://{host}:{port}/auth");
    info!("Discovery & Monitoring:");
    info!("   Tool List:       GET  http://{host}:{port}/tools");
    info!("   Health Check:    GET  http://{host}:{port}/health");
    info!("=== End of Endpoint List ===");
}
