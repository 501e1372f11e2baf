// ABOUTME: Main library entry point for the WHOOP MCP server
// ABOUTME: Bridges the WHOOP fitness API to the Model Context Protocol over HTTP and WebSocket
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![deny(unsafe_code)]

//! # WHOOP MCP Server
//!
//! A Model Context Protocol (MCP) server exposing WHOOP fitness data to AI
//! assistants. The server manages the complete OAuth2 token lifecycle against
//! the WHOOP API (authorization, persistence, single-flight refresh,
//! revocation) and routes API-key-gated MCP tool calls to authenticated
//! upstream requests.
//!
//! ## Architecture
//!
//! - **`config`**: environment-only configuration with fail-fast validation
//! - **`gate`**: constant-time API key check in front of protected routes
//! - **`oauth`**: token records, cache, WHOOP exchanger, and the manager
//!   owning authorization state and the refresh path
//! - **`providers`**: the upstream WHOOP data API client
//! - **`mcp`**: protocol schema, core handlers, and the token-aware router
//! - **`routes`**: axum HTTP surface (OAuth flow, MCP over HTTP/WebSocket)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use whoop_mcp_server::config::ServerConfig;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = ServerConfig::from_env()?;
//! println!("WHOOP MCP server configured: {}", config.summary());
//! # Ok(())
//! # }
//! ```

/// Environment-based configuration management
pub mod config;

/// Application constants and configuration values
pub mod constants;

/// Unified error handling with stable error kinds
pub mod errors;

/// Human-readable rendering of WHOOP payloads
pub mod formatters;

/// API key gate for protected routes
pub mod gate;

/// JSON-RPC 2.0 envelope shared by the MCP transports
pub mod jsonrpc;

/// Logging initialization
pub mod logging;

/// Model Context Protocol implementation
pub mod mcp;

/// HTTP middleware (rate limiting)
pub mod middleware;

/// OAuth token lifecycle management
pub mod oauth;

/// Upstream WHOOP API access
pub mod providers;

/// HTTP route assembly
pub mod routes;

/// Server resource wiring and serve loop
pub mod server;
