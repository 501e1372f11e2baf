// ABOUTME: Application constants for WHOOP endpoints, protocol versions, and limits
// ABOUTME: Centralizes environment variable names, tool names, and default values
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Application constants and configuration values.

/// Environment variable names recognized by `ServerConfig::from_env()`
pub mod env_vars {
    /// WHOOP OAuth application client id (required)
    pub const WHOOP_CLIENT_ID: &str = "WHOOP_CLIENT_ID";
    /// WHOOP OAuth application client secret (required)
    pub const WHOOP_CLIENT_SECRET: &str = "WHOOP_CLIENT_SECRET";
    /// OAuth redirect URI registered with WHOOP
    pub const WHOOP_REDIRECT_URI: &str = "WHOOP_REDIRECT_URI";
    /// Shared secret expected in the `X-API-Key` header
    pub const API_SECRET_KEY: &str = "API_SECRET_KEY";
    /// HTTP listen port
    pub const PORT: &str = "PORT";
    /// HTTP bind address
    pub const HOST: &str = "HOST";
    /// Deployment environment: development, production, testing
    pub const ENVIRONMENT: &str = "ENVIRONMENT";
    /// Log level when `RUST_LOG` is not set
    pub const LOG_LEVEL: &str = "LOG_LEVEL";
    /// Total timeout for upstream HTTP calls, in seconds
    pub const HTTP_TIMEOUT_SECS: &str = "HTTP_TIMEOUT_SECS";
    /// Seconds before token expiry at which a proactive refresh is triggered
    pub const TOKEN_REFRESH_WINDOW_SECS: &str = "TOKEN_REFRESH_WINDOW_SECS";
    /// Requests allowed per client IP per rate-limit window
    pub const RATE_LIMIT_REQUESTS: &str = "RATE_LIMIT_REQUESTS";
    /// Rate-limit window length in seconds
    pub const RATE_LIMIT_WINDOW_SECS: &str = "RATE_LIMIT_WINDOW_SECS";
}

/// WHOOP API endpoints and OAuth parameters
pub mod whoop {
    /// Base URL of the WHOOP developer API
    pub const API_BASE: &str = "https://api.prod.whoop.com/developer";
    /// WHOOP OAuth2 authorization endpoint
    pub const AUTH_URL: &str = "https://api.prod.whoop.com/oauth/oauth2/auth";
    /// WHOOP OAuth2 token endpoint
    pub const TOKEN_URL: &str = "https://api.prod.whoop.com/oauth/oauth2/token";
    /// WHOOP OAuth2 revocation endpoint
    pub const REVOKE_URL: &str = "https://api.prod.whoop.com/oauth/oauth2/revoke";
    /// Scopes requested during authorization
    pub const DEFAULT_SCOPES: &str =
        "read:recovery read:cycles read:sleep read:workout read:profile read:body_measurement";
}

/// Network defaults
pub mod defaults {
    /// Default HTTP listen port
    pub const HTTP_PORT: u16 = 8080;
    /// Default bind address
    pub const HOST: &str = "127.0.0.1";
    /// Default upstream request timeout in seconds
    pub const HTTP_TIMEOUT_SECS: u64 = 10;
    /// Default connect timeout in seconds
    pub const CONNECT_TIMEOUT_SECS: u64 = 10;
    /// Default refresh-safety window in seconds
    pub const TOKEN_REFRESH_WINDOW_SECS: u64 = 300;
    /// Default per-IP request budget per window
    pub const RATE_LIMIT_REQUESTS: u32 = 60;
    /// Default rate-limit window in seconds
    pub const RATE_LIMIT_WINDOW_SECS: u64 = 60;
}

/// Bounded lifetimes for short-lived artifacts
pub mod limits {
    /// Minutes an outstanding authorization state stays consumable
    pub const AUTH_STATE_EXPIRY_MINUTES: i64 = 10;
    /// Largest inbound WebSocket frame accepted, in bytes
    pub const MAX_WS_MESSAGE_BYTES: usize = 10 * 1024;
    /// Recent workouts scanned when building the sports mapping
    pub const SPORT_DISCOVERY_WORKOUT_LIMIT: u32 = 25;
}

/// MCP protocol constants
pub mod protocol {
    /// MCP protocol revision implemented by this server
    pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";
    /// Server name reported during initialization
    pub const SERVER_NAME: &str = "whoop-mcp";
    /// Server version reported during initialization
    pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
}

/// Header carrying the shared API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Constant principal key for the single-operator deployment
pub const DEFAULT_PRINCIPAL: &str = "default";

/// MCP tool names
pub mod tools {
    /// Begin the WHOOP OAuth flow
    pub const CONNECT_TO_WHOOP: &str = "connect_to_whoop";
    /// Report token presence and expiry
    pub const GET_CONNECTION_STATUS: &str = "get_connection_status";
    /// Revoke and forget the stored token
    pub const DISCONNECT_WHOOP: &str = "disconnect_whoop";
    /// Fetch sleep data
    pub const GET_SLEEP_DATA: &str = "get_sleep_data";
    /// Fetch recovery data
    pub const GET_RECOVERY_DATA: &str = "get_recovery_data";
    /// Fetch workout data
    pub const GET_WORKOUT_DATA: &str = "get_workout_data";
    /// Fetch daily cycle data
    pub const GET_CYCLE_DATA: &str = "get_cycle_data";
    /// Fetch the user profile
    pub const GET_PROFILE_DATA: &str = "get_profile_data";
    /// Fetch body measurements
    pub const GET_BODY_MEASUREMENT_DATA: &str = "get_body_measurement_data";
    /// List sport ids from recent workout history
    pub const GET_SPORTS_MAPPING: &str = "get_sports_mapping";
    /// Search the community sport-id mapping
    pub const SEARCH_WHOOP_SPORTS: &str = "search_whoop_sports";
}

/// JSON field names shared between tool schemas and argument parsing
pub mod json_fields {
    /// Optional YYYY-MM-DD day selector
    pub const DATE: &str = "date";
    /// Optional workout identifier
    pub const WORKOUT_ID: &str = "workout_id";
    /// Sport search term
    pub const QUERY: &str = "query";
}
