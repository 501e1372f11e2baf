// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Loads and validates all settings at startup; the process refuses to serve without them
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Environment-based configuration management.
//!
//! Everything the server needs comes from environment variables (optionally
//! via a `.env` file). [`ServerConfig::from_env`] fails fast on missing or
//! malformed required values so the process never starts accepting requests
//! with a broken credential store.

use crate::constants::{defaults, env_vars};
use anyhow::{bail, Context, Result};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::env;
use tracing::warn;
use url::Url;

/// Deployment environment, controlling redirect defaults and key strictness
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development; a missing API key is generated and logged
    #[default]
    Development,
    /// Production; API key and redirect URI must be configured explicitly
    Production,
    /// Test runs
    Testing,
}

impl Environment {
    /// Parse from string with fallback to development
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// OAuth client credential for the WHOOP application
#[derive(Debug, Clone)]
pub struct WhoopOAuthConfig {
    /// OAuth client id
    pub client_id: String,
    /// OAuth client secret; never logged or echoed
    pub client_secret: String,
    /// Redirect URI registered with WHOOP
    pub redirect_uri: String,
}

/// Per-IP rate limiting settings
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    /// Requests allowed per window
    pub requests: u32,
    /// Window length in seconds
    pub window_secs: u64,
}

/// Complete server configuration, immutable after startup
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    /// HTTP listen port
    pub port: u16,
    /// Deployment environment
    pub environment: Environment,
    /// WHOOP OAuth client credential
    pub whoop: WhoopOAuthConfig,
    /// Shared API key expected in `X-API-Key`
    pub api_key: String,
    /// Total timeout for upstream HTTP calls, in seconds
    pub http_timeout_secs: u64,
    /// Refresh-safety window before token expiry, in seconds
    pub token_refresh_window_secs: u64,
    /// Per-IP rate limiting
    pub rate_limit: RateLimitConfig,
}

impl ServerConfig {
    /// Load configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error when `WHOOP_CLIENT_ID` or `WHOOP_CLIENT_SECRET` is
    /// missing or empty, when `API_SECRET_KEY` or `WHOOP_REDIRECT_URI` is
    /// missing in production, or when a numeric variable fails to parse.
    pub fn from_env() -> Result<Self> {
        // Load .env file if present; absence is fine
        let _ = dotenvy::dotenv();

        let environment = Environment::from_str_or_default(
            &env_var_or(env_vars::ENVIRONMENT, "development"),
        );

        let host = env_var_or(env_vars::HOST, defaults::HOST);
        let port: u16 = env_var_or(env_vars::PORT, &defaults::HTTP_PORT.to_string())
            .parse()
            .context("Invalid PORT value")?;

        let client_id = required_env(env_vars::WHOOP_CLIENT_ID)?;
        let client_secret = required_env(env_vars::WHOOP_CLIENT_SECRET)?;

        let redirect_uri = match env::var(env_vars::WHOOP_REDIRECT_URI) {
            Ok(uri) if !uri.trim().is_empty() => {
                Url::parse(&uri).context("Invalid WHOOP_REDIRECT_URI value")?;
                uri
            }
            _ if environment.is_production() => {
                bail!("WHOOP_REDIRECT_URI must be set explicitly in production")
            }
            _ => format!("http://localhost:{port}/whoop/callback"),
        };

        let api_key = match env::var(env_vars::API_SECRET_KEY) {
            Ok(key) if !key.trim().is_empty() => key,
            _ if environment.is_production() => {
                bail!("API_SECRET_KEY must be set in production")
            }
            _ => {
                let key = generate_api_key();
                warn!(
                    "API_SECRET_KEY not set; using temporary key for this process: {key}. \
                     Set API_SECRET_KEY for production."
                );
                key
            }
        };

        let http_timeout_secs: u64 = env_var_or(
            env_vars::HTTP_TIMEOUT_SECS,
            &defaults::HTTP_TIMEOUT_SECS.to_string(),
        )
        .parse()
        .context("Invalid HTTP_TIMEOUT_SECS value")?;

        let token_refresh_window_secs: u64 = env_var_or(
            env_vars::TOKEN_REFRESH_WINDOW_SECS,
            &defaults::TOKEN_REFRESH_WINDOW_SECS.to_string(),
        )
        .parse()
        .context("Invalid TOKEN_REFRESH_WINDOW_SECS value")?;

        let rate_limit = RateLimitConfig {
            requests: env_var_or(
                env_vars::RATE_LIMIT_REQUESTS,
                &defaults::RATE_LIMIT_REQUESTS.to_string(),
            )
            .parse()
            .context("Invalid RATE_LIMIT_REQUESTS value")?,
            window_secs: env_var_or(
                env_vars::RATE_LIMIT_WINDOW_SECS,
                &defaults::RATE_LIMIT_WINDOW_SECS.to_string(),
            )
            .parse()
            .context("Invalid RATE_LIMIT_WINDOW_SECS value")?,
        };

        Ok(Self {
            host,
            port,
            environment,
            whoop: WhoopOAuthConfig {
                client_id,
                client_secret,
                redirect_uri,
            },
            api_key,
            http_timeout_secs,
            token_refresh_window_secs,
            rate_limit,
        })
    }

    /// One-line configuration summary safe for logging (no secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "env={} listen={}:{} redirect_uri={} timeout={}s refresh_window={}s rate_limit={}/{}s",
            self.environment,
            self.host,
            self.port,
            self.whoop.redirect_uri,
            self.http_timeout_secs,
            self.token_refresh_window_secs,
            self.rate_limit.requests,
            self.rate_limit.window_secs,
        )
    }
}

/// Read an environment variable with a default
fn env_var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_owned())
}

/// Read a required, non-empty environment variable
fn required_env(name: &str) -> Result<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        Ok(_) => bail!("{name} is set but empty"),
        Err(_) => bail!("{name} is required but not set"),
    }
}

/// Generate a random development API key
fn generate_api_key() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(43)
        .map(char::from)
        .collect()
}
