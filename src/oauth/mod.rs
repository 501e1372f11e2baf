// ABOUTME: OAuth module organizing token lifecycle management for the WHOOP API
// ABOUTME: Defines token records, flow responses, the error taxonomy, and the exchanger seam
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # OAuth Token Lifecycle
//!
//! Everything between "the user clicked authorize" and "an upstream call
//! carries a valid bearer token" lives here: the token record and cache, the
//! WHOOP exchanger, and the manager that owns authorization state and the
//! single-flight refresh path.

pub mod client;
pub mod manager;
pub mod token_cache;

pub use client::WhoopOAuthClient;
pub use manager::OAuthManager;
pub use token_cache::TokenCache;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// OAuth token record for one principal.
///
/// Records are replaced whole, never patched: `expires_at` always belongs to
/// the token that was last successfully issued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Bearer token for upstream calls
    pub access_token: String,
    /// Token used to obtain the next generation
    pub refresh_token: String,
    /// Absolute expiry of `access_token`
    pub expires_at: DateTime<Utc>,
    /// Granted scopes, space separated
    pub scope: String,
}

impl TokenRecord {
    /// Whether the record is inside the refresh-safety window right now
    #[must_use]
    pub fn needs_refresh(&self, window: Duration) -> bool {
        self.needs_refresh_at(Utc::now(), window)
    }

    /// Window check against an explicit clock. The boundary is inclusive:
    /// a record expiring exactly `window` from `now` triggers a refresh.
    #[must_use]
    pub fn needs_refresh_at(&self, now: DateTime<Utc>, window: Duration) -> bool {
        now >= self.expires_at - window
    }
}

/// Response returned when an authorization flow is initiated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationResponse {
    /// URL the user must visit to authorize the application
    pub authorization_url: String,
    /// CSRF state bound to this flow attempt
    pub state: String,
    /// Human-readable next step
    pub instructions: String,
    /// Minutes until the state expires
    pub expires_in_minutes: u32,
}

/// Response returned after a successful callback exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackResponse {
    /// Whether the exchange succeeded
    pub success: bool,
    /// Expiry of the newly issued token, RFC 3339
    pub expires_at: String,
    /// Granted scopes
    pub scope: String,
    /// Human-readable confirmation
    pub message: String,
}

/// OAuth error taxonomy.
///
/// `Clone` because refresh results are fanned out to every waiter of a
/// single-flight group.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    /// No token stored for the principal; the OAuth flow must be completed
    #[error("Not authenticated with WHOOP. Use the connect_to_whoop tool to authenticate.")]
    NotAuthenticated,

    /// State parameter absent, expired, or already consumed
    #[error("Invalid or expired state parameter")]
    InvalidState,

    /// The authorization server rejected the code exchange
    #[error("Authorization denied: {0}")]
    AuthorizationDenied(String),

    /// The upstream revoked consent; the stored grant is dead
    #[error("Refresh token revoked by WHOOP")]
    RefreshRevoked,

    /// Transient network or 5xx failure talking to the authorization server
    #[error("WHOOP unavailable: {0}")]
    UpstreamUnavailable(String),
}

impl From<AuthError> for crate::errors::AppError {
    fn from(err: AuthError) -> Self {
        use crate::errors::ErrorCode;
        let code = match err {
            AuthError::NotAuthenticated | AuthError::RefreshRevoked => {
                ErrorCode::NotAuthenticated
            }
            AuthError::InvalidState => ErrorCode::InvalidState,
            AuthError::AuthorizationDenied(_) => ErrorCode::AuthorizationDenied,
            AuthError::UpstreamUnavailable(_) => ErrorCode::UpstreamUnavailable,
        };
        Self::new(code, err.to_string())
    }
}

/// Seam between the token lifecycle and the WHOOP authorization server.
///
/// The manager and router only ever see this trait, which keeps the refresh
/// and callback machinery testable against mock exchangers.
#[async_trait::async_trait]
pub trait OAuthExchanger: Send + Sync {
    /// Authorization URL for the given CSRF state
    fn authorization_url(&self, state: &str) -> String;

    /// Exchange an authorization code for a fresh token record
    async fn exchange_code(&self, code: &str) -> Result<TokenRecord, AuthError>;

    /// Exchange a refresh token for the next token generation
    async fn refresh(&self, record: &TokenRecord) -> Result<TokenRecord, AuthError>;

    /// Best-effort token revocation
    async fn revoke(&self, record: &TokenRecord) -> Result<(), AuthError>;
}

/// Bounded window used by `needs_refresh`, clamped to one year
#[must_use]
pub fn refresh_window_from_secs(secs: u64) -> Duration {
    let secs = secs.min(31_536_000);
    Duration::seconds(i64::try_from(secs).unwrap_or(31_536_000))
}
