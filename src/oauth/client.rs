// ABOUTME: WHOOP OAuth2 client performing code and refresh-token exchanges
// ABOUTME: Maps transport and authorization-server failures onto the AuthError taxonomy
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # WHOOP OAuth Exchanger
//!
//! Concrete [`OAuthExchanger`] implementation speaking to the WHOOP
//! authorization server with form-encoded POSTs. Upstream error bodies are
//! inspected for classification but never propagated to callers.

use super::{AuthError, OAuthExchanger, TokenRecord};
use crate::config::WhoopOAuthConfig;
use crate::constants::whoop;
use crate::providers::http_client::shared_client;
use chrono::{Duration, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

/// OAuth client for the WHOOP authorization server
pub struct WhoopOAuthClient {
    config: WhoopOAuthConfig,
    auth_url: String,
    token_url: String,
    revoke_url: String,
}

/// WHOOP token endpoint response format
#[derive(Debug, Deserialize)]
struct WhoopTokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    scope: Option<String>,
}

impl WhoopOAuthClient {
    /// Create a client against the production WHOOP endpoints
    #[must_use]
    pub fn new(config: WhoopOAuthConfig) -> Self {
        Self {
            config,
            auth_url: whoop::AUTH_URL.to_owned(),
            token_url: whoop::TOKEN_URL.to_owned(),
            revoke_url: whoop::REVOKE_URL.to_owned(),
        }
    }

    /// Create a client against custom endpoints
    #[must_use]
    pub fn with_endpoints(
        config: WhoopOAuthConfig,
        auth_url: impl Into<String>,
        token_url: impl Into<String>,
        revoke_url: impl Into<String>,
    ) -> Self {
        Self {
            config,
            auth_url: auth_url.into(),
            token_url: token_url.into(),
            revoke_url: revoke_url.into(),
        }
    }

    fn record_from_response(response: WhoopTokenResponse) -> TokenRecord {
        TokenRecord {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_at: Utc::now() + Duration::seconds(response.expires_in),
            scope: response
                .scope
                .unwrap_or_else(|| whoop::DEFAULT_SCOPES.to_owned()),
        }
    }
}

#[async_trait::async_trait]
impl OAuthExchanger for WhoopOAuthClient {
    fn authorization_url(&self, state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}",
            self.auth_url,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.config.redirect_uri),
            urlencoding::encode(whoop::DEFAULT_SCOPES),
            urlencoding::encode(state)
        )
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenRecord, AuthError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];

        let response = shared_client()
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::UpstreamUnavailable(e.to_string()))?;

        let status = response.status();
        if status.is_client_error() {
            // The authorization server rejected the code; the flow attempt
            // is dead, and the body stays out of the error surface.
            warn!("WHOOP code exchange rejected with HTTP {status}");
            return Err(AuthError::AuthorizationDenied(format!(
                "authorization code rejected (HTTP {status})"
            )));
        }
        if !status.is_success() {
            return Err(AuthError::UpstreamUnavailable(format!(
                "token endpoint returned HTTP {status}"
            )));
        }

        let token_response: WhoopTokenResponse = response
            .json()
            .await
            .map_err(|_| AuthError::UpstreamUnavailable("malformed token response".to_owned()))?;

        debug!("WHOOP code exchange succeeded");
        Ok(Self::record_from_response(token_response))
    }

    async fn refresh(&self, record: &TokenRecord) -> Result<TokenRecord, AuthError> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", record.refresh_token.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];

        let response = shared_client()
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::UpstreamUnavailable(e.to_string()))?;

        let status = response.status();
        if status.is_client_error() {
            // invalid_grant and friends: the stored grant is unusable and the
            // principal must re-authenticate.
            warn!("WHOOP refresh rejected with HTTP {status}");
            return Err(AuthError::RefreshRevoked);
        }
        if !status.is_success() {
            return Err(AuthError::UpstreamUnavailable(format!(
                "token endpoint returned HTTP {status}"
            )));
        }

        let token_response: WhoopTokenResponse = response
            .json()
            .await
            .map_err(|_| AuthError::UpstreamUnavailable("malformed token response".to_owned()))?;

        debug!("WHOOP token refresh succeeded");
        Ok(Self::record_from_response(token_response))
    }

    async fn revoke(&self, record: &TokenRecord) -> Result<(), AuthError> {
        let params = [
            ("token", record.access_token.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];

        let response = shared_client()
            .post(&self.revoke_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::UpstreamUnavailable(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(AuthError::UpstreamUnavailable(format!(
                "revocation endpoint returned HTTP {}",
                response.status()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> WhoopOAuthConfig {
        WhoopOAuthConfig {
            client_id: "client-123".into(),
            client_secret: "secret-456".into(),
            redirect_uri: "http://localhost:8080/whoop/callback".into(),
        }
    }

    #[test]
    fn test_authorization_url_contains_required_params() {
        let client = WhoopOAuthClient::new(test_config());
        let url = client.authorization_url("state-abc");

        assert!(url.starts_with(whoop::AUTH_URL));
        assert!(url.contains("client_id=client-123"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("state=state-abc"));
        assert!(url.contains("read%3Arecovery"));
        // The client secret never appears in the user-facing URL
        assert!(!url.contains("secret-456"));
    }
}
