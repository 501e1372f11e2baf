// ABOUTME: OAuth flow routes: authorization start, the WHOOP redirect callback, and status
// ABOUTME: Callback failures report a stable error kind without exposing cache contents
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! OAuth HTTP routes.
//!
//! `/whoop/auth` and `/whoop/callback` are public: the authorization server
//! redirects the user's browser to the callback and cannot attach our API
//! key. `/auth` (status) is protected.

use crate::constants::DEFAULT_PRINCIPAL;
use crate::errors::{AppError, ErrorCode};
use crate::server::ServerResources;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

/// Query parameters delivered by the WHOOP redirect
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    /// Authorization code on success
    pub code: Option<String>,
    /// CSRF state issued at flow start
    pub state: Option<String>,
    /// Error indicator when the user denied access
    pub error: Option<String>,
}

/// OAuth route implementation
pub struct OAuthRoutes;

impl OAuthRoutes {
    /// Routes reachable without the API key
    pub fn public_routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/whoop/auth", get(Self::handle_begin))
            .route("/whoop/callback", get(Self::handle_callback))
            .with_state(resources)
    }

    /// Routes behind the API key gate
    pub fn protected_routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/auth", get(Self::handle_status))
            .with_state(resources)
    }

    /// Begin the OAuth flow: issue a state and return the authorization URL
    async fn handle_begin(State(resources): State<Arc<ServerResources>>) -> Response {
        let authorization = resources.oauth.begin_authorization(DEFAULT_PRINCIPAL).await;
        Json(json!({
            "auth_url": authorization.authorization_url,
            "state": authorization.state,
            "instructions": authorization.instructions,
            "expires_in_minutes": authorization.expires_in_minutes,
            "callback_uri": resources.config.whoop.redirect_uri,
        }))
        .into_response()
    }

    /// Consume the WHOOP redirect: validate state, exchange the code
    async fn handle_callback(
        State(resources): State<Arc<ServerResources>>,
        Query(params): Query<CallbackParams>,
    ) -> Response {
        if let Some(error) = params.error {
            warn!("WHOOP authorization callback reported an error");
            return AppError::new(
                ErrorCode::AuthorizationDenied,
                format!("WHOOP authentication failed: {error}"),
            )
            .into_response();
        }

        let (Some(code), Some(state)) = (params.code, params.state) else {
            return AppError::invalid_input(
                "Missing authorization code or state. Please start the authentication process again.",
            )
            .into_response();
        };

        match resources.oauth.handle_callback(&code, &state).await {
            Ok(callback) => Json(callback).into_response(),
            Err(err) => AppError::from(err).into_response(),
        }
    }

    /// Report whether a token is stored, with expiry metadata only
    async fn handle_status(State(resources): State<Arc<ServerResources>>) -> Response {
        match resources.oauth.cache().get(DEFAULT_PRINCIPAL) {
            Some(record) => Json(json!({
                "authenticated": true,
                "expires_at": record.expires_at.to_rfc3339(),
                "scope": record.scope,
            }))
            .into_response(),
            None => Json(json!({ "authenticated": false })).into_response(),
        }
    }
}
