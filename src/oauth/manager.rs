// ABOUTME: Central OAuth manager owning authorization state and the token refresh path
// ABOUTME: Serializes concurrent refreshes per principal through a single-flight group
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # OAuth Manager
//!
//! Orchestrates the complete flow: issuing authorization URLs with CSRF
//! state, consuming callbacks, and keeping tokens fresh for the router.
//!
//! Refresh is single-flight per principal. WHOOP rotates refresh tokens on
//! use, so two concurrent refresh calls with the same token would invalidate
//! the grant; instead, the first caller spawns the exchange and every
//! concurrent caller awaits the same shared result. The exchange task runs
//! to completion even when all callers are cancelled, so waiters are never
//! stranded and the cache is updated exactly once per token generation.

use super::{
    AuthError, AuthorizationResponse, CallbackResponse, OAuthExchanger, TokenCache, TokenRecord,
};
use crate::constants::limits::AUTH_STATE_EXPIRY_MINUTES;
use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::{BoxFuture, Shared};
use futures_util::FutureExt;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Shared handle to an in-flight refresh for one principal
type RefreshFlight = Shared<BoxFuture<'static, Result<TokenRecord, AuthError>>>;

/// Outstanding authorization state for CSRF protection
#[derive(Debug, Clone)]
struct StateData {
    principal: String,
    expires_at: DateTime<Utc>,
}

/// Central OAuth manager
pub struct OAuthManager {
    exchanger: Arc<dyn OAuthExchanger>,
    cache: Arc<TokenCache>,
    state_storage: tokio::sync::RwLock<HashMap<String, StateData>>,
    refresh_flights: Arc<DashMap<String, RefreshFlight>>,
    refresh_window: Duration,
}

impl OAuthManager {
    /// Create a manager around an exchanger and token cache
    #[must_use]
    pub fn new(
        exchanger: Arc<dyn OAuthExchanger>,
        cache: Arc<TokenCache>,
        refresh_window: Duration,
    ) -> Self {
        Self {
            exchanger,
            cache,
            state_storage: tokio::sync::RwLock::new(HashMap::new()),
            refresh_flights: Arc::new(DashMap::new()),
            refresh_window,
        }
    }

    /// The token cache this manager mutates
    #[must_use]
    pub fn cache(&self) -> &Arc<TokenCache> {
        &self.cache
    }

    /// Begin an authorization flow for a principal.
    ///
    /// Issues a fresh single-use state with a bounded lifetime and returns
    /// the URL the user must visit.
    pub async fn begin_authorization(&self, principal: &str) -> AuthorizationResponse {
        let state = Uuid::new_v4().to_string();
        let now = Utc::now();

        {
            let mut storage = self.state_storage.write().await;
            storage.insert(
                state.clone(),
                StateData {
                    principal: principal.to_owned(),
                    expires_at: now + Duration::minutes(AUTH_STATE_EXPIRY_MINUTES),
                },
            );
            // Sweep expired states while we hold the write lock
            storage.retain(|_, data| data.expires_at > now);
        }

        AuthorizationResponse {
            authorization_url: self.exchanger.authorization_url(&state),
            state,
            instructions:
                "Visit the authorization URL to connect your WHOOP account, then return here."
                    .to_owned(),
            expires_in_minutes: u32::try_from(AUTH_STATE_EXPIRY_MINUTES).unwrap_or(10),
        }
    }

    /// Handle the OAuth callback redirect.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidState` when the state is unknown, expired, or
    /// already consumed, and propagates exchanger failures otherwise.
    pub async fn handle_callback(
        &self,
        code: &str,
        state: &str,
    ) -> Result<CallbackResponse, AuthError> {
        let state_data = self.consume_state(state).await?;

        let record = self.exchanger.exchange_code(code).await?;
        let expires_at = record.expires_at.to_rfc3339();
        let scope = record.scope.clone();

        self.cache.put(&state_data.principal, record);
        info!("WHOOP authorization completed for principal {}", state_data.principal);

        Ok(CallbackResponse {
            success: true,
            expires_at,
            scope,
            message: "WHOOP connected successfully".to_owned(),
        })
    }

    /// Resolve a usable token for a principal, refreshing when the record is
    /// inside the refresh-safety window.
    ///
    /// # Errors
    ///
    /// `NotAuthenticated` when no record exists (or the grant was revoked by
    /// a concurrent refresh), `RefreshRevoked` when the upstream rejected the
    /// refresh, `UpstreamUnavailable` on transient failure (the stale record
    /// stays cached).
    pub async fn ensure_valid_token(&self, principal: &str) -> Result<TokenRecord, AuthError> {
        let record = self
            .cache
            .get(principal)
            .ok_or(AuthError::NotAuthenticated)?;

        if !record.needs_refresh(self.refresh_window) {
            return Ok(record);
        }

        debug!("token for {principal} inside refresh window, joining refresh flight");
        self.join_refresh(principal, &record).await
    }

    /// Force one refresh after an unexpected upstream 401.
    ///
    /// Idempotent per token generation: when the cache already holds a newer
    /// record than the one the caller observed, that record is returned
    /// without issuing another exchange.
    ///
    /// # Errors
    ///
    /// Same contract as [`Self::ensure_valid_token`].
    pub async fn force_refresh(
        &self,
        principal: &str,
        observed: &TokenRecord,
    ) -> Result<TokenRecord, AuthError> {
        match self.cache.get(principal) {
            None => Err(AuthError::NotAuthenticated),
            Some(current) if current.access_token != observed.access_token => Ok(current),
            Some(_) => self.join_refresh(principal, observed).await,
        }
    }

    /// Disconnect a principal: best-effort upstream revocation, then local
    /// invalidation. Returns whether a record was present.
    pub async fn disconnect(&self, principal: &str) -> bool {
        let Some(record) = self.cache.get(principal) else {
            return false;
        };

        if let Err(e) = self.exchanger.revoke(&record).await {
            // Local deletion proceeds regardless
            warn!("WHOOP token revocation failed: {e}");
        }

        self.cache.invalidate(principal);
        info!("WHOOP disconnected for principal {principal}");
        true
    }

    /// Validate and consume an authorization state, enforcing single use
    async fn consume_state(&self, state: &str) -> Result<StateData, AuthError> {
        let mut storage = self.state_storage.write().await;
        let state_data = storage.remove(state).ok_or(AuthError::InvalidState)?;

        if state_data.expires_at < Utc::now() {
            return Err(AuthError::InvalidState);
        }

        Ok(state_data)
    }

    /// Join (or start) the single-flight refresh for a principal.
    ///
    /// The exchange runs in a spawned task that re-checks the cache before
    /// issuing the upstream call and applies its own result to the cache, so
    /// the group's promise completes even when every waiter is cancelled.
    fn join_refresh(&self, principal: &str, observed: &TokenRecord) -> RefreshFlight {
        match self.refresh_flights.entry(principal.to_owned()) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => {
                let exchanger = Arc::clone(&self.exchanger);
                let cache = Arc::clone(&self.cache);
                let flights = Arc::clone(&self.refresh_flights);
                let key = principal.to_owned();
                let observed_access = observed.access_token.clone();

                // The spawn happens on first poll, strictly after this entry
                // is inserted, so the task's self-removal can never race a
                // not-yet-inserted flight. Once spawned, the exchange runs to
                // completion regardless of caller cancellation.
                let flight: RefreshFlight = async move {
                    let task = tokio::spawn(async move {
                        let result = match cache.get(&key) {
                            None => Err(AuthError::NotAuthenticated),
                            // Another flight already rotated this generation
                            Some(current) if current.access_token != observed_access => {
                                Ok(current)
                            }
                            Some(current) => {
                                let outcome = exchanger.refresh(&current).await;
                                match &outcome {
                                    Ok(record) => cache.put(&key, record.clone()),
                                    Err(AuthError::RefreshRevoked) => {
                                        warn!("refresh revoked for {key}; clearing token");
                                        cache.invalidate(&key);
                                    }
                                    // Transient failure keeps the stale record
                                    Err(_) => {}
                                }
                                outcome
                            }
                        };
                        flights.remove(&key);
                        result
                    });

                    task.await.unwrap_or_else(|_| {
                        Err(AuthError::UpstreamUnavailable(
                            "refresh task failed".to_owned(),
                        ))
                    })
                }
                .boxed()
                .shared();

                entry.insert(flight.clone());
                flight
            }
        }
    }
}
