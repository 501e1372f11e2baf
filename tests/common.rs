// ABOUTME: Shared test utilities: quiet logging, mock exchanger, mock upstream, builders
// ABOUTME: Reduces duplication across integration tests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]
#![allow(missing_docs)]

//! Shared test utilities for `whoop_mcp_server` integration tests.

use chrono::{Duration, Utc};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use whoop_mcp_server::config::{Environment, RateLimitConfig, ServerConfig, WhoopOAuthConfig};
use whoop_mcp_server::mcp::ToolRouter;
use whoop_mcp_server::oauth::{
    refresh_window_from_secs, AuthError, OAuthExchanger, OAuthManager, TokenCache, TokenRecord,
};
use whoop_mcp_server::providers::{ProviderError, WhoopApi};
use whoop_mcp_server::server::ServerResources;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_test_writer()
            .init();
    });
}

/// Token record expiring `secs` seconds from now
pub fn record_expiring_in(secs: i64) -> TokenRecord {
    TokenRecord {
        access_token: "access-gen-0".into(),
        refresh_token: "refresh-gen-0".into(),
        expires_at: Utc::now() + Duration::seconds(secs),
        scope: "read:sleep read:recovery".into(),
    }
}

/// How the mock exchanger answers refresh calls
#[derive(Debug, Clone, Copy)]
pub enum RefreshMode {
    /// Issue the next token generation
    Rotate,
    /// invalid_grant-class rejection
    Revoked,
    /// Transient network failure
    Unavailable,
}

/// Scriptable stand-in for the WHOOP authorization server
pub struct MockExchanger {
    refresh_mode: Mutex<RefreshMode>,
    refresh_delay_ms: u64,
    refresh_calls: AtomicUsize,
    exchange_calls: AtomicUsize,
    generation: AtomicUsize,
}

impl MockExchanger {
    pub fn new() -> Self {
        Self::with_delay(0)
    }

    /// A refresh delay forces concurrent callers to overlap in flight
    pub fn with_delay(refresh_delay_ms: u64) -> Self {
        Self {
            refresh_mode: Mutex::new(RefreshMode::Rotate),
            refresh_delay_ms,
            refresh_calls: AtomicUsize::new(0),
            exchange_calls: AtomicUsize::new(0),
            generation: AtomicUsize::new(0),
        }
    }

    pub fn set_refresh_mode(&self, mode: RefreshMode) {
        *self.refresh_mode.lock().unwrap() = mode;
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn exchange_calls(&self) -> usize {
        self.exchange_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockExchanger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl OAuthExchanger for MockExchanger {
    fn authorization_url(&self, state: &str) -> String {
        format!("https://auth.test/authorize?state={state}")
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenRecord, AuthError> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        Ok(TokenRecord {
            access_token: format!("access-from-{code}"),
            refresh_token: format!("refresh-from-{code}"),
            expires_at: Utc::now() + Duration::hours(1),
            scope: "read:sleep read:recovery".into(),
        })
    }

    async fn refresh(&self, record: &TokenRecord) -> Result<TokenRecord, AuthError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if self.refresh_delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.refresh_delay_ms)).await;
        }

        let mode = *self.refresh_mode.lock().unwrap();
        match mode {
            RefreshMode::Rotate => {
                let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(TokenRecord {
                    access_token: format!("access-gen-{generation}"),
                    refresh_token: format!("refresh-gen-{generation}"),
                    expires_at: Utc::now() + Duration::hours(1),
                    scope: record.scope.clone(),
                })
            }
            RefreshMode::Revoked => Err(AuthError::RefreshRevoked),
            RefreshMode::Unavailable => {
                Err(AuthError::UpstreamUnavailable("connection reset".into()))
            }
        }
    }

    async fn revoke(&self, _record: &TokenRecord) -> Result<(), AuthError> {
        Ok(())
    }
}

/// How the mock upstream answers data calls
#[derive(Debug, Clone, Copy)]
pub enum UpstreamMode {
    /// Always succeed
    Ok,
    /// Reject the first call with 401, then succeed
    UnauthorizedOnce,
    /// Reject every call with 401
    AlwaysUnauthorized,
    /// Reject with a non-auth 4xx
    Rejected(u16),
    /// Fail with a transport error
    Unavailable,
}

/// Scriptable stand-in for the WHOOP data API
pub struct MockWhoopApi {
    mode: Mutex<UpstreamMode>,
    calls: AtomicUsize,
    unauthorized_fired: AtomicBool,
    tokens_seen: Mutex<Vec<String>>,
}

impl MockWhoopApi {
    pub fn new() -> Self {
        Self::with_mode(UpstreamMode::Ok)
    }

    pub fn with_mode(mode: UpstreamMode) -> Self {
        Self {
            mode: Mutex::new(mode),
            calls: AtomicUsize::new(0),
            unauthorized_fired: AtomicBool::new(false),
            tokens_seen: Mutex::new(Vec::new()),
        }
    }

    pub fn set_mode(&self, mode: UpstreamMode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every bearer token the mock has been called with, in order
    pub fn tokens_seen(&self) -> Vec<String> {
        self.tokens_seen.lock().unwrap().clone()
    }

    fn respond(&self, access_token: &str) -> Result<Value, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tokens_seen.lock().unwrap().push(access_token.to_owned());

        let mode = *self.mode.lock().unwrap();
        match mode {
            UpstreamMode::Ok => Ok(json!({ "records": [] })),
            UpstreamMode::UnauthorizedOnce => {
                if self.unauthorized_fired.swap(true, Ordering::SeqCst) {
                    Ok(json!({ "records": [] }))
                } else {
                    Err(ProviderError::Unauthorized)
                }
            }
            UpstreamMode::AlwaysUnauthorized => Err(ProviderError::Unauthorized),
            UpstreamMode::Rejected(status) => Err(ProviderError::Rejected { status }),
            UpstreamMode::Unavailable => {
                Err(ProviderError::Unavailable("connection reset".into()))
            }
        }
    }
}

impl Default for MockWhoopApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl WhoopApi for MockWhoopApi {
    async fn get_sleep(
        &self,
        access_token: &str,
        _date: Option<&str>,
    ) -> Result<Value, ProviderError> {
        self.respond(access_token)
    }

    async fn get_recovery(
        &self,
        access_token: &str,
        _date: Option<&str>,
    ) -> Result<Value, ProviderError> {
        self.respond(access_token)
    }

    async fn get_workout(
        &self,
        access_token: &str,
        _workout_id: Option<&str>,
    ) -> Result<Value, ProviderError> {
        self.respond(access_token)
    }

    async fn list_workouts(
        &self,
        access_token: &str,
        _limit: u32,
    ) -> Result<Value, ProviderError> {
        self.respond(access_token)
    }

    async fn get_cycle(
        &self,
        access_token: &str,
        _date: Option<&str>,
    ) -> Result<Value, ProviderError> {
        self.respond(access_token)
    }

    async fn get_profile(&self, access_token: &str) -> Result<Value, ProviderError> {
        self.respond(access_token)
    }

    async fn get_body_measurement(&self, access_token: &str) -> Result<Value, ProviderError> {
        self.respond(access_token)
    }
}

/// Standard test configuration (never read from the process environment)
pub fn test_config(api_key: &str) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".into(),
        port: 0,
        environment: Environment::Testing,
        whoop: WhoopOAuthConfig {
            client_id: "test-client-id".into(),
            client_secret: "test-client-secret".into(),
            redirect_uri: "http://localhost:8080/whoop/callback".into(),
        },
        api_key: api_key.into(),
        http_timeout_secs: 10,
        token_refresh_window_secs: 60,
        rate_limit: RateLimitConfig {
            requests: 10_000,
            window_secs: 60,
        },
    }
}

/// Manager over mocks with the given refresh-safety window
pub fn build_manager(
    exchanger: Arc<MockExchanger>,
    window_secs: u64,
) -> (Arc<OAuthManager>, Arc<TokenCache>) {
    init_test_logging();
    let cache = Arc::new(TokenCache::new());
    let manager = Arc::new(OAuthManager::new(
        exchanger,
        Arc::clone(&cache),
        refresh_window_from_secs(window_secs),
    ));
    (manager, cache)
}

/// Full resource bundle over mocks, for router- and route-level tests
pub fn build_test_resources(
    exchanger: Arc<MockExchanger>,
    api: Arc<MockWhoopApi>,
    api_key: &str,
) -> (Arc<ServerResources>, Arc<TokenCache>) {
    let (manager, cache) = build_manager(exchanger, 60);
    let tool_router = Arc::new(ToolRouter::new(Arc::clone(&manager), api));
    let resources = Arc::new(ServerResources::new(
        test_config(api_key),
        manager,
        tool_router,
    ));
    (resources, cache)
}
