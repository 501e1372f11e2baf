// ABOUTME: Integration tests for the OAuth manager: state lifecycle and refresh behavior
// ABOUTME: Covers single-flight refresh, single-use states, revocation, and transient failure
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use common::{build_manager, record_expiring_in, MockExchanger, RefreshMode};
use std::sync::Arc;
use whoop_mcp_server::oauth::AuthError;

#[tokio::test]
async fn test_fresh_token_is_returned_without_refresh() {
    let exchanger = Arc::new(MockExchanger::new());
    let (manager, cache) = build_manager(Arc::clone(&exchanger), 60);
    cache.put("default", record_expiring_in(3600));

    let record = manager.ensure_valid_token("default").await.unwrap();
    assert_eq!(record.access_token, "access-gen-0");
    assert_eq!(exchanger.refresh_calls(), 0);
}

#[tokio::test]
async fn test_missing_token_fails_not_authenticated() {
    let exchanger = Arc::new(MockExchanger::new());
    let (manager, _cache) = build_manager(exchanger, 60);

    let err = manager.ensure_valid_token("default").await.unwrap_err();
    assert!(matches!(err, AuthError::NotAuthenticated));
}

#[tokio::test]
async fn test_stale_token_is_refreshed_and_cached() {
    let exchanger = Arc::new(MockExchanger::new());
    let (manager, cache) = build_manager(Arc::clone(&exchanger), 60);
    // Expires in 5 seconds, well inside the 60 second window
    cache.put("default", record_expiring_in(5));

    let record = manager.ensure_valid_token("default").await.unwrap();
    assert_eq!(record.access_token, "access-gen-1");
    assert_eq!(exchanger.refresh_calls(), 1);

    // The cache now holds the refreshed generation
    assert_eq!(cache.get("default").unwrap().access_token, "access-gen-1");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_refreshes_share_one_exchange() {
    let exchanger = Arc::new(MockExchanger::with_delay(50));
    let (manager, cache) = build_manager(Arc::clone(&exchanger), 60);
    cache.put("default", record_expiring_in(5));

    let tasks: Vec<_> = (0..10)
        .map(|_| {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.ensure_valid_token("default").await })
        })
        .collect();

    let mut tokens = Vec::new();
    for task in tasks {
        tokens.push(task.await.unwrap().unwrap().access_token);
    }

    // Exactly one exchange; all callers observe the same resulting record
    assert_eq!(exchanger.refresh_calls(), 1);
    assert!(tokens.iter().all(|token| token == "access-gen-1"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cancelled_caller_does_not_strand_the_flight() {
    let exchanger = Arc::new(MockExchanger::with_delay(50));
    let (manager, cache) = build_manager(Arc::clone(&exchanger), 60);
    cache.put("default", record_expiring_in(5));

    // The first caller starts the refresh flight, then is cancelled while
    // the exchange is still in the air
    let first = {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move { manager.ensure_valid_token("default").await })
    };
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    first.abort();
    let _ = first.await;

    // The exchange still runs to completion: a later caller gets the
    // refreshed generation without a second exchange, and the cache holds it
    let record = manager.ensure_valid_token("default").await.unwrap();
    assert_eq!(record.access_token, "access-gen-1");
    assert_eq!(exchanger.refresh_calls(), 1);
    assert_eq!(cache.get("default").unwrap().access_token, "access-gen-1");
}

#[tokio::test]
async fn test_revoked_refresh_clears_the_cache() {
    let exchanger = Arc::new(MockExchanger::new());
    exchanger.set_refresh_mode(RefreshMode::Revoked);
    let (manager, cache) = build_manager(Arc::clone(&exchanger), 60);
    cache.put("default", record_expiring_in(5));

    let err = manager.ensure_valid_token("default").await.unwrap_err();
    assert!(matches!(err, AuthError::RefreshRevoked));

    // No record remains for the principal
    assert!(cache.get("default").is_none());

    // The next call fails NotAuthenticated without touching the exchanger again
    let err = manager.ensure_valid_token("default").await.unwrap_err();
    assert!(matches!(err, AuthError::NotAuthenticated));
    assert_eq!(exchanger.refresh_calls(), 1);
}

#[tokio::test]
async fn test_transient_failure_keeps_the_stale_record() {
    let exchanger = Arc::new(MockExchanger::new());
    exchanger.set_refresh_mode(RefreshMode::Unavailable);
    let (manager, cache) = build_manager(Arc::clone(&exchanger), 60);
    cache.put("default", record_expiring_in(5));

    let err = manager.ensure_valid_token("default").await.unwrap_err();
    assert!(matches!(err, AuthError::UpstreamUnavailable(_)));

    // The possibly-stale token is NOT discarded on transient failure
    assert_eq!(cache.get("default").unwrap().access_token, "access-gen-0");

    // Once the upstream recovers, a retry succeeds
    exchanger.set_refresh_mode(RefreshMode::Rotate);
    let record = manager.ensure_valid_token("default").await.unwrap();
    assert_eq!(record.access_token, "access-gen-1");
}

#[tokio::test]
async fn test_force_refresh_is_idempotent_per_generation() {
    let exchanger = Arc::new(MockExchanger::new());
    let (manager, cache) = build_manager(Arc::clone(&exchanger), 60);
    cache.put("default", record_expiring_in(3600));

    let observed = cache.get("default").unwrap();
    let refreshed = manager.force_refresh("default", &observed).await.unwrap();
    assert_eq!(refreshed.access_token, "access-gen-1");
    assert_eq!(exchanger.refresh_calls(), 1);

    // Forcing again with the superseded record returns the cached generation
    // without another exchange
    let again = manager.force_refresh("default", &observed).await.unwrap();
    assert_eq!(again.access_token, "access-gen-1");
    assert_eq!(exchanger.refresh_calls(), 1);
}

#[tokio::test]
async fn test_callback_state_is_single_use() {
    let exchanger = Arc::new(MockExchanger::new());
    let (manager, cache) = build_manager(Arc::clone(&exchanger), 60);

    let authorization = manager.begin_authorization("default").await;
    assert!(authorization
        .authorization_url
        .contains(&authorization.state));

    let callback = manager
        .handle_callback("code-abc", &authorization.state)
        .await
        .unwrap();
    assert!(callback.success);
    assert_eq!(
        cache.get("default").unwrap().access_token,
        "access-from-code-abc"
    );

    // The state was consumed; replaying the callback must fail
    let err = manager
        .handle_callback("code-abc", &authorization.state)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidState));
    assert_eq!(exchanger.exchange_calls(), 1);
}

#[tokio::test]
async fn test_unknown_state_is_rejected() {
    let exchanger = Arc::new(MockExchanger::new());
    let (manager, cache) = build_manager(exchanger, 60);

    let err = manager
        .handle_callback("code-abc", "never-issued")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidState));
    assert!(cache.get("default").is_none());
}

#[tokio::test]
async fn test_disconnect_removes_the_record() {
    let exchanger = Arc::new(MockExchanger::new());
    let (manager, cache) = build_manager(exchanger, 60);
    cache.put("default", record_expiring_in(3600));

    assert!(manager.disconnect("default").await);
    assert!(cache.get("default").is_none());

    // Disconnecting again is a no-op
    assert!(!manager.disconnect("default").await);
}
