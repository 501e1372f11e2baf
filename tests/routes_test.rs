// ABOUTME: Route-level tests: API key gate, OAuth endpoints, MCP HTTP transport, hardening
// ABOUTME: Drives the assembled axum router in-process with tower oneshot requests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use axum::body::Body;
use common::{build_test_resources, MockExchanger, MockWhoopApi};
use http::{Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use whoop_mcp_server::routes::build_router;

const API_KEY: &str = "test-api-key-123";

struct Harness {
    router: axum::Router,
    exchanger: Arc<MockExchanger>,
    api: Arc<MockWhoopApi>,
}

fn harness() -> Harness {
    let exchanger = Arc::new(MockExchanger::new());
    let api = Arc::new(MockWhoopApi::new());
    let (resources, _cache) =
        build_test_resources(Arc::clone(&exchanger), Arc::clone(&api), API_KEY);
    Harness {
        router: build_router(&resources),
        exchanger,
        api,
    }
}

async fn send(
    harness: &Harness,
    request: Request<Body>,
) -> (StatusCode, http::HeaderMap, Value) {
    let response = harness.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, headers, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn get_with_key(uri: &str, key: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("x-api-key", key)
        .body(Body::empty())
        .unwrap()
}

fn post_mcp(key: Option<&str>, payload: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/mcp")
        .header("content-type", "application/json");
    if let Some(key) = key {
        builder = builder.header("x-api-key", key);
    }
    builder.body(Body::from(payload.to_owned())).unwrap()
}

#[tokio::test]
async fn test_health_is_public() {
    let harness = harness();
    let (status, _, body) = send(&harness, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_root_descriptor_is_public() {
    let harness = harness();
    let (status, _, body) = send(&harness, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "WHOOP MCP Server");
}

#[tokio::test]
async fn test_security_headers_are_applied() {
    let harness = harness();
    let (_, headers, _) = send(&harness, get("/health")).await;
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
    assert!(headers.contains_key("strict-transport-security"));
    assert!(headers.contains_key("content-security-policy"));
}

#[tokio::test]
async fn test_mcp_requires_api_key() {
    let harness = harness();
    let payload = json!({ "jsonrpc": "2.0", "method": "tools/list", "id": 1 }).to_string();

    let (status, _, body) = send(&harness, post_mcp(None, &payload)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_near_miss_key_matches_garbage_key_response() {
    let harness = harness();
    let payload = json!({ "jsonrpc": "2.0", "method": "ping", "id": 1 }).to_string();

    let near_miss = format!("{}X", &API_KEY[..API_KEY.len() - 1]);
    let (near_status, _, near_body) =
        send(&harness, post_mcp(Some(&near_miss), &payload)).await;
    let (far_status, _, far_body) = send(&harness, post_mcp(Some("zzz"), &payload)).await;

    assert_eq!(near_status, StatusCode::UNAUTHORIZED);
    assert_eq!(far_status, StatusCode::UNAUTHORIZED);
    assert_eq!(near_body, far_body);
}

#[tokio::test]
async fn test_mcp_tools_list_with_valid_key() {
    let harness = harness();
    let payload = json!({ "jsonrpc": "2.0", "method": "tools/list", "id": 7 }).to_string();

    let (status, _, body) = send(&harness, post_mcp(Some(API_KEY), &payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 7);
    assert_eq!(body["result"]["tools"].as_array().unwrap().len(), 11);
}

#[tokio::test]
async fn test_mcp_invalid_json_yields_parse_error() {
    let harness = harness();
    let (status, _, body) = send(&harness, post_mcp(Some(API_KEY), "{not json")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"]["code"], -32700);
}

#[tokio::test]
async fn test_tools_endpoint_lists_names_and_descriptions() {
    let harness = harness();

    let (status, _, _) = send(&harness, get("/tools")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, body) = send(&harness, get_with_key("/tools", API_KEY)).await;
    assert_eq!(status, StatusCode::OK);
    let tools = body["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 11);
    assert!(tools.iter().all(|tool| tool["name"].is_string()));
}

#[tokio::test]
async fn test_auth_status_is_protected_and_reports_state() {
    let harness = harness();

    let (status, _, _) = send(&harness, get("/auth")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, body) = send(&harness, get_with_key("/auth", API_KEY)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["authenticated"], false);
}

#[tokio::test]
async fn test_oauth_flow_end_to_end_over_http() {
    let harness = harness();

    // Begin the flow (public, as the original deployment)
    let (status, _, body) = send(&harness, get("/whoop/auth")).await;
    assert_eq!(status, StatusCode::OK);
    let state = body["state"].as_str().unwrap().to_owned();
    assert!(body["auth_url"].as_str().unwrap().contains(&state));

    // The redirect lands with code and state
    let callback_uri = format!("/whoop/callback?code=code-http&state={state}");
    let (status, _, body) = send(&harness, get(&callback_uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(harness.exchanger.exchange_calls(), 1);

    // Status now reports the connection with expiry metadata only
    let (_, _, body) = send(&harness, get_with_key("/auth", API_KEY)).await;
    assert_eq!(body["authenticated"], true);
    assert!(body["expires_at"].is_string());
    assert!(body.get("access_token").is_none());

    // A tool invocation through HTTP now reaches upstream with the token
    let payload = json!({
        "jsonrpc": "2.0",
        "method": "tools/call",
        "params": { "name": "get_sleep_data", "arguments": {} },
        "id": 2
    })
    .to_string();
    let (status, _, body) = send(&harness, post_mcp(Some(API_KEY), &payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("error").is_none());
    assert_eq!(
        harness.api.tokens_seen(),
        vec!["access-from-code-http".to_owned()]
    );
}

#[tokio::test]
async fn test_callback_with_consumed_state_is_invalid() {
    let harness = harness();

    let (_, _, body) = send(&harness, get("/whoop/auth")).await;
    let state = body["state"].as_str().unwrap().to_owned();

    let callback_uri = format!("/whoop/callback?code=code-1&state={state}");
    let (status, _, _) = send(&harness, get(&callback_uri)).await;
    assert_eq!(status, StatusCode::OK);

    // Replay: the state was consumed on first use
    let (status, _, body) = send(&harness, get(&callback_uri)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_STATE");
    assert_eq!(harness.exchanger.exchange_calls(), 1);
}

#[tokio::test]
async fn test_callback_with_unknown_state_is_invalid() {
    let harness = harness();
    let (status, _, body) =
        send(&harness, get("/whoop/callback?code=c&state=never-issued")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_STATE");
}

#[tokio::test]
async fn test_callback_with_provider_error_is_denied() {
    let harness = harness();
    let (status, _, body) = send(&harness, get("/whoop/callback?error=access_denied")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "AUTHORIZATION_DENIED");
}

#[tokio::test]
async fn test_callback_without_code_is_invalid_input() {
    let harness = harness();
    let (status, _, body) = send(&harness, get("/whoop/callback")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_INPUT");
}
