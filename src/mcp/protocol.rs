// ABOUTME: MCP protocol message handlers for core protocol operations
// ABOUTME: Handles initialize, ping, and tools/list; tools/call lives in the router
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # MCP Protocol Handlers
//!
//! Core protocol messages that need no token or upstream access.

use super::schema::{get_tools, InitializeResponse};
use crate::jsonrpc::{error_codes, JsonRpcRequest, JsonRpcResponse};
use serde_json::Value;

/// MCP protocol handlers
pub struct ProtocolHandler;

/// Default ID for responses to requests that did not carry one
fn default_request_id() -> Value {
    Value::Number(serde_json::Number::from(0))
}

impl ProtocolHandler {
    /// Handle an initialize request
    #[must_use]
    pub fn handle_initialize(request: &JsonRpcRequest) -> JsonRpcResponse {
        let request_id = request.id.clone().unwrap_or_else(default_request_id);
        match serde_json::to_value(InitializeResponse::new()) {
            Ok(result) => JsonRpcResponse::success(Some(request_id), result),
            Err(_) => JsonRpcResponse::error(
                Some(request_id),
                error_codes::INTERNAL_ERROR,
                "Internal error",
            ),
        }
    }

    /// Handle a ping request
    #[must_use]
    pub fn handle_ping(request: &JsonRpcRequest) -> JsonRpcResponse {
        let request_id = request.id.clone().unwrap_or_else(default_request_id);
        JsonRpcResponse::success(Some(request_id), serde_json::json!({}))
    }

    /// Handle a tools/list request
    #[must_use]
    pub fn handle_tools_list(request: &JsonRpcRequest) -> JsonRpcResponse {
        let request_id = request.id.clone().unwrap_or_else(default_request_id);
        JsonRpcResponse::success(
            Some(request_id),
            serde_json::json!({ "tools": get_tools() }),
        )
    }

    /// Handle an unknown method
    #[must_use]
    pub fn handle_unknown_method(request: &JsonRpcRequest) -> JsonRpcResponse {
        let request_id = request.id.clone().unwrap_or_else(default_request_id);
        JsonRpcResponse::error(
            Some(request_id),
            error_codes::METHOD_NOT_FOUND,
            format!("Method not found: {}", request.method),
        )
    }
}
