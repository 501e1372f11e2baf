// ABOUTME: MCP transport routes: JSON-RPC over HTTP POST and over WebSocket
// ABOUTME: Both transports feed the same tool router; one response per inbound message
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! MCP protocol routes.

use crate::constants::limits::MAX_WS_MESSAGE_BYTES;
use crate::jsonrpc::{error_codes, JsonRpcRequest, JsonRpcResponse};
use crate::mcp::schema::get_tools;
use crate::server::ServerResources;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use http::StatusCode;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

/// MCP route implementation
pub struct McpRoutes;

impl McpRoutes {
    /// Create the protected MCP routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/mcp", post(Self::handle_http))
            .route("/mcp/ws", get(Self::handle_ws_upgrade))
            .route("/tools", get(Self::handle_tools))
            .with_state(resources)
    }

    /// JSON-RPC over HTTP POST
    async fn handle_http(
        State(resources): State<Arc<ServerResources>>,
        body: String,
    ) -> Response {
        let Ok(request) = serde_json::from_str::<JsonRpcRequest>(&body) else {
            let reply =
                JsonRpcResponse::error(None, error_codes::PARSE_ERROR, "Invalid JSON format");
            return Json(reply).into_response();
        };

        match resources.tool_router.handle_request(request).await {
            Some(reply) => Json(reply).into_response(),
            // Notifications produce no response body
            None => StatusCode::NO_CONTENT.into_response(),
        }
    }

    /// Tool discovery for non-MCP clients
    async fn handle_tools() -> Response {
        let tools: Vec<_> = get_tools()
            .into_iter()
            .map(|tool| json!({ "name": tool.name, "description": tool.description }))
            .collect();
        Json(json!({ "tools": tools })).into_response()
    }

    /// Upgrade to the WebSocket transport
    async fn handle_ws_upgrade(
        State(resources): State<Arc<ServerResources>>,
        ws: WebSocketUpgrade,
    ) -> Response {
        info!("MCP WebSocket connection established");
        ws.on_upgrade(move |socket| Self::handle_socket(socket, resources))
    }

    /// Serve one WebSocket connection: one JSON-RPC response per inbound
    /// text frame
    async fn handle_socket(mut socket: WebSocket, resources: Arc<ServerResources>) {
        while let Some(Ok(message)) = socket.recv().await {
            let reply = match message {
                Message::Text(text) => {
                    if text.len() > MAX_WS_MESSAGE_BYTES {
                        Some(JsonRpcResponse::error(
                            None,
                            error_codes::INVALID_REQUEST,
                            "Message too large",
                        ))
                    } else {
                        match serde_json::from_str::<JsonRpcRequest>(&text) {
                            Ok(request) => resources.tool_router.handle_request(request).await,
                            Err(_) => Some(JsonRpcResponse::error(
                                None,
                                error_codes::PARSE_ERROR,
                                "Invalid JSON format",
                            )),
                        }
                    }
                }
                Message::Binary(_) => Some(JsonRpcResponse::error(
                    None,
                    error_codes::INVALID_REQUEST,
                    "Binary frames are not supported",
                )),
                Message::Close(_) => break,
                // Ping/pong frames are handled by the protocol layer
                Message::Ping(_) | Message::Pong(_) => None,
            };

            if let Some(reply) = reply {
                let Ok(serialized) = serde_json::to_string(&reply) else {
                    break;
                };
                if socket.send(Message::Text(serialized)).await.is_err() {
                    break;
                }
            }
        }

        debug!("MCP WebSocket connection closed");
    }
}
