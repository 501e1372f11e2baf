// ABOUTME: Token-aware tool router mapping MCP tool calls to authenticated WHOOP requests
// ABOUTME: Resolves and refreshes tokens, retries once on an unexpected 401, maps typed errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Tool Router
//!
//! Per-invocation flow: resolve the principal's token, refresh through the
//! single-flight group when it sits inside the refresh-safety window, issue
//! the upstream call, and map the outcome into an MCP tool result. An
//! upstream 401 despite a just-validated token gets exactly one forced
//! refresh-and-retry (clock-skew tolerance); every other failure is surfaced
//! as a typed error with no automatic retry.

use super::protocol::ProtocolHandler;
use super::schema::ToolResponse;
use crate::constants::{json_fields, limits, tools, DEFAULT_PRINCIPAL};
use crate::errors::{AppError, AppResult};
use crate::formatters;
use crate::jsonrpc::{error_codes, JsonRpcRequest, JsonRpcResponse};
use crate::oauth::OAuthManager;
use crate::providers::{ProviderError, WhoopApi};
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// Token-aware MCP request router
pub struct ToolRouter {
    oauth: Arc<OAuthManager>,
    api: Arc<dyn WhoopApi>,
}

impl ToolRouter {
    /// Create a router over an OAuth manager and upstream API
    #[must_use]
    pub fn new(oauth: Arc<OAuthManager>, api: Arc<dyn WhoopApi>) -> Self {
        Self { oauth, api }
    }

    /// Handle one JSON-RPC message. Returns `None` for notifications, which
    /// expect no response.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.method.starts_with("notifications/") {
            return None;
        }

        let response = match request.method.as_str() {
            "initialize" => ProtocolHandler::handle_initialize(&request),
            "ping" => ProtocolHandler::handle_ping(&request),
            "tools/list" => ProtocolHandler::handle_tools_list(&request),
            "tools/call" => self.handle_tools_call(request).await,
            _ => ProtocolHandler::handle_unknown_method(&request),
        };

        Some(response)
    }

    /// Handle a tools/call request
    async fn handle_tools_call(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let request_id = request.id.clone();

        let Some(params) = request.params else {
            return JsonRpcResponse::error(
                request_id,
                error_codes::INVALID_PARAMS,
                "Missing tools/call parameters",
            );
        };

        let Some(name) = params.get("name").and_then(Value::as_str) else {
            return JsonRpcResponse::error(
                request_id,
                error_codes::INVALID_PARAMS,
                "Missing tool name",
            );
        };

        let empty = json!({});
        let arguments = params.get("arguments").unwrap_or(&empty);
        debug!("tools/call: {name}");

        let outcome = self.dispatch_tool(name, arguments).await;

        match outcome {
            Ok(Some(tool_response)) => match serde_json::to_value(&tool_response) {
                Ok(result) => JsonRpcResponse::success(request_id, result),
                Err(_) => JsonRpcResponse::error(
                    request_id,
                    error_codes::INTERNAL_ERROR,
                    "Internal error",
                ),
            },
            Ok(None) => JsonRpcResponse::error(
                request_id,
                error_codes::METHOD_NOT_FOUND,
                format!("Tool not found: {name}"),
            ),
            Err(err) => JsonRpcResponse::error_with_data(
                request_id,
                err.code.jsonrpc_code(),
                err.message.clone(),
                json!({ "kind": err.code.as_str() }),
            ),
        }
    }

    /// Dispatch one tool by name. `Ok(None)` means the tool does not exist.
    async fn dispatch_tool(
        &self,
        name: &str,
        arguments: &Value,
    ) -> AppResult<Option<ToolResponse>> {
        let response = match name {
            tools::CONNECT_TO_WHOOP => self.connect().await,
            tools::GET_CONNECTION_STATUS => self.connection_status(),
            tools::DISCONNECT_WHOOP => self.disconnect().await,
            tools::GET_SLEEP_DATA => {
                let date = parse_date_arg(arguments)?;
                let api = Arc::clone(&self.api);
                let payload = self
                    .call_upstream(move |token| {
                        let api = Arc::clone(&api);
                        let date = date.clone();
                        async move { api.get_sleep(&token, date.as_deref()).await }
                    })
                    .await?;
                ToolResponse::text(formatters::format_sleep(&payload))
            }
            tools::GET_RECOVERY_DATA => {
                let date = parse_date_arg(arguments)?;
                let api = Arc::clone(&self.api);
                let payload = self
                    .call_upstream(move |token| {
                        let api = Arc::clone(&api);
                        let date = date.clone();
                        async move { api.get_recovery(&token, date.as_deref()).await }
                    })
                    .await?;
                ToolResponse::text(formatters::format_recovery(&payload))
            }
            tools::GET_WORKOUT_DATA => {
                let workout_id = optional_str_arg(arguments, json_fields::WORKOUT_ID);
                let api = Arc::clone(&self.api);
                let payload = self
                    .call_upstream(move |token| {
                        let api = Arc::clone(&api);
                        let workout_id = workout_id.clone();
                        async move { api.get_workout(&token, workout_id.as_deref()).await }
                    })
                    .await?;
                ToolResponse::text(formatters::format_workout(&payload))
            }
            tools::GET_CYCLE_DATA => {
                let date = parse_date_arg(arguments)?;
                let api = Arc::clone(&self.api);
                let payload = self
                    .call_upstream(move |token| {
                        let api = Arc::clone(&api);
                        let date = date.clone();
                        async move { api.get_cycle(&token, date.as_deref()).await }
                    })
                    .await?;
                ToolResponse::text(formatters::format_cycle(&payload))
            }
            tools::GET_PROFILE_DATA => {
                let api = Arc::clone(&self.api);
                let payload = self
                    .call_upstream(move |token| {
                        let api = Arc::clone(&api);
                        async move { api.get_profile(&token).await }
                    })
                    .await?;
                ToolResponse::text(formatters::format_profile(&payload))
            }
            tools::GET_BODY_MEASUREMENT_DATA => {
                let api = Arc::clone(&self.api);
                let payload = self
                    .call_upstream(move |token| {
                        let api = Arc::clone(&api);
                        async move { api.get_body_measurement(&token).await }
                    })
                    .await?;
                ToolResponse::text(formatters::format_body_measurement(&payload))
            }
            tools::GET_SPORTS_MAPPING => {
                let api = Arc::clone(&self.api);
                let payload = self
                    .call_upstream(move |token| {
                        let api = Arc::clone(&api);
                        async move {
                            api.list_workouts(&token, limits::SPORT_DISCOVERY_WORKOUT_LIMIT)
                                .await
                        }
                    })
                    .await?;
                ToolResponse::text(formatters::format_sports_mapping(&payload))
            }
            tools::SEARCH_WHOOP_SPORTS => {
                let query = arguments
                    .get(json_fields::QUERY)
                    .and_then(Value::as_str)
                    .ok_or_else(|| AppError::invalid_input("Missing required argument: query"))?;
                ToolResponse::text(formatters::search_sports(query))
            }
            _ => return Ok(None),
        };

        Ok(Some(response))
    }

    /// Issue an upstream call with a valid token, forcing at most one
    /// refresh-and-retry when the upstream rejects a token this router just
    /// validated.
    async fn call_upstream<F, Fut>(&self, operation: F) -> AppResult<Value>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<Value, ProviderError>>,
    {
        let record = self
            .oauth
            .ensure_valid_token(DEFAULT_PRINCIPAL)
            .await
            .map_err(AppError::from)?;

        match operation(record.access_token.clone()).await {
            Ok(payload) => Ok(payload),
            Err(ProviderError::Unauthorized) => {
                debug!("upstream rejected a just-validated token; forcing one refresh");
                let fresh = self
                    .oauth
                    .force_refresh(DEFAULT_PRINCIPAL, &record)
                    .await
                    .map_err(AppError::from)?;

                match operation(fresh.access_token.clone()).await {
                    Ok(payload) => Ok(payload),
                    Err(ProviderError::Unauthorized) => Err(AppError::not_authenticated(
                        "WHOOP rejected the access token after refresh; please re-authenticate",
                    )),
                    Err(other) => Err(other.into()),
                }
            }
            Err(other) => Err(other.into()),
        }
    }

    /// connect_to_whoop: begin the OAuth flow
    async fn connect(&self) -> ToolResponse {
        let authorization = self.oauth.begin_authorization(DEFAULT_PRINCIPAL).await;
        ToolResponse::text(format!(
            "{}\n\nAuthorization URL: {}\n\nThe link expires in {} minutes.",
            authorization.instructions,
            authorization.authorization_url,
            authorization.expires_in_minutes,
        ))
    }

    /// get_connection_status: report token presence and expiry
    fn connection_status(&self) -> ToolResponse {
        match self.oauth.cache().get(DEFAULT_PRINCIPAL) {
            Some(record) => ToolResponse::text(format!(
                "You are authenticated with WHOOP.\nToken expires at: {}\nScopes: {}",
                record.expires_at.to_rfc3339(),
                record.scope,
            )),
            None => ToolResponse::text(
                "You are not authenticated with WHOOP. Use the connect_to_whoop tool to \
                 authenticate.",
            ),
        }
    }

    /// disconnect_whoop: revoke and forget the stored token
    async fn disconnect(&self) -> ToolResponse {
        if self.oauth.disconnect(DEFAULT_PRINCIPAL).await {
            ToolResponse::text("WHOOP disconnected. The stored token has been removed.")
        } else {
            ToolResponse::text("No WHOOP connection to disconnect.")
        }
    }
}

/// Pull an optional string argument
fn optional_str_arg(arguments: &Value, key: &str) -> Option<String> {
    arguments
        .get(key)
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
}

/// Pull and validate the optional `date` argument (YYYY-MM-DD)
fn parse_date_arg(arguments: &Value) -> AppResult<Option<String>> {
    match optional_str_arg(arguments, json_fields::DATE) {
        None => Ok(None),
        Some(date) => {
            NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|_| {
                AppError::invalid_input(format!("Invalid date '{date}': expected YYYY-MM-DD"))
            })?;
            Ok(Some(date))
        }
    }
}
