// ABOUTME: MCP protocol schema definitions and tool schemas
// ABOUTME: Type-safe message shapes so the schema is never hardcoded as raw JSON
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! MCP Protocol Schema Definitions
//!
//! Type-safe definitions for MCP protocol messages, capabilities, and the
//! tool schemas this server exposes.

use crate::constants::{json_fields, protocol, tools};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Server information reported during initialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    /// Server name
    pub name: String,
    /// Server version
    pub version: String,
}

/// MCP server capabilities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerCapabilities {
    /// Tool support marker
    pub tools: HashMap<String, serde_json::Value>,
    /// Prompt support marker (none exposed)
    pub prompts: HashMap<String, serde_json::Value>,
    /// Resource support marker (none exposed)
    pub resources: HashMap<String, serde_json::Value>,
}

/// Response to the `initialize` request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeResponse {
    /// MCP protocol revision
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    /// Capability flags
    pub capabilities: ServerCapabilities,
    /// Server identity
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
}

impl InitializeResponse {
    /// Build the standard initialize response for this server
    #[must_use]
    pub fn new() -> Self {
        Self {
            protocol_version: protocol::MCP_PROTOCOL_VERSION.to_owned(),
            capabilities: ServerCapabilities {
                tools: HashMap::new(),
                prompts: HashMap::new(),
                resources: HashMap::new(),
            },
            server_info: ServerInfo {
                name: protocol::SERVER_NAME.to_owned(),
                version: protocol::SERVER_VERSION.to_owned(),
            },
        }
    }
}

impl Default for InitializeResponse {
    fn default() -> Self {
        Self::new()
    }
}

/// MCP tool schema definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Tool name
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// JSON schema of the tool arguments
    #[serde(rename = "inputSchema")]
    pub input_schema: JsonSchema,
}

/// JSON schema definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSchema {
    /// Schema type (always "object" for tool inputs)
    #[serde(rename = "type")]
    pub schema_type: String,
    /// Property definitions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<HashMap<String, PropertySchema>>,
    /// Required property names
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
}

/// JSON schema property definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertySchema {
    /// Property type
    #[serde(rename = "type")]
    pub property_type: String,
    /// Property description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Content types for MCP tool results
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Content {
    /// Plain text content
    #[serde(rename = "text")]
    Text {
        /// The text payload
        text: String,
    },
}

/// Tool response after execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResponse {
    /// Result content blocks
    pub content: Vec<Content>,
    /// Whether the result represents an error
    #[serde(rename = "isError")]
    pub is_error: bool,
}

impl ToolResponse {
    /// Successful text result
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![Content::Text { text: text.into() }],
            is_error: false,
        }
    }
}

/// All tool schemas exposed by this server
#[must_use]
pub fn get_tools() -> Vec<ToolSchema> {
    vec![
        create_connect_tool(),
        create_connection_status_tool(),
        create_disconnect_tool(),
        create_sleep_tool(),
        create_recovery_tool(),
        create_workout_tool(),
        create_cycle_tool(),
        create_profile_tool(),
        create_body_measurement_tool(),
        create_sports_mapping_tool(),
        create_search_sports_tool(),
    ]
}

fn no_arg_schema() -> JsonSchema {
    JsonSchema {
        schema_type: "object".into(),
        properties: Some(HashMap::new()),
        required: None,
    }
}

fn date_arg_schema() -> JsonSchema {
    let mut properties = HashMap::new();
    properties.insert(
        json_fields::DATE.to_owned(),
        PropertySchema {
            property_type: "string".into(),
            description: Some(
                "Optional date in YYYY-MM-DD format. If not provided, returns most recent data."
                    .into(),
            ),
        },
    );
    JsonSchema {
        schema_type: "object".into(),
        properties: Some(properties),
        required: None,
    }
}

fn create_connect_tool() -> ToolSchema {
    ToolSchema {
        name: tools::CONNECT_TO_WHOOP.into(),
        description:
            "Begin the WHOOP OAuth2 flow. Returns the authorization URL to visit in a browser."
                .into(),
        input_schema: no_arg_schema(),
    }
}

fn create_connection_status_tool() -> ToolSchema {
    ToolSchema {
        name: tools::GET_CONNECTION_STATUS.into(),
        description: "Check whether this server is authenticated with WHOOP.".into(),
        input_schema: no_arg_schema(),
    }
}

fn create_disconnect_tool() -> ToolSchema {
    ToolSchema {
        name: tools::DISCONNECT_WHOOP.into(),
        description: "Revoke the stored WHOOP token and forget the connection.".into(),
        input_schema: no_arg_schema(),
    }
}

fn create_sleep_tool() -> ToolSchema {
    ToolSchema {
        name: tools::GET_SLEEP_DATA.into(),
        description: "Get sleep data from WHOOP.".into(),
        input_schema: date_arg_schema(),
    }
}

fn create_recovery_tool() -> ToolSchema {
    ToolSchema {
        name: tools::GET_RECOVERY_DATA.into(),
        description: "Get recovery data from WHOOP.".into(),
        input_schema: date_arg_schema(),
    }
}

fn create_workout_tool() -> ToolSchema {
    let mut properties = HashMap::new();
    properties.insert(
        json_fields::WORKOUT_ID.to_owned(),
        PropertySchema {
            property_type: "string".into(),
            description: Some(
                "Optional workout ID. If not provided, returns the most recent workout.".into(),
            ),
        },
    );
    ToolSchema {
        name: tools::GET_WORKOUT_DATA.into(),
        description: "Get workout data from WHOOP.".into(),
        input_schema: JsonSchema {
            schema_type: "object".into(),
            properties: Some(properties),
            required: None,
        },
    }
}

fn create_cycle_tool() -> ToolSchema {
    ToolSchema {
        name: tools::GET_CYCLE_DATA.into(),
        description: "Get daily cycle data from WHOOP (includes strain).".into(),
        input_schema: date_arg_schema(),
    }
}

fn create_profile_tool() -> ToolSchema {
    ToolSchema {
        name: tools::GET_PROFILE_DATA.into(),
        description: "Get user profile data from WHOOP.".into(),
        input_schema: no_arg_schema(),
    }
}

fn create_body_measurement_tool() -> ToolSchema {
    ToolSchema {
        name: tools::GET_BODY_MEASUREMENT_DATA.into(),
        description: "Get body measurement data from WHOOP.".into(),
        input_schema: no_arg_schema(),
    }
}

fn create_sports_mapping_tool() -> ToolSchema {
    ToolSchema {
        name: tools::GET_SPORTS_MAPPING.into(),
        description: "List the sport IDs appearing in your recent WHOOP workout history.".into(),
        input_schema: no_arg_schema(),
    }
}

fn create_search_sports_tool() -> ToolSchema {
    let mut properties = HashMap::new();
    properties.insert(
        json_fields::QUERY.to_owned(),
        PropertySchema {
            property_type: "string".into(),
            description: Some("Search term to look up a WHOOP sport by name.".into()),
        },
    );
    ToolSchema {
        name: tools::SEARCH_WHOOP_SPORTS.into(),
        description: "Search the community mapping of WHOOP sport IDs.".into(),
        input_schema: JsonSchema {
            schema_type: "object".into(),
            properties: Some(properties),
            required: Some(vec![json_fields::QUERY.to_owned()]),
        },
    }
}
