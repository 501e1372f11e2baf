// ABOUTME: MCP protocol module organizing schema, core handlers, and the tool router
// ABOUTME: Transport-agnostic; the HTTP and WebSocket routes feed the same entry point
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Model Context Protocol implementation.

pub mod protocol;
pub mod router;
pub mod schema;

pub use router::ToolRouter;
