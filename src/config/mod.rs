// ABOUTME: Configuration module organizing environment-based settings
// ABOUTME: All configuration is loaded once at startup; no runtime mutation path
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Configuration management.

pub mod environment;

pub use environment::{Environment, RateLimitConfig, ServerConfig, WhoopOAuthConfig};
