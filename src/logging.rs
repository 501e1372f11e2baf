// ABOUTME: Tracing subscriber initialization for production and development logging
// ABOUTME: Honors RUST_LOG first, then LOG_LEVEL, with a sane info default
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Logging setup built on `tracing-subscriber`.

use anyhow::Result;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the global tracing subscriber from the environment.
///
/// `RUST_LOG` wins when set; otherwise `LOG_LEVEL` (error/warn/info/debug/
/// trace) scopes the whole crate, defaulting to `info`.
///
/// # Errors
///
/// Returns an error if a subscriber is already installed.
pub fn init_from_env() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = std::env::var(crate::constants::env_vars::LOG_LEVEL)
            .unwrap_or_else(|_| "info".to_owned());
        EnvFilter::new(level)
    });

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing subscriber: {e}"))?;

    Ok(())
}
