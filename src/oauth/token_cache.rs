// ABOUTME: Per-principal token storage with atomic replace and invalidate semantics
// ABOUTME: The only mutable shared state in the process; all writes go through put/invalidate
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Token Cache
//!
//! `DashMap`-backed store keyed by principal. Operations on the same key are
//! linearizable (no reader ever observes a half-written record) and distinct
//! principals never block each other. In the single-operator deployment the
//! key collapses to [`crate::constants::DEFAULT_PRINCIPAL`].

use super::TokenRecord;
use dashmap::DashMap;

/// Atomic per-principal token store
#[derive(Default)]
pub struct TokenCache {
    records: DashMap<String, TokenRecord>,
}

impl TokenCache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the current record for a principal
    #[must_use]
    pub fn get(&self, principal: &str) -> Option<TokenRecord> {
        self.records.get(principal).map(|entry| entry.value().clone())
    }

    /// Atomically replace the record for a principal
    pub fn put(&self, principal: &str, record: TokenRecord) {
        self.records.insert(principal.to_owned(), record);
    }

    /// Remove the record for a principal
    pub fn invalidate(&self, principal: &str) {
        self.records.remove(principal);
    }

    /// Whether any record is stored for the principal
    #[must_use]
    pub fn contains(&self, principal: &str) -> bool {
        self.records.contains_key(principal)
    }
}
