// ABOUTME: WHOOP developer API client for sleep, recovery, workout, cycle, and profile data
// ABOUTME: Attaches bearer tokens and maps upstream failures onto the provider taxonomy
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # WHOOP Data API
//!
//! Read-only access to the WHOOP developer API. The router talks to the
//! [`WhoopApi`] trait so tests can substitute a mock upstream; the concrete
//! client issues HTTPS calls through the shared pooled `reqwest` client.

use super::http_client::shared_client;
use super::ProviderError;
use crate::constants::whoop;
use serde_json::Value;
use tracing::debug;

/// Seam between the tool router and the WHOOP data API
#[async_trait::async_trait]
pub trait WhoopApi: Send + Sync {
    /// Sleep sessions, optionally narrowed to one day
    async fn get_sleep(&self, access_token: &str, date: Option<&str>)
        -> Result<Value, ProviderError>;

    /// Recovery scores, optionally narrowed to one day
    async fn get_recovery(
        &self,
        access_token: &str,
        date: Option<&str>,
    ) -> Result<Value, ProviderError>;

    /// One workout by id, or the most recent workout
    async fn get_workout(
        &self,
        access_token: &str,
        workout_id: Option<&str>,
    ) -> Result<Value, ProviderError>;

    /// Recent workouts, newest first
    async fn list_workouts(&self, access_token: &str, limit: u32)
        -> Result<Value, ProviderError>;

    /// Physiological cycles, optionally narrowed to one day
    async fn get_cycle(&self, access_token: &str, date: Option<&str>)
        -> Result<Value, ProviderError>;

    /// Basic user profile
    async fn get_profile(&self, access_token: &str) -> Result<Value, ProviderError>;

    /// Height, weight, and max heart rate
    async fn get_body_measurement(&self, access_token: &str) -> Result<Value, ProviderError>;
}

/// HTTPS client for the WHOOP developer API
pub struct WhoopApiClient {
    base_url: String,
}

impl Default for WhoopApiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl WhoopApiClient {
    /// Client against the production API base
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_url: whoop::API_BASE.to_owned(),
        }
    }

    /// Client against a custom API base
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    async fn get_json(&self, access_token: &str, path: &str) -> Result<Value, ProviderError> {
        let url = format!("{}{path}", self.base_url);
        debug!("WHOOP API request: GET {path}");

        let response = shared_client()
            .get(&url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 401 {
            return Err(ProviderError::Unauthorized);
        }
        if status.is_client_error() {
            return Err(ProviderError::Rejected {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(ProviderError::Unavailable(format!(
                "upstream returned HTTP {status}"
            )));
        }

        response
            .json()
            .await
            .map_err(|_| ProviderError::Unavailable("malformed upstream response".to_owned()))
    }
}

/// Build the query string narrowing a collection endpoint to one day
fn day_window_query(date: Option<&str>) -> String {
    date.map_or_else(String::new, |day| {
        format!(
            "?start={}&end={}&limit=1",
            urlencoding::encode(&format!("{day}T00:00:00Z")),
            urlencoding::encode(&format!("{day}T23:59:59Z")),
        )
    })
}

#[async_trait::async_trait]
impl WhoopApi for WhoopApiClient {
    async fn get_sleep(
        &self,
        access_token: &str,
        date: Option<&str>,
    ) -> Result<Value, ProviderError> {
        let path = format!("/v1/activity/sleep{}", day_window_query(date));
        self.get_json(access_token, &path).await
    }

    async fn get_recovery(
        &self,
        access_token: &str,
        date: Option<&str>,
    ) -> Result<Value, ProviderError> {
        let path = format!("/v1/recovery{}", day_window_query(date));
        self.get_json(access_token, &path).await
    }

    async fn get_workout(
        &self,
        access_token: &str,
        workout_id: Option<&str>,
    ) -> Result<Value, ProviderError> {
        let path = workout_id.map_or_else(
            || "/v1/activity/workout?limit=1".to_owned(),
            |id| format!("/v1/activity/workout/{}", urlencoding::encode(id)),
        );
        self.get_json(access_token, &path).await
    }

    async fn list_workouts(
        &self,
        access_token: &str,
        limit: u32,
    ) -> Result<Value, ProviderError> {
        let path = format!("/v1/activity/workout?limit={limit}");
        self.get_json(access_token, &path).await
    }

    async fn get_cycle(
        &self,
        access_token: &str,
        date: Option<&str>,
    ) -> Result<Value, ProviderError> {
        let path = format!("/v1/cycle{}", day_window_query(date));
        self.get_json(access_token, &path).await
    }

    async fn get_profile(&self, access_token: &str) -> Result<Value, ProviderError> {
        self.get_json(access_token, "/v1/user/profile/basic").await
    }

    async fn get_body_measurement(&self, access_token: &str) -> Result<Value, ProviderError> {
        self.get_json(access_token, "/v1/user/measurement/body")
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_window_query_with_date() {
        let query = day_window_query(Some("2024-05-20"));
        assert!(query.starts_with('?'));
        assert!(query.contains("start=2024-05-20T00%3A00%3A00Z"));
        assert!(query.contains("end=2024-05-20T23%3A59%3A59Z"));
        assert!(query.contains("limit=1"));
    }

    #[test]
    fn test_day_window_query_without_date() {
        assert_eq!(day_window_query(None), "");
    }
}
