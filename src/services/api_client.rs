// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! TransFleet backend HTTP client.
//!
//! Handles:
//! - Login and profile lookup
//! - Domain listings (orders, riders, collection centers, SLA metrics)
//! - Mapping of HTTP failures and response envelopes into [`ApiError`]

use crate::config::Config;
use crate::error::ApiError;
use crate::models::{
    ApiEnvelope, CollectionCenterPage, Hospital, ListQuery, LoginRequest, LoginResponse, Order,
    OrderPage, ProfileResponse, RiderPage, SlaMetrics, User,
};
use serde::Deserialize;
use std::time::Duration;
use validator::Validate;

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Stateless backend client. The bearer token is passed per call.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for `base_url` (e.g. `https://api.transfleet.example/api`).
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, DEFAULT_HTTP_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("failed building HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::with_timeout(config.api_url.clone(), config.request_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ─── Authentication ──────────────────────────────────────────────────────

    /// Exchange credentials for a bearer token.
    ///
    /// Credentials are validated locally first; a malformed email never
    /// reaches the backend.
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        request
            .validate()
            .map_err(|e| ApiError::Validation(first_validation_message(&e)))?;

        let url = format!("{}/auth/login", self.base_url);
        tracing::info!(email = %request.email, "Logging in");

        let response = self.http.post(&url).json(request).send().await?;

        match response.status().as_u16() {
            401 | 403 => {
                let message = error_message(response).await;
                Err(ApiError::InvalidCredentials(message))
            }
            _ => self.check_response_json(response).await,
        }
    }

    /// Fetch the profile belonging to `access_token`.
    pub async fn profile(&self, access_token: &str) -> Result<User, ApiError> {
        let url = format!("{}/auth/profile", self.base_url);
        let profile: ProfileResponse = self.get_json(&url, access_token, None).await?;
        Ok(profile.user)
    }

    // ─── Domain listings ─────────────────────────────────────────────────────

    pub async fn list_orders(
        &self,
        access_token: &str,
        query: &ListQuery,
    ) -> Result<OrderPage, ApiError> {
        let url = format!("{}/orders", self.base_url);
        self.get_envelope(&url, access_token, Some(query)).await
    }

    pub async fn get_order(&self, access_token: &str, order_id: &str) -> Result<Order, ApiError> {
        let url = format!(
            "{}/orders/{}",
            self.base_url,
            urlencoding::encode(order_id)
        );
        self.get_envelope(&url, access_token, None).await
    }

    pub async fn list_riders(
        &self,
        access_token: &str,
        query: &ListQuery,
    ) -> Result<RiderPage, ApiError> {
        let url = format!("{}/riders", self.base_url);
        self.get_envelope(&url, access_token, Some(query)).await
    }

    pub async fn list_collection_centers(
        &self,
        access_token: &str,
        query: &ListQuery,
    ) -> Result<CollectionCenterPage, ApiError> {
        let url = format!("{}/collection-centers", self.base_url);
        self.get_envelope(&url, access_token, Some(query)).await
    }

    pub async fn list_hospitals(&self, access_token: &str) -> Result<Vec<Hospital>, ApiError> {
        let url = format!("{}/hospitals", self.base_url);
        self.get_envelope(&url, access_token, None).await
    }

    pub async fn sla_metrics(&self, access_token: &str) -> Result<SlaMetrics, ApiError> {
        let url = format!("{}/sla/metrics", self.base_url);
        self.get_envelope(&url, access_token, None).await
    }

    // ─── Plumbing ────────────────────────────────────────────────────────────

    /// GET an endpoint wrapped in `{ success, data, error }`.
    async fn get_envelope<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        access_token: &str,
        query: Option<&ListQuery>,
    ) -> Result<T, ApiError> {
        let envelope: ApiEnvelope<T> = self.get_json(url, access_token, query).await?;
        envelope.into_result()
    }

    /// Generic GET request with JSON response.
    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        access_token: &str,
        query: Option<&ListQuery>,
    ) -> Result<T, ApiError> {
        let mut request = self.http.get(url).bearer_auth(access_token);
        if let Some(query) = query {
            request = request.query(query);
        }
        let response = request.send().await?;

        self.check_response_json(response).await
    }

    /// Check response status and parse the JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();

        if !status.is_success() {
            if status.as_u16() == 401 {
                return Err(ApiError::Unauthorized);
            }

            if status.as_u16() == 429 {
                tracing::warn!("TransFleet API rate limit hit (429)");
                return Err(ApiError::RateLimited);
            }

            let message = error_message(response).await;
            return Err(ApiError::Http {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Pull a message out of an error body shaped `{error:{message}}`, `{message}` or `{error:"..."}`.
async fn error_message(response: reqwest::Response) -> String {
    let body = response.text().await.unwrap_or_default();

    let Ok(value) = serde_json::from_str::<serde_json::Value>(&body) else {
        return body.trim().to_string();
    };

    value
        .pointer("/error/message")
        .or_else(|| value.get("message"))
        .or_else(|| value.get("error"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .unwrap_or_default()
}

fn first_validation_message(errors: &validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|errs| errs.iter())
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| "Invalid login details".to_string())
}
