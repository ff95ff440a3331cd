// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authorised domain reads on behalf of the current session.

use crate::error::ApiError;
use crate::models::{
    CollectionCenterPage, Hospital, ListQuery, Order, OrderPage, RiderPage, SlaMetrics,
};
use crate::services::ApiClient;
use crate::session::SessionContext;
use std::sync::Arc;

/// High-level service pairing the API client with the session token.
///
/// A call the backend rejects as unauthorised signs the session out, so
/// the gate sends the visitor back to the login view.
#[derive(Clone)]
pub struct DashboardService {
    session: Arc<SessionContext>,
}

impl DashboardService {
    pub fn new(session: Arc<SessionContext>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    pub async fn list_orders(&self, query: &ListQuery) -> Result<OrderPage, ApiError> {
        let token = self.token()?;
        self.checked(self.client().list_orders(&token, query).await)
    }

    pub async fn get_order(&self, order_id: &str) -> Result<Order, ApiError> {
        let token = self.token()?;
        self.checked(self.client().get_order(&token, order_id).await)
    }

    pub async fn list_riders(&self, query: &ListQuery) -> Result<RiderPage, ApiError> {
        let token = self.token()?;
        self.checked(self.client().list_riders(&token, query).await)
    }

    pub async fn list_collection_centers(
        &self,
        query: &ListQuery,
    ) -> Result<CollectionCenterPage, ApiError> {
        let token = self.token()?;
        self.checked(self.client().list_collection_centers(&token, query).await)
    }

    pub async fn list_hospitals(&self) -> Result<Vec<Hospital>, ApiError> {
        let token = self.token()?;
        self.checked(self.client().list_hospitals(&token).await)
    }

    pub async fn sla_metrics(&self) -> Result<SlaMetrics, ApiError> {
        let token = self.token()?;
        self.checked(self.client().sla_metrics(&token).await)
    }

    fn client(&self) -> &ApiClient {
        self.session.api()
    }

    /// Bearer token for the next call. A token that expired mid-session
    /// signs the session out without a round trip.
    fn token(&self) -> Result<String, ApiError> {
        let token = self.session.bearer_token();
        if token.is_none() {
            self.session.invalidate();
        }
        token.ok_or(ApiError::Unauthorized)
    }

    fn checked<T>(&self, result: Result<T, ApiError>) -> Result<T, ApiError> {
        if let Err(e) = &result {
            if e.is_auth_error() {
                self.session.invalidate();
            }
        }
        result
    }
}
