// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session context and auth gate.
//!
//! Decides whether a visitor may reach the dashboard, and otherwise which
//! view they are redirected to:
//!
//! ```text
//! Checking ──(no/invalid token, profile error)──▶ Unauthenticated ─▶ /login
//!     │
//!     └──(profile or login ok)──▶ Suspended        ─▶ /service-suspended
//!                               ├▶ Rejected         ─▶ /registration-rejected
//!                               ├▶ Pending(stage)   ─▶ /pending-approval
//!                               └▶ Active           ─▶ /dashboard
//! ```
//!
//! Session and gate state are published on `watch` channels so fetch
//! handles can follow authentication changes.

use crate::error::ApiError;
use crate::models::{ApprovalState, BillingStatus, LoginRequest, PendingStage, SuspensionInfo, User};
use crate::navigation::{Navigator, Route};
use crate::services::ApiClient;
use crate::storage::{Storage, SUSPENSION_KEY, TOKEN_KEY};
use crate::time_utils::{format_utc_rfc3339, Clock};
use crate::token::{check_token, TokenStatus};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Snapshot of who is signed in.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Session {
    pub user: Option<User>,
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl Session {
    /// Authenticated and not in the middle of resolving.
    pub fn is_ready(&self) -> bool {
        self.is_authenticated && !self.is_loading
    }
}

/// Where the gate currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Checking,
    Unauthenticated,
    Pending(PendingStage),
    Rejected,
    Active,
    Suspended,
}

impl GateState {
    /// The view this state sends the visitor to; `None` while still checking.
    pub fn route(&self) -> Option<Route> {
        match self {
            GateState::Checking => None,
            GateState::Unauthenticated => Some(Route::Login),
            GateState::Pending(_) => Some(Route::PendingApproval),
            GateState::Rejected => Some(Route::Rejected),
            GateState::Active => Some(Route::Dashboard),
            GateState::Suspended => Some(Route::Suspended),
        }
    }

    fn from_approval(state: ApprovalState) -> Self {
        match state {
            ApprovalState::Active => GateState::Active,
            ApprovalState::Pending(stage) => GateState::Pending(stage),
            ApprovalState::Rejected => GateState::Rejected,
            ApprovalState::Suspended => GateState::Suspended,
        }
    }
}

/// Explicit session object shared by the gate and every fetch handle.
pub struct SessionContext {
    api: ApiClient,
    local: Arc<dyn Storage>,
    session_storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
    navigator: Arc<dyn Navigator>,
    session: watch::Sender<Session>,
    gate: watch::Sender<GateState>,
}

impl SessionContext {
    pub fn new(
        api: ApiClient,
        local: Arc<dyn Storage>,
        session_storage: Arc<dyn Storage>,
        clock: Arc<dyn Clock>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let initial = Session {
            is_loading: true,
            ..Session::default()
        };

        Self {
            api,
            local,
            session_storage,
            clock,
            navigator,
            session: watch::Sender::new(initial),
            gate: watch::Sender::new(GateState::Checking),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn session(&self) -> Session {
        self.session.borrow().clone()
    }

    pub fn gate_state(&self) -> GateState {
        *self.gate.borrow()
    }

    /// Follow session changes (used by fetch handles).
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.session.subscribe()
    }

    pub fn subscribe_gate(&self) -> watch::Receiver<GateState> {
        self.gate.subscribe()
    }

    /// The stored bearer token, if it passes the local check.
    pub fn bearer_token(&self) -> Option<String> {
        let token = self.read_token()?;
        check_token(&token, self.clock.now())
            .is_valid()
            .then_some(token)
    }

    /// Suspension details recorded at login, for the suspended-service view.
    pub fn suspension_info(&self) -> Option<SuspensionInfo> {
        let raw = match self.session_storage.get(SUSPENSION_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read suspension info");
                return None;
            }
        };

        serde_json::from_str(&raw)
            .map_err(|e| tracing::warn!(error = %e, "Discarding unreadable suspension info"))
            .ok()
    }

    // ─── Gate operations ─────────────────────────────────────────────────────

    /// Resolve the stored session on startup.
    ///
    /// A missing, malformed or expired token is cleared without any network
    /// call. A profile fetch failure is treated the same as no token.
    pub async fn initialize(&self) -> GateState {
        self.gate.send_replace(GateState::Checking);
        self.session.send_modify(|s| s.is_loading = true);

        let Some(token) = self.read_token() else {
            tracing::debug!("No stored session token");
            return self.become_unauthenticated();
        };

        match check_token(&token, self.clock.now()) {
            TokenStatus::Valid(_) => {}
            TokenStatus::Malformed => {
                tracing::info!("Stored session token is malformed, clearing");
                self.clear_token();
                return self.become_unauthenticated();
            }
            TokenStatus::Expired { expired_at } => {
                tracing::info!(expired_at, "Stored session token has expired, clearing");
                self.clear_token();
                return self.become_unauthenticated();
            }
        }

        match self.api.profile(&token).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, user_type = ?user.user_type, "Session restored");
                self.set_user(user.clone());
                self.resolve(&user, None)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Profile fetch failed, treating session as signed out");
                self.clear_token();
                self.become_unauthenticated()
            }
        }
    }

    /// Sign in with email and password.
    ///
    /// On failure the error message is published on the session and any
    /// previously signed-in user stays signed in.
    pub async fn login(&self, email: &str, password: &str) -> Result<GateState, ApiError> {
        self.session.send_modify(|s| {
            // A signed-in user keeps their session while trying another login
            s.is_loading = !s.is_authenticated;
            s.error = None;
        });

        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };

        let response = match self.api.login(&request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, email = %request.email, "Login failed");
                let message = e.user_message();
                self.session.send_modify(|s| {
                    s.is_loading = false;
                    s.error = Some(message);
                });
                return Err(e);
            }
        };

        if let Err(e) = self.local.set(TOKEN_KEY, &response.access_token) {
            tracing::error!(error = %e, "Failed to persist session token");
            let err = ApiError::from(e);
            let message = err.user_message();
            self.session.send_modify(|s| {
                s.is_loading = false;
                s.error = Some(message);
            });
            return Err(err);
        }

        tracing::info!(
            user_id = %response.user.id,
            user = %response.user.display_name(),
            user_type = ?response.user.user_type,
            "Login successful"
        );

        // A fresh login carries its own billing status
        self.clear_suspension();
        self.set_user(response.user.clone());
        Ok(self.resolve(&response.user, response.billing_status.as_ref()))
    }

    /// Sign out and return to the login view.
    pub fn logout(&self) {
        self.clear_token();
        self.clear_suspension();
        tracing::info!("Logged out");
        self.become_unauthenticated();
    }

    /// Re-fetch the profile and re-run the gate, e.g. after an approval.
    pub async fn refresh_profile(&self) -> Result<GateState, ApiError> {
        let token = self.bearer_token().ok_or(ApiError::Unauthorized)?;

        match self.api.profile(&token).await {
            Ok(user) => {
                self.set_user(user.clone());
                Ok(self.resolve(&user, None))
            }
            Err(e) if e.is_auth_error() => {
                self.invalidate();
                Err(e)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Profile refresh failed");
                Err(e)
            }
        }
    }

    /// Drop a session the backend no longer accepts.
    pub fn invalidate(&self) {
        if !self.session.borrow().is_authenticated {
            return;
        }
        tracing::info!("Session token rejected by backend, signing out");
        self.clear_token();
        self.become_unauthenticated();
    }

    // ─── Internals ───────────────────────────────────────────────────────────

    fn read_token(&self) -> Option<String> {
        match self.local.get(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.trim().is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read session token");
                None
            }
        }
    }

    fn clear_token(&self) {
        if let Err(e) = self.local.remove(TOKEN_KEY) {
            tracing::warn!(error = %e, "Failed to clear session token");
        }
    }

    fn clear_suspension(&self) {
        if let Err(e) = self.session_storage.remove(SUSPENSION_KEY) {
            tracing::warn!(error = %e, "Failed to clear suspension info");
        }
    }

    fn set_user(&self, user: User) {
        self.session.send_replace(Session {
            user: Some(user),
            is_authenticated: true,
            is_loading: false,
            error: None,
        });
    }

    fn become_unauthenticated(&self) -> GateState {
        self.session.send_replace(Session::default());
        self.enter(GateState::Unauthenticated)
    }

    /// Classify a signed-in user. Billing suspension is checked before approval.
    ///
    /// Without a billing status (profile restore or refresh), a suspension
    /// recorded at login in this session still holds.
    fn resolve(&self, user: &User, billing: Option<&BillingStatus>) -> GateState {
        if let Some(billing) = billing.filter(|b| b.is_suspended()) {
            tracing::warn!(
                user_id = %user.id,
                reason = ?billing.suspension_reason,
                "Services suspended for billing"
            );
            self.persist_suspension(billing);
            return self.enter(GateState::Suspended);
        }

        if billing.is_none() && self.suspension_info().is_some() {
            tracing::info!(user_id = %user.id, "Billing suspension still recorded");
            return self.enter(GateState::Suspended);
        }

        self.enter(GateState::from_approval(user.approval_state()))
    }

    fn persist_suspension(&self, billing: &BillingStatus) {
        let info = SuspensionInfo::from_billing(billing, format_utc_rfc3339(self.clock.now()));

        let stored = serde_json::to_string(&info)
            .map_err(|e| e.to_string())
            .and_then(|raw| {
                self.session_storage
                    .set(SUSPENSION_KEY, &raw)
                    .map_err(|e| e.to_string())
            });

        if let Err(e) = stored {
            tracing::error!(error = %e, "Failed to persist suspension info");
        }
    }

    /// Publish the new gate state and perform its redirect.
    fn enter(&self, state: GateState) -> GateState {
        let previous = self.gate.send_replace(state);
        if previous != state {
            tracing::info!(from = ?previous, to = ?state, "Auth gate transition");
        }

        let Some(route) = state.route() else {
            return state;
        };

        if let Err(e) = self.navigator.navigate(route) {
            tracing::error!(error = %e, "Redirect failed");
            if route != Route::Login && route != Route::Dashboard {
                // Navigation fails open
                if let Err(e) = self.navigator.navigate(Route::Dashboard) {
                    tracing::error!(error = %e, "Fallback redirect to dashboard failed");
                }
            }
        }

        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::NavigationError;
    use crate::storage::MemoryStorage;
    use crate::time_utils::FixedClock;
    use chrono::Utc;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FlakyNavigator {
        visited: Mutex<Vec<Route>>,
    }

    impl Navigator for FlakyNavigator {
        fn navigate(&self, route: Route) -> Result<(), NavigationError> {
            self.visited.lock().unwrap().push(route);
            if route == Route::Suspended {
                return Err(NavigationError {
                    route,
                    message: "view not registered".to_string(),
                });
            }
            Ok(())
        }
    }

    fn context(navigator: Arc<FlakyNavigator>) -> (SessionContext, Arc<MemoryStorage>) {
        // Nothing listens here; tests below never reach the network
        let api = ApiClient::new("http://127.0.0.1:9").unwrap();
        let local = Arc::new(MemoryStorage::new());
        let ctx = SessionContext::new(
            api,
            local.clone(),
            Arc::new(MemoryStorage::new()),
            Arc::new(FixedClock::new(Utc::now())),
            navigator,
        );
        (ctx, local)
    }

    #[tokio::test]
    async fn test_initialize_without_token() {
        let navigator = Arc::new(FlakyNavigator::default());
        let (ctx, _) = context(navigator.clone());

        assert_eq!(ctx.gate_state(), GateState::Checking);
        assert_eq!(ctx.initialize().await, GateState::Unauthenticated);

        let session = ctx.session();
        assert!(!session.is_authenticated);
        assert!(!session.is_loading);
        assert_eq!(*navigator.visited.lock().unwrap(), vec![Route::Login]);
    }

    #[tokio::test]
    async fn test_initialize_clears_malformed_token() {
        let navigator = Arc::new(FlakyNavigator::default());
        let (ctx, local) = context(navigator);
        local.set(TOKEN_KEY, "definitely-not-a-jwt").unwrap();

        assert_eq!(ctx.initialize().await, GateState::Unauthenticated);
        assert_eq!(local.get(TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn test_failed_redirect_falls_back_to_dashboard() {
        let navigator = Arc::new(FlakyNavigator::default());
        let (ctx, _) = context(navigator.clone());

        assert_eq!(ctx.enter(GateState::Suspended), GateState::Suspended);
        assert_eq!(
            *navigator.visited.lock().unwrap(),
            vec![Route::Suspended, Route::Dashboard]
        );
    }

    #[test]
    fn test_gate_routes() {
        assert_eq!(GateState::Checking.route(), None);
        assert_eq!(
            GateState::Pending(PendingStage::Hq).route(),
            Some(Route::PendingApproval)
        );
        assert_eq!(GateState::Suspended.route(), Some(Route::Suspended));
    }
}
