// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Redirect targets and the navigator that performs them.

use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Views the auth gate can send a visitor to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Route {
    Login,
    PendingApproval,
    Rejected,
    Suspended,
    Dashboard,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::PendingApproval => "/pending-approval",
            Route::Rejected => "/registration-rejected",
            Route::Suspended => "/service-suspended",
            Route::Dashboard => "/dashboard",
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("Navigation to {route:?} failed: {message}")]
pub struct NavigationError {
    pub route: Route,
    pub message: String,
}

/// Performs redirects decided by the auth gate.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route) -> Result<(), NavigationError>;
}

/// Navigator that only records the redirect in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn navigate(&self, route: Route) -> Result<(), NavigationError> {
        tracing::info!(route = ?route, path = route.path(), "Redirecting");
        Ok(())
    }
}
