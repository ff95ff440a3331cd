// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! TransFleet operations dashboard (terminal).
//!
//! Signs in (or restores the stored session), runs the auth gate and, for
//! active accounts, keeps the live order list and SLA metrics refreshed
//! until interrupted.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use transfleet_dashboard::{
    config::Config,
    models::ListQuery,
    navigation::TracingNavigator,
    poll::Scope,
    services::{ApiClient, DashboardService},
    storage::{FileStorage, MemoryStorage},
    time_utils::SystemClock,
    FetchHandle, FetchOptions, GateState, SessionContext,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    let api = ApiClient::from_config(&config)?;
    tracing::info!(api_url = %api.base_url(), "Starting TransFleet dashboard");
    let local = FileStorage::open(&config.storage_dir)?;
    tracing::info!(path = %local.path().display(), "Local storage opened");

    let session = Arc::new(SessionContext::new(
        api,
        Arc::new(local),
        Arc::new(MemoryStorage::new()),
        Arc::new(SystemClock),
        Arc::new(TracingNavigator),
    ));

    let gate = match config.credentials() {
        Some((email, password)) => match session.login(email, password).await {
            Ok(gate) => gate,
            Err(e) => {
                tracing::error!(error = %e, "Login failed");
                return Ok(());
            }
        },
        None => session.initialize().await,
    };

    match gate {
        GateState::Active => {}
        GateState::Suspended => {
            tracing::warn!(suspension = ?session.suspension_info(), "Dashboard services are suspended");
            return Ok(());
        }
        other => {
            tracing::info!(gate = ?other, "Dashboard not available for this account");
            return Ok(());
        }
    }

    let dashboard = DashboardService::new(session.clone());
    let options = FetchOptions::from_config(&config);
    let scope = Scope::new();

    let orders = {
        let dashboard = dashboard.clone();
        FetchHandle::mount(
            session.subscribe(),
            ListQuery::default(),
            options,
            move |query: ListQuery| {
                let dashboard = dashboard.clone();
                async move { dashboard.list_orders(&query).await }
            },
        )
    };

    let sla = {
        let dashboard = dashboard.clone();
        FetchHandle::mount_once(session.subscribe(), options, move || {
            let dashboard = dashboard.clone();
            async move { dashboard.sla_metrics().await }
        })
    };

    let _orders_poller = orders.poll_every(&scope, config.poll_interval);
    let _sla_poller = sla.poll_every(&scope, config.poll_interval);

    let mut orders_rx = orders.subscribe();
    let mut sla_rx = sla.subscribe();
    let mut gate_rx = session.subscribe_gate();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, shutting down");
                break;
            }
            Ok(()) = orders_rx.changed() => {
                let state = orders_rx.borrow_and_update().clone();
                match (&state.data, &state.error) {
                    (_, Some(error)) => tracing::warn!(error = %error, "Order list unavailable"),
                    (Some(page), None) if !state.loading => tracing::info!(
                        total = page.total,
                        open = page.open_orders(),
                        "Orders refreshed"
                    ),
                    _ => {}
                }
            }
            Ok(()) = sla_rx.changed() => {
                let state = sla_rx.borrow_and_update().clone();
                if let (Some(metrics), false) = (&state.data, state.loading) {
                    tracing::info!(
                        on_time = metrics.on_time,
                        breached = metrics.breached,
                        at_risk = metrics.at_risk,
                        compliance = ?metrics.compliance_rate(),
                        "SLA metrics refreshed"
                    );
                }
            }
            Ok(()) = gate_rx.changed() => {
                let gate = *gate_rx.borrow_and_update();
                if gate != GateState::Active {
                    tracing::warn!(gate = ?gate, "Session no longer active, stopping");
                    break;
                }
            }
        }
    }

    scope.cancel();
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("transfleet_dashboard=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
