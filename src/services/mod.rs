// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - backend access layer.

pub mod api_client;
pub mod dashboard;

pub use api_client::ApiClient;
pub use dashboard::DashboardService;
