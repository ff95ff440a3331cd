// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! TransFleet dashboard client.
//!
//! Session gating and data fetching for the hospital sample-courier
//! operations dashboard: decides whether a signed-in user may reach the
//! dashboard (or must wait for approval, or is suspended) and keeps views
//! supplied with orders, riders, collection centers and SLA metrics.

pub mod config;
pub mod error;
pub mod fetch;
pub mod models;
pub mod navigation;
pub mod poll;
pub mod services;
pub mod session;
pub mod storage;
pub mod time_utils;
pub mod token;

pub use fetch::{FetchHandle, FetchOptions, FetchState};
pub use session::{GateState, Session, SessionContext};
