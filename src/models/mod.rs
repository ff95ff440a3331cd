// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the TransFleet backend.

pub mod billing;
pub mod logistics;
pub mod response;
pub mod sla;
pub mod user;

pub use billing::{BillingStatus, SuspensionInfo};
pub use logistics::{
    CollectionCenter, CollectionCenterPage, Hospital, ListQuery, Order, OrderPage, OrderStatus,
    Rider, RiderPage, RiderStatus,
};
pub use response::{ApiEnvelope, ErrorBody};
pub use sla::SlaMetrics;
pub use user::{
    AccountStatus, ApprovalState, LoginRequest, LoginResponse, PendingStage, ProfileResponse,
    User, UserType,
};
