//! User model and approval-state derivation.

use crate::models::billing::BillingStatus;
use crate::models::response::{id_string, opt_id_string};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Kind of account signing in to the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum UserType {
    Hospital,
    Operations,
    CollectionCenter,
    Rider,
}

/// Value of either the `status` or `network_status` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum AccountStatus {
    Active,
    Approved,
    PendingMainHospitalApproval,
    PendingHqApproval,
    Rejected,
    Suspended,
    #[serde(other)]
    Unknown,
}

/// Which approval a pending hospital is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingStage {
    MainHospital,
    Hq,
}

/// The single approval state a user is in, derived from `status` and `network_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalState {
    Active,
    Pending(PendingStage),
    Rejected,
    Suspended,
}

/// Signed-in user as returned by the login and profile endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct User {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    pub user_type: UserType,
    #[serde(default)]
    pub status: Option<AccountStatus>,
    /// Approval state of the hospital's parent network (hospital users only)
    #[serde(default)]
    pub network_status: Option<AccountStatus>,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub hospital_id: Option<String>,
    #[serde(default)]
    pub hospital_name: Option<String>,
}

impl User {
    /// Collapse `status` and `network_status` into one approval state.
    ///
    /// Suspension wins over everything, then rejection, then the earliest
    /// pending stage. Only hospital accounts go through approval.
    pub fn approval_state(&self) -> ApprovalState {
        let flags = [self.status, self.network_status];
        let has = |wanted: AccountStatus| flags.iter().any(|s| *s == Some(wanted));

        if has(AccountStatus::Suspended) {
            return ApprovalState::Suspended;
        }

        if self.user_type != UserType::Hospital {
            return ApprovalState::Active;
        }

        if has(AccountStatus::Rejected) {
            ApprovalState::Rejected
        } else if has(AccountStatus::PendingMainHospitalApproval) {
            ApprovalState::Pending(PendingStage::MainHospital)
        } else if has(AccountStatus::PendingHqApproval) {
            ApprovalState::Pending(PendingStage::Hq)
        } else {
            ApprovalState::Active
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }
}

/// Credentials posted to the login endpoint.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Body of a successful login.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: User,
    #[serde(default)]
    pub billing_status: Option<BillingStatus>,
}

/// Body of the profile endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileResponse {
    pub user: User,
}
