//! Billing status and the suspension record shown after redirect.

use serde::{Deserialize, Serialize};

/// Billing block attached to a login response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingStatus {
    pub services_active: bool,
    #[serde(default)]
    pub suspension_reason: Option<String>,
    #[serde(default)]
    pub suspended_at: Option<String>,
    #[serde(default)]
    pub outstanding_amount: Option<f64>,
}

impl BillingStatus {
    pub fn is_suspended(&self) -> bool {
        !self.services_active
    }
}

/// What the suspended-service view needs, persisted in session storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuspensionInfo {
    pub reason: Option<String>,
    pub suspended_at: Option<String>,
    pub outstanding_amount: Option<f64>,
    /// When the dashboard recorded the suspension (RFC3339)
    pub recorded_at: String,
}

impl SuspensionInfo {
    pub fn from_billing(billing: &BillingStatus, recorded_at: String) -> Self {
        Self {
            reason: billing.suspension_reason.clone(),
            suspended_at: billing.suspended_at.clone(),
            outstanding_amount: billing.outstanding_amount,
            recorded_at,
        }
    }
}
