//! SLA compliance metrics.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlaMetrics {
    #[serde(default)]
    pub total_orders: u64,
    #[serde(default)]
    pub on_time: u64,
    #[serde(default)]
    pub breached: u64,
    #[serde(default)]
    pub at_risk: u64,
    /// Average pickup-to-delivery time in minutes
    #[serde(default)]
    pub average_delivery_minutes: Option<f64>,
}

impl SlaMetrics {
    /// Share of completed orders delivered on time, as a percentage.
    pub fn compliance_rate(&self) -> Option<f64> {
        let completed = self.on_time + self.breached;
        if completed == 0 {
            return None;
        }
        Some(self.on_time as f64 * 100.0 / completed as f64)
    }
}
