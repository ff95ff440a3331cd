//! Courier network view models: orders, riders, collection centers, hospitals.
//!
//! These are transient: parsed per request and never cached beyond the
//! fetch handle that asked for them. Parsing is lenient so a backend that
//! adds or drops optional fields does not break the dashboard.

use crate::models::response::{id_string, opt_id_string};
use serde::{Deserialize, Serialize};

/// Lifecycle of a sample pickup order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Assigned,
    PickedUp,
    InTransit,
    Delivered,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    /// Orders still moving through the network.
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            OrderStatus::Pending
                | OrderStatus::Assigned
                | OrderStatus::PickedUp
                | OrderStatus::InTransit
        )
    }
}

/// A sample-courier order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub order_number: Option<String>,
    pub status: OrderStatus,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub hospital_id: Option<String>,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub center_id: Option<String>,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub rider_id: Option<String>,
    #[serde(default)]
    pub sample_type: Option<String>,
    #[serde(default)]
    pub sample_count: Option<u32>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub delivered_at: Option<String>,
    #[serde(default)]
    pub sla_deadline: Option<String>,
}

/// Page of orders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderPage {
    #[serde(default)]
    pub orders: Vec<Order>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub page: u32,
}

impl OrderPage {
    pub fn open_orders(&self) -> usize {
        self.orders.iter().filter(|o| o.status.is_open()).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiderStatus {
    Available,
    Busy,
    Offline,
    #[serde(other)]
    Unknown,
}

/// Courier rider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rider {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub status: RiderStatus,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub center_id: Option<String>,
    #[serde(default)]
    pub active_orders: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiderPage {
    #[serde(default)]
    pub riders: Vec<Rider>,
    #[serde(default)]
    pub total: u64,
}

/// Laboratory collection center receiving samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionCenter {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub rider_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionCenterPage {
    #[serde(default)]
    pub centers: Vec<CollectionCenter>,
    #[serde(default)]
    pub total: u64,
}

/// Hospital record referenced by orders and users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hospital {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub main_hospital_id: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
}

/// Paging and filter parameters for list endpoints.
///
/// Also the dependency value of list fetchers: changing any field
/// re-triggers the (debounced) fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListQuery {
    pub page: u32,
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 20,
            status: None,
            search: None,
        }
    }
}

impl ListQuery {
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }
}
