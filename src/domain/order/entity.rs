use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value_objects::OrderStatus;

// ============================================================================
// Order Entity - Persisted Record
// ============================================================================

/// Partition used when no other partition key is configured.
pub const DEFAULT_PARTITION_KEY: &str = "orders";

/// A stored restaurant order.
///
/// `version` is the optimistic-concurrency token: stores write `1` on create
/// and accept a replace only when the caller's version matches the stored one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub quantity: i32,
    pub status: OrderStatus,
    pub partition_key: String,
    #[serde(default)]
    pub version: i64,
}

impl Order {
    /// Build a brand new order with a generated id
    pub fn new(
        partition_key: impl Into<String>,
        title: Option<String>,
        description: Option<String>,
        quantity: i32,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            description,
            quantity,
            status: OrderStatus::Created,
            partition_key: partition_key.into(),
            version: 0,
        }
    }

    /// Blank candidate carrying only an id, as sent by a complete request
    #[allow(dead_code)]
    pub fn with_id(id: impl Into<String>, partition_key: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            description: None,
            quantity: 0,
            status: OrderStatus::Created,
            partition_key: partition_key.into(),
            version: 0,
        }
    }

    #[allow(dead_code)]
    pub fn view(&self) -> OrderView {
        OrderView::from(self)
    }
}

// ============================================================================
// Order View - Client Projection
// ============================================================================

/// Read-only projection pushed to clients. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub quantity: i32,
    pub status: OrderStatus,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.clone(),
            title: order.title.clone(),
            description: order.description.clone(),
            quantity: order.quantity,
            status: order.status,
        }
    }
}

/// Project a set of orders and serialize them as the `ReceiveOrders` payload
pub fn orders_payload(orders: &[Order]) -> Result<String, serde_json::Error> {
    let views: Vec<OrderView> = orders.iter().map(OrderView::from).collect();
    serde_json::to_string(&views)
}
