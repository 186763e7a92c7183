//! Domain types shared by both roles of the ordering channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role a connection authenticates as.
///
/// The wire keeps the legacy values `client` / `server`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "client")]
    Customer,
    #[serde(rename = "server")]
    Cashier,
}

impl Role {
    /// The string sent in the `auth` payload.
    pub fn as_wire(self) -> &'static str {
        match self {
            Role::Customer => "client",
            Role::Cashier => "server",
        }
    }
}

/// Credentials for authenticating the realtime connection.
///
/// Immutable once a connect is underway; a re-login replaces them wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub token: String,
    pub shop_id: String,
    pub role: Role,
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub image_name: String,
    #[serde(default)]
    pub base_price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// A per-unit extra added to a line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extra {
    pub name: String,
    pub price_per_unit: f64,
    pub count: u32,
}

impl Extra {
    pub fn subtotal(&self) -> f64 {
        f64::from(self.count) * self.price_per_unit
    }
}

/// One line of an order: a product plus its chosen extras.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: String,
    pub name: String,
    pub base_price: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extras: Vec<Extra>,
}

impl LineItem {
    /// Line total: base price plus every extra's subtotal.
    pub fn total(&self) -> f64 {
        self.base_price + self.extras.iter().map(Extra::subtotal).sum::<f64>()
    }
}

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "paid")]
    Paid,
}

/// An order as materialized by the order-list aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub items: Vec<LineItem>,
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
}

impl Order {
    /// Derived order total; never stored on the wire as authoritative.
    pub fn total(&self) -> f64 {
        self.items.iter().map(LineItem::total).sum()
    }
}
