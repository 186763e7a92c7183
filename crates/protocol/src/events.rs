//! Typed domain events and outbound message constructors.
//!
//! Payloads are validated once here, at the codec boundary. The rest of
//! the system only ever sees well-formed [`DomainEvent`]s.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::kind;
use crate::envelope::Envelope;
use crate::error::ProtocolError;
use crate::types::{Credentials, LineItem, Order, OrderStatus, Product};

/// Fan-out category an event belongs to. Subscribers register per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCategory {
    /// Session lifecycle (`auth.ok`).
    Connection,
    /// Catalog snapshots.
    Catalog,
    /// Order creation, status changes and snapshots.
    Orders,
    /// Informational acknowledgements.
    Ack,
}

/// A recognized, validated inbound event.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainEvent {
    AuthOk,
    CatalogUpdated(Vec<Product>),
    OrderCreated(Order),
    OrderStatusChanged { order_id: String, status: OrderStatus },
    OrdersSnapshot(Vec<Order>),
    OrderAck { order_id: String },
}

#[derive(Deserialize)]
struct CatalogPayload {
    products: Vec<Product>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusPayload {
    order_id: String,
    status: OrderStatus,
}

#[derive(Deserialize)]
struct SnapshotPayload {
    orders: Vec<Order>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AckPayload {
    order_id: String,
}

/// An `order.create` payload. Peers may send a full order or just the
/// items; id, timestamp and status are synthesized when absent.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IncomingOrder {
    #[serde(default)]
    id: Option<String>,
    items: Vec<LineItem>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    status: Option<OrderStatus>,
}

impl IncomingOrder {
    fn into_order(self) -> Order {
        Order {
            id: self
                .id
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            items: self.items,
            created_at: self.created_at.unwrap_or_else(Utc::now),
            status: self.status.unwrap_or(OrderStatus::Pending),
        }
    }
}

fn parse<T: for<'de> Deserialize<'de>>(
    kind: &'static str,
    data: &serde_json::Value,
) -> Result<T, ProtocolError> {
    serde_json::from_value(data.clone()).map_err(|source| ProtocolError::Payload { kind, source })
}

impl DomainEvent {
    /// Maps a decoded envelope to a domain event.
    ///
    /// Returns `Ok(None)` for unknown `type` values (forward compatible:
    /// they are ignored, not errors) and `Err` when a recognized type
    /// carries a structurally invalid payload.
    pub fn from_envelope(env: &Envelope) -> Result<Option<Self>, ProtocolError> {
        let event = match env.kind.as_str() {
            kind::AUTH_OK => DomainEvent::AuthOk,
            kind::CATALOG_UPDATED => {
                let p: CatalogPayload = parse(kind::CATALOG_UPDATED, &env.data)?;
                DomainEvent::CatalogUpdated(p.products)
            }
            kind::ORDER_CREATE => {
                let p: IncomingOrder = parse(kind::ORDER_CREATE, &env.data)?;
                DomainEvent::OrderCreated(p.into_order())
            }
            kind::ORDER_STATUS_CHANGED => {
                let p: StatusPayload = parse(kind::ORDER_STATUS_CHANGED, &env.data)?;
                DomainEvent::OrderStatusChanged {
                    order_id: p.order_id,
                    status: p.status,
                }
            }
            kind::ORDERS_SNAPSHOT => {
                let p: SnapshotPayload = parse(kind::ORDERS_SNAPSHOT, &env.data)?;
                DomainEvent::OrdersSnapshot(p.orders)
            }
            kind::ORDER_CREATED_ACK => {
                let p: AckPayload = parse(kind::ORDER_CREATED_ACK, &env.data)?;
                DomainEvent::OrderAck {
                    order_id: p.order_id,
                }
            }
            _ => return Ok(None),
        };
        Ok(Some(event))
    }

    /// The fan-out category this event is delivered to.
    pub fn category(&self) -> EventCategory {
        match self {
            DomainEvent::AuthOk => EventCategory::Connection,
            DomainEvent::CatalogUpdated(_) => EventCategory::Catalog,
            DomainEvent::OrderCreated(_)
            | DomainEvent::OrderStatusChanged { .. }
            | DomainEvent::OrdersSnapshot(_) => EventCategory::Orders,
            DomainEvent::OrderAck { .. } => EventCategory::Ack,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthPayload<'a> {
    jwt: &'a str,
    shop_id: &'a str,
    role: &'a str,
}

#[derive(Serialize)]
struct CreateOrderPayload<'a> {
    items: &'a [LineItem],
    total: f64,
}

#[derive(Serialize)]
struct CatalogBroadcast<'a> {
    products: &'a [Product],
}

/// Messages the gateway emits on the wire.
#[derive(Debug, Clone)]
pub enum Outbound {
    /// Authentication request, sent immediately after the transport opens.
    Auth(Credentials),
    /// A customer submitting a new order. The derived total rides along.
    CreateOrder { items: Vec<LineItem> },
    /// A cashier broadcasting the full catalog.
    CatalogUpdate(Vec<Product>),
}

impl Outbound {
    /// Frames the message as an envelope for the given shop.
    pub fn to_envelope(&self, shop_id: &str) -> Result<Envelope, ProtocolError> {
        let env = match self {
            Outbound::Auth(creds) => Envelope::new(
                kind::AUTH,
                Some(shop_id),
                serde_json::to_value(AuthPayload {
                    jwt: &creds.token,
                    shop_id: &creds.shop_id,
                    role: creds.role.as_wire(),
                })?,
            ),
            Outbound::CreateOrder { items } => Envelope::new(
                kind::ORDER_CREATE,
                Some(shop_id),
                serde_json::to_value(CreateOrderPayload {
                    items,
                    total: items.iter().map(LineItem::total).sum(),
                })?,
            ),
            Outbound::CatalogUpdate(products) => Envelope::new(
                kind::CATALOG_UPDATED,
                Some(shop_id),
                serde_json::to_value(CatalogBroadcast { products })?,
            ),
        };
        Ok(env)
    }
}
