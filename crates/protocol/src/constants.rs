//! Protocol constants shared between the gateway and its peers.

use std::time::Duration;

/// Event kind strings carried in the envelope `type` field.
pub mod kind {
    /// Outbound authentication request.
    pub const AUTH: &str = "auth";
    /// Peer acknowledged authentication; the session is live.
    pub const AUTH_OK: &str = "auth.ok";
    /// Full catalog broadcast (replace, not merge).
    pub const CATALOG_UPDATED: &str = "catalog.updated";
    /// A new order, either outbound from a customer or inbound to a cashier.
    pub const ORDER_CREATE: &str = "order.create";
    /// Status mutation for an existing order.
    pub const ORDER_STATUS_CHANGED: &str = "order.status_changed";
    /// Full order-list snapshot (replace, newest first).
    pub const ORDERS_SNAPSHOT: &str = "orders.snapshot";
    /// Informational acknowledgement that an order was accepted.
    pub const ORDER_CREATED_ACK: &str = "order.created_ack";
}

/// Interval between keep-alive pings once a session is live.
pub const PING_PERIOD: Duration = Duration::from_secs(20);

/// How long the connection may stay silent before it is considered dead.
/// Must be longer than [`PING_PERIOD`] so a healthy peer can answer.
pub const PONG_WAIT: Duration = Duration::from_secs(60);

/// Maximum accepted text frame size. Oversized frames are dropped.
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Reconnection attempts cap; the backoff delay saturates here.
pub const MAX_BACKOFF_ATTEMPT: u32 = 6;
