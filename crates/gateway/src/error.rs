//! Error types for the gateway.

use tokio_tungstenite::tungstenite;

/// Errors surfaced by the [`Gateway`](crate::Gateway) facade.
///
/// Transport faults are recovered internally by the reconnection loop;
/// these values only reach callers of `connect` and `send`.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("WebSocket error: {0}")]
    Ws(#[from] tungstenite::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] batido_protocol::ProtocolError),

    /// `send` was called while the session is not live.
    #[error("not connected")]
    NotConnected,

    /// The connection went away underneath an in-flight call.
    #[error("connection closed")]
    Closed,
}
