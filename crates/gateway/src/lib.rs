//! Realtime session gateway for the batido ordering channel.
//!
//! Owns a single persistent WebSocket to the backend, authenticates it
//! with a role, keeps it alive with periodic pings, decodes the typed
//! event protocol and fans events out to in-process subscribers.
//! Transport failures are recovered with capped exponential backoff;
//! an explicit [`Gateway::disconnect`] is terminal until the next
//! [`Gateway::connect`].

pub mod config;
pub mod error;
pub mod gateway;
pub mod router;
pub mod types;

mod pumps;
mod reconnect;
mod transport;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use gateway::Gateway;
pub use router::{EventHandler, Router};
pub use types::{ConnectionState, GatewayEvent};
