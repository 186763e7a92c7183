//! Wire protocol for the batido realtime ordering channel.
//!
//! Defines the generic text-frame [`Envelope`], the closed set of
//! [`DomainEvent`]s the gateway recognizes, outbound message constructors,
//! and the shared domain types (products, orders, credentials).
//!
//! Everything in this crate is pure data: no I/O, no async.

pub mod constants;
pub mod envelope;
pub mod error;
pub mod events;
pub mod types;

pub use envelope::Envelope;
pub use error::ProtocolError;
pub use events::{DomainEvent, EventCategory, Outbound};
pub use types::{Credentials, Extra, LineItem, Order, OrderStatus, Product, Role};
