//! In-process aggregates fed by the batido gateway.
//!
//! Each store independently materializes state from the event
//! categories it cares about. Stores are cheap-to-clone handles over
//! shared state, so a clone can live inside a gateway subscription
//! while the original backs the presentation layer.

pub mod catalog;
pub mod orders;
pub mod session;
pub mod storage;

pub use catalog::CatalogStore;
pub use orders::OrdersStore;
pub use session::{AuthError, Session};
pub use storage::{MemoryStorage, Storage, StoreError};
