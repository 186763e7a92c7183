//! Abstract persistence collaborator.
//!
//! The gateway itself never persists anything; UI-level code calls
//! these after the gateway confirms state. The trait keeps the real
//! embedded store out of this crate — tests use [`MemoryStorage`].

use std::sync::Mutex;

use chrono::{DateTime, Utc};

use batido_protocol::types::{LineItem, Product};

/// Errors from the persistence collaborator.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Storage(String),

    #[error("unknown order `{0}`")]
    UnknownOrder(String),
}

/// Persistence operations the app performs around confirmed state.
pub trait Storage: Send + Sync {
    /// Records a paid order's contents.
    fn save_order(&self, items: &[LineItem], total: f64) -> Result<(), StoreError>;

    /// Logs a sale for the daily tally.
    fn save_sale(&self, order_id: &str, total: f64, when: DateTime<Utc>) -> Result<(), StoreError>;

    fn upsert_product(&self, product: &Product) -> Result<(), StoreError>;

    fn delete_product(&self, id: &str) -> Result<(), StoreError>;
}

/// A recorded sale, kept by [`MemoryStorage`] for assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleRecord {
    pub order_id: String,
    pub total: f64,
    pub when: DateTime<Utc>,
}

/// In-memory [`Storage`] used in tests and demos.
#[derive(Default)]
pub struct MemoryStorage {
    sales: Mutex<Vec<SaleRecord>>,
    orders: Mutex<Vec<(Vec<LineItem>, f64)>>,
    products: Mutex<Vec<Product>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sales(&self) -> Vec<SaleRecord> {
        self.sales.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn saved_orders(&self) -> usize {
        self.orders.lock().map(|o| o.len()).unwrap_or(0)
    }

    pub fn products(&self) -> Vec<Product> {
        self.products.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl Storage for MemoryStorage {
    fn save_order(&self, items: &[LineItem], total: f64) -> Result<(), StoreError> {
        if let Ok(mut orders) = self.orders.lock() {
            orders.push((items.to_vec(), total));
        }
        Ok(())
    }

    fn save_sale(&self, order_id: &str, total: f64, when: DateTime<Utc>) -> Result<(), StoreError> {
        if let Ok(mut sales) = self.sales.lock() {
            sales.push(SaleRecord {
                order_id: order_id.to_owned(),
                total,
                when,
            });
        }
        Ok(())
    }

    fn upsert_product(&self, product: &Product) -> Result<(), StoreError> {
        if let Ok(mut products) = self.products.lock() {
            match products.iter_mut().find(|p| p.id == product.id) {
                Some(existing) => *existing = product.clone(),
                None => products.push(product.clone()),
            }
        }
        Ok(())
    }

    fn delete_product(&self, id: &str) -> Result<(), StoreError> {
        if let Ok(mut products) = self.products.lock() {
            products.retain(|p| p.id != id);
        }
        Ok(())
    }
}
