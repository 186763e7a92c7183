//! Catalog aggregate for the customer side.

use std::sync::{Arc, RwLock};

use batido_gateway::Gateway;
use batido_protocol::events::{DomainEvent, EventCategory};
use batido_protocol::types::Product;

/// Live product catalog.
///
/// The whole collection is replaced on every `catalog.updated` event —
/// no diffing, no merging.
#[derive(Clone, Default)]
pub struct CatalogStore {
    products: Arc<RwLock<Vec<Product>>>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog pre-seeded with the base products, shown until the
    /// first snapshot arrives.
    pub fn with_defaults() -> Self {
        let seed = [
            ("p-cafe", "Café", "cafe2"),
            ("p-durazno", "Durazno", "durazno2"),
            ("p-fresa", "Fresa", "fresa2"),
            ("p-kiwi", "Kiwi", "kiwi2"),
            ("p-mango", "Mango", "mango2"),
        ]
        .into_iter()
        .map(|(id, name, image)| Product {
            id: id.into(),
            name: name.into(),
            image_name: image.into(),
            base_price: 0.0,
            category: None,
        })
        .collect();

        Self {
            products: Arc::new(RwLock::new(seed)),
        }
    }

    /// Subscribes this store to the gateway's catalog events.
    pub fn attach(&self, gateway: &Gateway) {
        let store = self.clone();
        gateway.subscribe(EventCategory::Catalog, move |event| store.apply(event));
    }

    pub fn apply(&self, event: &DomainEvent) {
        if let DomainEvent::CatalogUpdated(products) = event {
            if let Ok(mut current) = self.products.write() {
                *current = products.clone();
            }
        }
    }

    /// Replaces the catalog from outside the event flow (e.g. an
    /// initial fetch).
    pub fn replace(&self, products: Vec<Product>) {
        if let Ok(mut current) = self.products.write() {
            *current = products;
        }
    }

    pub fn products(&self) -> Vec<Product> {
        self.products.read().map(|p| p.clone()).unwrap_or_default()
    }
}
