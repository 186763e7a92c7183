//! Order-list aggregate for the cashier side.

use std::sync::{Arc, RwLock};

use tracing::debug;

use batido_gateway::Gateway;
use batido_protocol::events::{DomainEvent, EventCategory};
use batido_protocol::types::{Order, OrderStatus};

use crate::storage::{Storage, StoreError};

/// Live order list, newest first.
///
/// Materialized from the `Orders` event category. Orders are never
/// deleted by events; [`remove`](Self::remove) is a local-only
/// operation.
#[derive(Clone, Default)]
pub struct OrdersStore {
    orders: Arc<RwLock<Vec<Order>>>,
}

impl OrdersStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes this store to the gateway's order events.
    pub fn attach(&self, gateway: &Gateway) {
        let store = self.clone();
        gateway.subscribe(EventCategory::Orders, move |event| store.apply(event));
    }

    /// Applies one order event. Events outside the `Orders` category
    /// are ignored.
    pub fn apply(&self, event: &DomainEvent) {
        match event {
            DomainEvent::OrderCreated(order) => {
                if let Ok(mut orders) = self.orders.write() {
                    orders.insert(0, order.clone());
                }
            }
            DomainEvent::OrdersSnapshot(snapshot) => {
                if let Ok(mut orders) = self.orders.write() {
                    let mut snapshot = snapshot.clone();
                    snapshot.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                    *orders = snapshot;
                }
            }
            DomainEvent::OrderStatusChanged { order_id, status } => {
                if let Ok(mut orders) = self.orders.write() {
                    match orders.iter_mut().find(|o| &o.id == order_id) {
                        Some(order) => order.status = *status,
                        // Unknown id: the event is a no-op, never an
                        // invented order.
                        None => debug!(order = %order_id, "status change for unknown order"),
                    }
                }
            }
            _ => {}
        }
    }

    /// Snapshot of the current list, newest first.
    pub fn orders(&self) -> Vec<Order> {
        self.orders.read().map(|o| o.clone()).unwrap_or_default()
    }

    pub fn pending_count(&self) -> usize {
        self.orders
            .read()
            .map(|orders| {
                orders
                    .iter()
                    .filter(|o| o.status == OrderStatus::Pending)
                    .count()
            })
            .unwrap_or(0)
    }

    /// Marks an order paid and logs the sale through the injected
    /// storage collaborator.
    pub fn mark_paid(&self, order_id: &str, storage: &dyn Storage) -> Result<(), StoreError> {
        let total = {
            let mut orders = self
                .orders
                .write()
                .map_err(|_| StoreError::Storage("orders lock poisoned".into()))?;
            let order = orders
                .iter_mut()
                .find(|o| o.id == order_id)
                .ok_or_else(|| StoreError::UnknownOrder(order_id.to_owned()))?;
            order.status = OrderStatus::Paid;
            order.total()
        };
        storage.save_sale(order_id, total, chrono::Utc::now())
    }

    /// Removes an order locally. The peer is not informed.
    pub fn remove(&self, order_id: &str) {
        if let Ok(mut orders) = self.orders.write() {
            orders.retain(|o| o.id != order_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use batido_protocol::types::LineItem;
    use chrono::{TimeZone, Utc};

    fn order(id: &str, ts: i64, status: OrderStatus) -> Order {
        Order {
            id: id.into(),
            items: vec![LineItem {
                product_id: "p-1".into(),
                name: "Mango".into(),
                base_price: 45.0,
                extras: vec![],
            }],
            created_at: Utc.timestamp_opt(ts, 0).unwrap(),
            status,
        }
    }

    #[test]
    fn created_orders_insert_at_front() {
        let store = OrdersStore::new();
        store.apply(&DomainEvent::OrderCreated(order(
            "o-1",
            100,
            OrderStatus::Pending,
        )));
        store.apply(&DomainEvent::OrderCreated(order(
            "o-2",
            200,
            OrderStatus::Pending,
        )));

        let ids: Vec<_> = store.orders().into_iter().map(|o| o.id).collect();
        assert_eq!(ids, vec!["o-2", "o-1"]);
        assert_eq!(store.pending_count(), 2);
    }

    #[test]
    fn snapshot_replaces_sorted_newest_first() {
        let store = OrdersStore::new();
        store.apply(&DomainEvent::OrderCreated(order(
            "stale",
            999,
            OrderStatus::Pending,
        )));

        store.apply(&DomainEvent::OrdersSnapshot(vec![
            order("A", 100, OrderStatus::Pending),
            order("B", 200, OrderStatus::Pending),
        ]));

        let ids: Vec<_> = store.orders().into_iter().map(|o| o.id).collect();
        assert_eq!(ids, vec!["B", "A"], "newest first, stale list replaced");
    }

    #[test]
    fn status_change_mutates_matching_order() {
        let store = OrdersStore::new();
        store.apply(&DomainEvent::OrderCreated(order(
            "o-1",
            100,
            OrderStatus::Pending,
        )));
        store.apply(&DomainEvent::OrderStatusChanged {
            order_id: "o-1".into(),
            status: OrderStatus::Paid,
        });

        assert_eq!(store.orders()[0].status, OrderStatus::Paid);
        assert_eq!(store.pending_count(), 0);
    }

    #[test]
    fn status_change_for_unknown_order_is_a_noop() {
        let store = OrdersStore::new();
        store.apply(&DomainEvent::OrderCreated(order(
            "o-1",
            100,
            OrderStatus::Pending,
        )));
        store.apply(&DomainEvent::OrderStatusChanged {
            order_id: "ghost".into(),
            status: OrderStatus::Paid,
        });

        let orders = store.orders();
        assert_eq!(orders.len(), 1, "no order invented");
        assert_eq!(orders[0].status, OrderStatus::Pending);
    }

    #[test]
    fn mark_paid_logs_the_sale() {
        let store = OrdersStore::new();
        let storage = MemoryStorage::new();
        store.apply(&DomainEvent::OrderCreated(order(
            "o-1",
            100,
            OrderStatus::Pending,
        )));

        store.mark_paid("o-1", &storage).unwrap();

        assert_eq!(store.orders()[0].status, OrderStatus::Paid);
        let sales = storage.sales();
        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].order_id, "o-1");
        assert_eq!(sales[0].total, 45.0);
    }

    #[test]
    fn mark_paid_unknown_order_fails() {
        let store = OrdersStore::new();
        let storage = MemoryStorage::new();
        let result = store.mark_paid("ghost", &storage);
        assert!(matches!(result, Err(StoreError::UnknownOrder(_))));
        assert!(storage.sales().is_empty());
    }

    #[test]
    fn remove_is_local_only() {
        let store = OrdersStore::new();
        store.apply(&DomainEvent::OrderCreated(order(
            "o-1",
            100,
            OrderStatus::Pending,
        )));
        store.remove("o-1");
        assert!(store.orders().is_empty());
        // Removing again is fine.
        store.remove("o-1");
    }
}
