//! Event router: decodes envelopes once and fans typed events out to
//! per-category observer lists.

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::{trace, warn};

use batido_protocol::envelope::Envelope;
use batido_protocol::events::{DomainEvent, EventCategory};

/// Observer callback. Invoked from the connection's delivery path, so it
/// must return promptly and never perform blocking I/O.
pub type EventHandler = Box<dyn Fn(&DomainEvent) + Send + Sync>;

/// Maps envelope kinds to domain events and fans them out.
///
/// Stateless apart from the observer registry. Registering a second
/// observer for a category does not displace the first; all observers
/// of a category see events in wire arrival order.
#[derive(Default)]
pub struct Router {
    handlers: RwLock<HashMap<EventCategory, Vec<EventHandler>>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an observer for a category.
    pub fn subscribe(&self, category: EventCategory, handler: EventHandler) {
        if let Ok(mut map) = self.handlers.write() {
            map.entry(category).or_default().push(handler);
        }
    }

    /// Decodes an envelope and delivers the event to its category's
    /// observers. Unknown kinds are silently ignored; a structurally
    /// invalid payload for a recognized kind is dropped with a
    /// diagnostic. This never panics the dispatch loop.
    pub fn dispatch(&self, envelope: &Envelope) -> Option<DomainEvent> {
        let event = match DomainEvent::from_envelope(envelope) {
            Ok(Some(event)) => event,
            Ok(None) => {
                trace!(kind = %envelope.kind, "ignoring unrecognized event kind");
                return None;
            }
            Err(e) => {
                warn!(kind = %envelope.kind, error = %e, "dropping malformed event");
                return None;
            }
        };

        if let Ok(map) = self.handlers.read() {
            if let Some(observers) = map.get(&event.category()) {
                for observer in observers {
                    observer(&event);
                }
            }
        }
        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn envelope(kind: &str, data: serde_json::Value) -> Envelope {
        Envelope::new(kind, Some("shop-1"), data)
    }

    #[test]
    fn dispatch_delivers_to_category_observers() {
        let router = Router::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        router.subscribe(
            EventCategory::Catalog,
            Box::new(move |event| sink.lock().unwrap().push(event.clone())),
        );

        router.dispatch(&envelope(
            "catalog.updated",
            serde_json::json!({"products": []}),
        ));
        router.dispatch(&envelope("auth.ok", serde_json::Value::Null));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], DomainEvent::CatalogUpdated(vec![]));
    }

    #[test]
    fn second_observer_does_not_displace_the_first() {
        let router = Router::new();
        let first = Arc::new(Mutex::new(0u32));
        let second = Arc::new(Mutex::new(0u32));
        let a = first.clone();
        let b = second.clone();
        router.subscribe(
            EventCategory::Connection,
            Box::new(move |_| *a.lock().unwrap() += 1),
        );
        router.subscribe(
            EventCategory::Connection,
            Box::new(move |_| *b.lock().unwrap() += 1),
        );

        router.dispatch(&envelope("auth.ok", serde_json::Value::Null));

        assert_eq!(*first.lock().unwrap(), 1);
        assert_eq!(*second.lock().unwrap(), 1);
    }

    #[test]
    fn observers_see_events_in_arrival_order() {
        let router = Router::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        router.subscribe(
            EventCategory::Orders,
            Box::new(move |event| {
                if let DomainEvent::OrderStatusChanged { order_id, .. } = event {
                    sink.lock().unwrap().push(order_id.clone());
                }
            }),
        );

        for id in ["o-1", "o-2", "o-3"] {
            router.dispatch(&envelope(
                "order.status_changed",
                serde_json::json!({"orderId": id, "status": "paid"}),
            ));
        }

        assert_eq!(*seen.lock().unwrap(), vec!["o-1", "o-2", "o-3"]);
    }

    #[test]
    fn unknown_kind_is_dropped_silently() {
        let router = Router::new();
        assert!(
            router
                .dispatch(&envelope("future.thing", serde_json::json!({})))
                .is_none()
        );
    }

    #[test]
    fn malformed_payload_does_not_reach_observers() {
        let router = Router::new();
        let count = Arc::new(Mutex::new(0u32));
        let sink = count.clone();
        router.subscribe(
            EventCategory::Orders,
            Box::new(move |_| *sink.lock().unwrap() += 1),
        );

        // Recognized kind, missing required fields.
        let result = router.dispatch(&envelope("order.status_changed", serde_json::json!({})));

        assert!(result.is_none());
        assert_eq!(*count.lock().unwrap(), 0);
    }
}
