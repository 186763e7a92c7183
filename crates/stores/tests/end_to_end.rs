//! Stores fed by a real gateway session against an in-process server.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

use batido_gateway::{ConnectionState, Gateway, GatewayConfig, GatewayEvent};
use batido_protocol::envelope::Envelope;
use batido_protocol::types::{Credentials, Role};
use batido_stores::{CatalogStore, OrdersStore};

fn frame(kind: &str, data: serde_json::Value) -> String {
    Envelope::new(kind, Some("shop-1"), data).encode().unwrap()
}

async fn serve_script(listener: TcpListener, scripted: Vec<String>) {
    let (stream, _) = listener.accept().await.unwrap();
    let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

    let first = ws.next().await.unwrap().unwrap();
    let auth = Envelope::decode(first.to_text().unwrap()).unwrap();
    assert_eq!(auth.kind, "auth");

    ws.send(Message::Text(
        frame("auth.ok", serde_json::Value::Null).into(),
    ))
    .await
    .unwrap();
    for text in scripted {
        ws.send(Message::Text(text.into())).await.unwrap();
    }
    while let Some(Ok(_)) = ws.next().await {}
}

fn live_gateway_with(port: u16) -> Gateway {
    let mut config = GatewayConfig::new(format!("ws://127.0.0.1:{port}"));
    config.backoff_unit = Duration::from_millis(10);
    Gateway::new(config)
}

async fn wait_live(gateway: &Gateway) {
    let mut events = gateway.take_events().await.unwrap();
    tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(event) = events.recv().await {
            if event == GatewayEvent::StateChanged(ConnectionState::Live) {
                return;
            }
        }
    })
    .await
    .expect("session should go live");
}

async fn wait_until(mut check: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test]
async fn snapshot_feeds_the_order_list_newest_first() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let scripted = vec![frame(
        "orders.snapshot",
        serde_json::json!({"orders": [
            {"id": "A", "items": [], "createdAt": "2026-08-25T10:00:00Z", "status": "pending"},
            {"id": "B", "items": [], "createdAt": "2026-08-25T11:00:00Z", "status": "pending"}
        ]}),
    )];
    tokio::spawn(serve_script(listener, scripted));

    let gateway = live_gateway_with(port);
    let orders = OrdersStore::new();
    orders.attach(&gateway);

    gateway
        .connect(Credentials {
            token: "jwt-cashier".into(),
            shop_id: "shop-1".into(),
            role: Role::Cashier,
        })
        .await
        .unwrap();
    wait_live(&gateway).await;

    let store = orders.clone();
    wait_until(move || store.orders().len() == 2).await;

    let ids: Vec<_> = orders.orders().into_iter().map(|o| o.id).collect();
    assert_eq!(ids, vec!["B", "A"]);

    gateway.disconnect().await;
}

#[tokio::test]
async fn order_flow_create_then_status_change() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let scripted = vec![
        frame(
            "order.create",
            serde_json::json!({
                "items": [{"productId": "p-1", "name": "Fresa", "basePrice": 35.0}],
                "total": 35.0
            }),
        ),
        frame(
            "order.create",
            serde_json::json!({
                "id": "o-known",
                "items": [],
                "createdAt": "2026-08-25T09:00:00Z",
                "status": "pending"
            }),
        ),
        frame(
            "order.status_changed",
            serde_json::json!({"orderId": "o-known", "status": "paid"}),
        ),
    ];
    tokio::spawn(serve_script(listener, scripted));

    let gateway = live_gateway_with(port);
    let orders = OrdersStore::new();
    orders.attach(&gateway);

    gateway
        .connect(Credentials {
            token: "jwt-cashier".into(),
            shop_id: "shop-1".into(),
            role: Role::Cashier,
        })
        .await
        .unwrap();
    wait_live(&gateway).await;

    let store = orders.clone();
    wait_until(move || {
        store
            .orders()
            .iter()
            .any(|o| o.id == "o-known" && o.status == batido_protocol::types::OrderStatus::Paid)
    })
    .await;

    let all = orders.orders();
    assert_eq!(all.len(), 2);
    // The synthesized order got an id and stays pending.
    let synthesized = all.iter().find(|o| o.id != "o-known").unwrap();
    assert!(!synthesized.id.is_empty());
    assert_eq!(synthesized.total(), 35.0);
    assert_eq!(orders.pending_count(), 1);

    gateway.disconnect().await;
}

#[tokio::test]
async fn catalog_replaces_on_each_update() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let scripted = vec![
        frame(
            "catalog.updated",
            serde_json::json!({"products": [
                {"id": "p1", "name": "Uno", "imageName": "uno"}
            ]}),
        ),
        frame(
            "catalog.updated",
            serde_json::json!({"products": [
                {"id": "p2", "name": "Dos", "imageName": "dos"}
            ]}),
        ),
    ];
    tokio::spawn(serve_script(listener, scripted));

    let gateway = live_gateway_with(port);
    let catalog = CatalogStore::with_defaults();
    catalog.attach(&gateway);

    gateway
        .connect(Credentials {
            token: "jwt-customer".into(),
            shop_id: "shop-1".into(),
            role: Role::Customer,
        })
        .await
        .unwrap();
    wait_live(&gateway).await;

    let store = catalog.clone();
    wait_until(move || {
        let products = store.products();
        products.len() == 1 && products[0].id == "p2"
    })
    .await;

    gateway.disconnect().await;
}
