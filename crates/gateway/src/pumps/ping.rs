//! Ping pump — periodic keep-alive probes.
//!
//! Probing only starts once the session reaches `Live` (signalled via a
//! watch channel by the `auth.ok` handler); the transport's cancel token
//! stops it, so it can never fire after a disconnect.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;

pub(crate) async fn ping_pump(
    write_tx: mpsc::Sender<tungstenite::Message>,
    mut live_rx: watch::Receiver<bool>,
    period: Duration,
    cancel: CancellationToken,
) {
    // Wait for the session to go live before probing.
    while !*live_rx.borrow() {
        tokio::select! {
            _ = cancel.cancelled() => return,
            changed = live_rx.changed() => {
                if changed.is_err() {
                    return;
                }
            }
        }
    }

    let mut interval = tokio::time::interval(period);
    interval.tick().await; // Skip immediate first tick.

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                let ping = tungstenite::Message::Ping(vec![].into());
                if write_tx.send(ping).await.is_err() {
                    break;
                }
            }
        }
    }
}
