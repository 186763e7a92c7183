//! Read pump — decodes inbound frames and dispatches them.
//!
//! Uses a silence deadline to detect dead connections: if nothing
//! arrives within the pong window the connection is considered dead and
//! the pump exits, which takes the reconnection path.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use batido_protocol::constants::kind;
use batido_protocol::envelope::Envelope;

use crate::router::Router;
use crate::transport::{AuthOkHook, CloseHook};

pub(crate) async fn read_pump<S>(
    mut read: S,
    router: Arc<Router>,
    on_auth_ok: AuthOkHook,
    on_close: CloseHook,
    write_tx: mpsc::Sender<tungstenite::Message>,
    pong_wait: Duration,
    max_frame_size: usize,
    cancel: CancellationToken,
) where
    S: StreamExt<Item = Result<tungstenite::Message, tungstenite::Error>> + Unpin,
{
    let silence_deadline = tokio::time::sleep(pong_wait);
    tokio::pin!(silence_deadline);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            () = &mut silence_deadline => {
                warn!("keep-alive timeout, connection considered dead");
                break;
            }

            msg = read.next() => {
                match msg {
                    Some(Ok(msg)) => {
                        // Any inbound traffic proves the peer is alive.
                        silence_deadline
                            .as_mut()
                            .reset(tokio::time::Instant::now() + pong_wait);

                        match msg {
                            tungstenite::Message::Text(text) => {
                                handle_frame(&text, &router, &on_auth_ok, max_frame_size);
                            }
                            tungstenite::Message::Binary(data) => {
                                warn!(bytes = data.len(), "binary frame discarded");
                            }
                            tungstenite::Message::Ping(data) => {
                                trace!("received ping, sending pong");
                                let _ = write_tx.send(tungstenite::Message::Pong(data)).await;
                            }
                            tungstenite::Message::Pong(_) => {
                                trace!("received pong");
                            }
                            tungstenite::Message::Close(_) => {
                                debug!("received close frame");
                                break;
                            }
                            _ => {}
                        }
                    }
                    Some(Err(e)) => {
                        warn!("WebSocket read error: {e}");
                        break;
                    }
                    None => {
                        debug!("WebSocket stream ended");
                        break;
                    }
                }
            }
        }
    }

    on_close();
}

/// Decodes one text frame and routes it. Malformed frames are dropped
/// with a diagnostic; they never tear the connection down.
fn handle_frame(text: &str, router: &Router, on_auth_ok: &AuthOkHook, max_frame_size: usize) {
    if text.len() > max_frame_size {
        warn!(bytes = text.len(), "frame too large, dropping");
        return;
    }

    let envelope = match Envelope::decode(text) {
        Ok(env) => env,
        Err(e) => {
            warn!(error = %e, "undecodable frame dropped");
            return;
        }
    };

    trace!(kind = %envelope.kind, "frame received");

    // Transition to Live before observers see the ack, so a handler
    // reading the gateway state gets a consistent picture.
    if envelope.kind == kind::AUTH_OK {
        on_auth_ok();
    }

    router.dispatch(&envelope);
}
