//! The single transport connection: socket handle plus its three pumps.

use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::pumps;
use crate::router::Router;

/// Fired by the read pump when the peer acknowledges authentication.
pub(crate) type AuthOkHook = Arc<dyn Fn() + Send + Sync>;

/// Fired exactly once when the read pump exits, whatever the reason.
pub(crate) type CloseHook = Box<dyn Fn() + Send + Sync>;

/// An open WebSocket connection. Exclusively owned by the connection
/// machinery; nothing else reads or writes the socket directly.
pub(crate) struct Transport {
    write_tx: mpsc::Sender<tungstenite::Message>,
    cancel: CancellationToken,
    _read_handle: tokio::task::JoinHandle<()>,
    _write_handle: tokio::task::JoinHandle<()>,
    _ping_handle: tokio::task::JoinHandle<()>,
}

impl Transport {
    /// Opens the socket and spawns the read, write and ping pumps.
    ///
    /// `live_rx` gates the ping pump: probing starts only once the
    /// session reaches `Live`.
    pub(crate) async fn open(
        config: &GatewayConfig,
        router: Arc<Router>,
        on_auth_ok: AuthOkHook,
        on_close: CloseHook,
        live_rx: watch::Receiver<bool>,
    ) -> Result<Self, GatewayError> {
        let mut ws_config = tungstenite::protocol::WebSocketConfig::default();
        ws_config.max_message_size = Some(config.max_frame_size);
        ws_config.max_frame_size = Some(config.max_frame_size);

        let (ws_stream, _) =
            tokio_tungstenite::connect_async_with_config(config.url.as_str(), Some(ws_config), false)
                .await?;
        let (write, read) = ws_stream.split();

        let (write_tx, write_rx) = mpsc::channel::<tungstenite::Message>(256);
        let cancel = CancellationToken::new();

        let write_handle = tokio::spawn(pumps::write::write_pump(
            write,
            write_rx,
            cancel.clone(),
        ));

        let read_handle = tokio::spawn(pumps::read::read_pump(
            read,
            router,
            on_auth_ok,
            on_close,
            write_tx.clone(),
            config.pong_wait,
            config.max_frame_size,
            cancel.clone(),
        ));

        let ping_handle = tokio::spawn(pumps::ping::ping_pump(
            write_tx.clone(),
            live_rx,
            config.ping_period,
            cancel.clone(),
        ));

        Ok(Self {
            write_tx,
            cancel,
            _read_handle: read_handle,
            _write_handle: write_handle,
            _ping_handle: ping_handle,
        })
    }

    /// Queues one text frame onto the write pump.
    pub(crate) async fn send_text(&self, text: String) -> Result<(), GatewayError> {
        self.write_tx
            .send(tungstenite::Message::Text(text.into()))
            .await
            .map_err(|_| GatewayError::Closed)
    }

    /// Gracefully closes the connection and stops the pumps.
    pub(crate) async fn close(&self) {
        self.cancel.cancel();
        let _ = self.write_tx.send(tungstenite::Message::Close(None)).await;
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        self.cancel.cancel();
        self._read_handle.abort();
        self._write_handle.abort();
        self._ping_handle.abort();
    }
}
