//! Public gateway facade.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, RwLock as StdRwLock};

use tokio::sync::{Mutex, mpsc};
use tracing::{debug, warn};

use batido_protocol::events::{DomainEvent, EventCategory, Outbound};
use batido_protocol::types::Credentials;

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::reconnect::{
    GatewayContext, cancel_reconnect, current_state, dial, schedule_reconnect, set_state,
};
use crate::router::Router;
use crate::types::{ConnectionState, GatewayEvent, RetryState};

/// Owns the single realtime connection for one running instance.
///
/// `connect` and `disconnect` are idempotent; `send` fails fast with
/// [`GatewayError::NotConnected`] while the session is not live, so
/// callers can decide whether to retry or queue.
pub struct Gateway {
    ctx: GatewayContext,
    events_rx: Mutex<Option<mpsc::Receiver<GatewayEvent>>>,
}

impl Gateway {
    /// Creates a gateway for the configured backend. No connection is
    /// opened until [`connect`](Self::connect).
    pub fn new(config: GatewayConfig) -> Self {
        let (events_tx, events_rx) = mpsc::channel(64);
        let ctx = GatewayContext {
            config,
            credentials: Arc::new(StdMutex::new(None)),
            transport: Arc::new(Mutex::new(None)),
            state: Arc::new(StdRwLock::new(ConnectionState::Idle)),
            retry: Arc::new(StdMutex::new(RetryState::default())),
            router: Arc::new(Router::new()),
            events_tx,
            reconnect_cancel: Arc::new(StdMutex::new(None)),
            wants_connection: Arc::new(AtomicBool::new(false)),
            generation: Arc::new(AtomicU64::new(0)),
        };
        Self {
            ctx,
            events_rx: Mutex::new(Some(events_rx)),
        }
    }

    /// Takes the lifecycle event receiver. Can only be called once.
    pub async fn take_events(&self) -> Option<mpsc::Receiver<GatewayEvent>> {
        self.events_rx.lock().await.take()
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        current_state(&self.ctx)
    }

    /// Registers an observer for an event category. Observers are
    /// invoked on the connection's delivery path and must not block.
    pub fn subscribe(
        &self,
        category: EventCategory,
        handler: impl Fn(&DomainEvent) + Send + Sync + 'static,
    ) {
        self.ctx.router.subscribe(category, Box::new(handler));
    }

    /// Opens the connection with the given credentials.
    ///
    /// Idempotent: a no-op while already `Connecting` or `Live`. On an
    /// immediate transport failure the error is returned *and* the
    /// reconnection loop takes over, so the session still converges
    /// once the backend comes back.
    pub async fn connect(&self, credentials: Credentials) -> Result<(), GatewayError> {
        // Check-and-claim under one lock so concurrent connects produce
        // exactly one transport attempt.
        if let Ok(mut state) = self.ctx.state.write() {
            if matches!(*state, ConnectionState::Connecting | ConnectionState::Live) {
                debug!(state = ?*state, "connect ignored, already active");
                return Ok(());
            }
            *state = ConnectionState::Connecting;
        }

        self.ctx.wants_connection.store(true, Ordering::SeqCst);
        cancel_reconnect(&self.ctx.reconnect_cancel);
        if let Ok(mut creds) = self.ctx.credentials.lock() {
            *creds = Some(credentials);
        }

        // A half-open transport from a previous Disconnected episode.
        if let Some(stale) = self.ctx.transport.lock().await.take() {
            stale.close().await;
        }

        match dial(&self.ctx).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(error = %e, "connect failed");
                if self.ctx.wants_connection.load(Ordering::SeqCst) {
                    schedule_reconnect(&self.ctx);
                }
                Err(e)
            }
        }
    }

    /// Tears the connection down and cancels any pending reconnect.
    ///
    /// Idempotent and always safe to call; terminal until the next
    /// [`connect`](Self::connect). No event arriving after this call
    /// can cause a further transition.
    pub async fn disconnect(&self) {
        self.ctx.wants_connection.store(false, Ordering::SeqCst);
        // Invalidate in-flight callbacks from the current attempt.
        self.ctx.generation.fetch_add(1, Ordering::SeqCst);
        cancel_reconnect(&self.ctx.reconnect_cancel);

        if let Some(transport) = self.ctx.transport.lock().await.take() {
            transport.close().await;
        }

        if self.state() != ConnectionState::Idle {
            set_state(&self.ctx, ConnectionState::Idle);
            debug!("disconnected");
        }
    }

    /// Sends a message on the live session.
    ///
    /// Fails fast with [`GatewayError::NotConnected`] when the session
    /// is not live — nothing is silently dropped.
    pub async fn send(&self, message: Outbound) -> Result<(), GatewayError> {
        if self.state() != ConnectionState::Live {
            return Err(GatewayError::NotConnected);
        }

        let shop_id = match self.ctx.credentials.lock() {
            Ok(guard) => guard.as_ref().map(|c| c.shop_id.clone()),
            Err(_) => None,
        }
        .ok_or(GatewayError::NotConnected)?;

        let text = message.to_envelope(&shop_id)?.encode()?;

        let guard = self.ctx.transport.lock().await;
        match guard.as_ref() {
            Some(transport) => transport.send_text(text).await,
            None => Err(GatewayError::NotConnected),
        }
    }
}
