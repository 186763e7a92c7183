//! Connection machinery: shared context, dialing, and the reconnection
//! loop with capped exponential backoff.
//!
//! Every dial carries a generation number. Late callbacks — a close
//! notification from a torn-down socket, a stray `auth.ok` from a
//! superseded attempt — compare their generation against the current
//! one and are discarded when stale, so a reconnect can never race a
//! manual disconnect into resurrecting a connection.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, RwLock as StdRwLock};

use tokio::sync::{Mutex, mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use batido_protocol::events::Outbound;
use batido_protocol::types::Credentials;

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::router::Router;
use crate::transport::{AuthOkHook, CloseHook, Transport};
use crate::types::{ConnectionState, GatewayEvent, RetryState};

/// Shared state behind the gateway facade. Cloning is cheap; all fields
/// are handles to the same underlying state.
#[derive(Clone)]
pub(crate) struct GatewayContext {
    pub(crate) config: GatewayConfig,
    pub(crate) credentials: Arc<StdMutex<Option<Credentials>>>,
    pub(crate) transport: Arc<Mutex<Option<Transport>>>,
    pub(crate) state: Arc<StdRwLock<ConnectionState>>,
    pub(crate) retry: Arc<StdMutex<RetryState>>,
    pub(crate) router: Arc<Router>,
    pub(crate) events_tx: mpsc::Sender<GatewayEvent>,
    /// Cancel token for the active reconnect loop, if any.
    pub(crate) reconnect_cancel: Arc<StdMutex<Option<CancellationToken>>>,
    /// Cleared by an explicit disconnect; checked when a delayed
    /// reconnect fires, not only when it is scheduled.
    pub(crate) wants_connection: Arc<AtomicBool>,
    /// Generation of the newest dial; stale callbacks are ignored.
    pub(crate) generation: Arc<AtomicU64>,
}

pub(crate) fn current_state(ctx: &GatewayContext) -> ConnectionState {
    match ctx.state.read() {
        Ok(state) => *state,
        Err(_) => ConnectionState::Disconnected,
    }
}

pub(crate) fn set_state(ctx: &GatewayContext, next: ConnectionState) {
    if let Ok(mut state) = ctx.state.write() {
        *state = next;
    }
    let _ = ctx.events_tx.try_send(GatewayEvent::StateChanged(next));
}

/// Cancels the active reconnect loop, if one is pending.
pub(crate) fn cancel_reconnect(reconnect_cancel: &StdMutex<Option<CancellationToken>>) {
    if let Ok(mut guard) = reconnect_cancel.lock() {
        if let Some(token) = guard.take() {
            token.cancel();
        }
    }
}

/// Replaces any pending reconnect loop with a fresh one.
pub(crate) fn schedule_reconnect(ctx: &GatewayContext) {
    let cancel = CancellationToken::new();
    cancel_reconnect(&ctx.reconnect_cancel);
    if let Ok(mut guard) = ctx.reconnect_cancel.lock() {
        *guard = Some(cancel.clone());
    }
    tokio::spawn(reconnect_loop(ctx.clone(), cancel));
}

/// Opens the transport and sends the `auth` envelope. The session stays
/// `Connecting` until the peer's `auth.ok` arrives on the read path.
pub(crate) async fn dial(ctx: &GatewayContext) -> Result<(), GatewayError> {
    let creds = match ctx.credentials.lock() {
        Ok(guard) => guard.clone(),
        Err(_) => None,
    }
    .ok_or(GatewayError::NotConnected)?;

    let generation = ctx.generation.fetch_add(1, Ordering::SeqCst) + 1;
    set_state(ctx, ConnectionState::Connecting);
    debug!(generation, shop = %creds.shop_id, role = ?creds.role, "dialing");

    let (live_tx, live_rx) = watch::channel(false);

    let on_auth_ok: AuthOkHook = {
        let ctx = ctx.clone();
        Arc::new(move || {
            if ctx.generation.load(Ordering::SeqCst) != generation {
                debug!(generation, "stale auth.ok ignored");
                return;
            }
            if let Ok(mut retry) = ctx.retry.lock() {
                retry.reset();
            }
            // Duplicate acks while already live are idempotent.
            if current_state(&ctx) != ConnectionState::Live {
                info!("session live");
                set_state(&ctx, ConnectionState::Live);
            }
            let _ = live_tx.send(true);
        })
    };

    let on_close: CloseHook = {
        let ctx = ctx.clone();
        Box::new(move || {
            if ctx.generation.load(Ordering::SeqCst) != generation {
                // A newer attempt (or an explicit disconnect) owns the
                // state now.
                return;
            }
            set_state(&ctx, ConnectionState::Disconnected);
            if ctx.wants_connection.load(Ordering::SeqCst) {
                schedule_reconnect(&ctx);
            }
        })
    };

    let transport = match Transport::open(
        &ctx.config,
        ctx.router.clone(),
        on_auth_ok,
        on_close,
        live_rx,
    )
    .await
    {
        Ok(transport) => transport,
        Err(e) => {
            if ctx.generation.load(Ordering::SeqCst) == generation {
                set_state(ctx, ConnectionState::Disconnected);
            }
            return Err(e);
        }
    };

    // A slow handshake may complete after a newer dial or an explicit
    // disconnect superseded this attempt; never adopt such a socket.
    if ctx.generation.load(Ordering::SeqCst) != generation
        || !ctx.wants_connection.load(Ordering::SeqCst)
    {
        debug!(generation, "dial superseded, discarding socket");
        transport.close().await;
        return Err(GatewayError::Closed);
    }

    let auth = Outbound::Auth(creds.clone())
        .to_envelope(&creds.shop_id)
        .and_then(|env| env.encode());
    let auth = match auth {
        Ok(text) => text,
        Err(e) => {
            transport.close().await;
            set_state(ctx, ConnectionState::Disconnected);
            return Err(e.into());
        }
    };
    if let Err(e) = transport.send_text(auth).await {
        set_state(ctx, ConnectionState::Disconnected);
        return Err(e);
    }

    *ctx.transport.lock().await = Some(transport);
    Ok(())
}

/// Reconnection loop. Bumps the shared retry counter, sleeps for the
/// backoff delay, then redials with the same credentials.
///
/// Returns a boxed future to break the recursive type cycle with
/// [`dial`], whose close hook spawns this function.
pub(crate) fn reconnect_loop(
    ctx: GatewayContext,
    cancel: CancellationToken,
) -> Pin<Box<dyn Future<Output = ()> + Send>> {
    Box::pin(async move {
        loop {
            let attempt = match ctx.retry.lock() {
                Ok(mut retry) => retry.bump(ctx.config.max_backoff_attempt),
                Err(_) => return,
            };
            let delay = ctx.config.backoff_delay(attempt);
            let _ = ctx
                .events_tx
                .try_send(GatewayEvent::Reconnecting { attempt, delay });
            info!(attempt, delay_ms = delay.as_millis() as u64, "reconnecting");

            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("reconnect cancelled");
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }

            // Re-check at fire time: a disconnect while we slept must
            // not resurrect the connection.
            if cancel.is_cancelled() || !ctx.wants_connection.load(Ordering::SeqCst) {
                return;
            }

            match dial(&ctx).await {
                Ok(()) => break,
                Err(e) => warn!(attempt, error = %e, "reconnect attempt failed"),
            }

            if cancel.is_cancelled() {
                return;
            }
        }
    })
}
