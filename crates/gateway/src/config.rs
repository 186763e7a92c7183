//! Gateway configuration and backoff policy.

use std::time::Duration;

use batido_protocol::constants::{MAX_BACKOFF_ATTEMPT, MAX_FRAME_SIZE, PING_PERIOD, PONG_WAIT};

/// Configuration for a [`Gateway`](crate::Gateway).
///
/// The defaults match the production protocol; tests shrink the
/// timings to keep wall-clock time down.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// WebSocket URL of the backend.
    pub url: String,
    /// Interval between keep-alive pings once live.
    pub ping_period: Duration,
    /// Silence window after which the connection is considered dead.
    pub pong_wait: Duration,
    /// Largest accepted text frame; bigger frames are dropped.
    pub max_frame_size: usize,
    /// One backoff time unit. Reconnect delays are `min(2^attempt, 64)`
    /// of these.
    pub backoff_unit: Duration,
    /// Attempt cap; the delay saturates once the counter reaches it.
    pub max_backoff_attempt: u32,
}

impl GatewayConfig {
    /// Creates a configuration with production timings for `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ping_period: PING_PERIOD,
            pong_wait: PONG_WAIT,
            max_frame_size: MAX_FRAME_SIZE,
            backoff_unit: Duration::from_secs(1),
            max_backoff_attempt: MAX_BACKOFF_ATTEMPT,
        }
    }

    /// Deterministic, unjittered capped exponential backoff:
    /// `min(2^attempt, 2^max_backoff_attempt)` backoff units.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exp = attempt.min(self.max_backoff_attempt).min(31);
        self.backoff_unit * (1u32 << exp)
    }
}
