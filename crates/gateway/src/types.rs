//! Public state and event types for the gateway.

use std::time::{Duration, Instant};

/// Lifecycle state of the single logical connection.
///
/// `Connecting` covers both the transport handshake and the wait for
/// the peer's `auth.ok`; `Disconnected` means a reconnect may be
/// pending, while `Idle` is terminal until the next `connect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Live,
    Disconnected,
}

/// Events emitted by the gateway for presentation code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEvent {
    /// The connection state changed.
    StateChanged(ConnectionState),
    /// A reconnection attempt was scheduled after `delay`.
    Reconnecting { attempt: u32, delay: Duration },
}

/// Reconnection bookkeeping. Owned by the connection machinery;
/// reset to zero only when a session reaches `Live`.
#[derive(Debug, Default)]
pub(crate) struct RetryState {
    pub(crate) attempt: u32,
    pub(crate) last_attempt_at: Option<Instant>,
}

impl RetryState {
    /// Increments the attempt counter, saturating at `cap`.
    pub(crate) fn bump(&mut self, cap: u32) -> u32 {
        self.attempt = self.attempt.saturating_add(1).min(cap);
        self.last_attempt_at = Some(Instant::now());
        self.attempt
    }

    pub(crate) fn reset(&mut self) {
        self.attempt = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_bump_saturates_at_cap() {
        let mut retry = RetryState::default();
        for expected in [1, 2, 3, 4, 5, 6, 6, 6] {
            assert_eq!(retry.bump(6), expected);
        }
        assert!(retry.last_attempt_at.is_some());
    }

    #[test]
    fn retry_reset_clears_attempt() {
        let mut retry = RetryState::default();
        retry.bump(6);
        retry.bump(6);
        retry.reset();
        assert_eq!(retry.attempt, 0);
        // The next failure starts the ladder over.
        assert_eq!(retry.bump(6), 1);
    }
}
