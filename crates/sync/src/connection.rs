//! Connection lifecycle.
//!
//! ```text
//!  Disconnected ──connect──▶ Connecting ──opened──▶ Open ──disconnect──▶ Closing
//!       ▲                        │                   │                     │
//!       │                        └──── failed ───────┤                  closed
//!       │                                            ▼                     │
//!       └──────── gave up ──────────────── Reconnecting { attempt } ◀──────┘
//! ```
//!
//! The machine is pure: it decides what should happen next and how long to
//! wait, the session task does the waiting.

use std::time::Duration;

use splice_common::clock::exponential_backoff;
use splice_common::config::SyncConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Open,
    Closing,
    /// Waiting before retry number `attempt` (1-based).
    Reconnecting { attempt: u32 },
}

impl ConnectionState {
    pub fn is_open(&self) -> bool {
        matches!(self, ConnectionState::Open)
    }
}

#[derive(Debug, Clone)]
pub struct ConnectionMachine {
    state: ConnectionState,
    attempts: u32,
    max_attempts: u32,
    base_delay: Duration,
    manual_close: bool,
}

impl ConnectionMachine {
    pub fn new(base_delay: Duration, max_attempts: u32) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            attempts: 0,
            max_attempts,
            base_delay,
            manual_close: false,
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(config.reconnect_base_delay(), config.max_reconnect_attempts)
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Consecutive failed attempts since the last successful open.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Whether the last transition to `Disconnected` was a retry give-up.
    pub fn gave_up(&self) -> bool {
        self.state == ConnectionState::Disconnected
            && !self.manual_close
            && self.attempts >= self.max_attempts
    }

    /// Start (or retry) a connection.
    pub fn connect(&mut self) {
        if matches!(self.state, ConnectionState::Disconnected) {
            self.manual_close = false;
            self.attempts = 0;
        }
        self.state = ConnectionState::Connecting;
    }

    pub fn opened(&mut self) {
        self.state = ConnectionState::Open;
        self.attempts = 0;
    }

    /// The channel failed or closed without being asked to.
    ///
    /// Returns the delay before the next attempt, or `None` once the retry
    /// budget is spent or the close was requested locally.
    pub fn closed_unexpectedly(&mut self) -> Option<Duration> {
        if self.manual_close {
            self.state = ConnectionState::Disconnected;
            return None;
        }
        if self.attempts >= self.max_attempts {
            self.state = ConnectionState::Disconnected;
            tracing::warn!(attempts = self.attempts, "Giving up on reconnect");
            return None;
        }
        let delay = exponential_backoff(self.base_delay, self.attempts);
        self.attempts += 1;
        self.state = ConnectionState::Reconnecting {
            attempt: self.attempts,
        };
        Some(delay)
    }

    /// Local request to close. Cancels any pending reconnect.
    pub fn disconnect(&mut self) {
        self.manual_close = true;
        self.state = match self.state {
            ConnectionState::Open | ConnectionState::Connecting => ConnectionState::Closing,
            _ => ConnectionState::Disconnected,
        };
    }

    /// The channel finished closing.
    pub fn closed(&mut self) {
        self.state = ConnectionState::Disconnected;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> ConnectionMachine {
        ConnectionMachine::new(Duration::from_millis(1000), 10)
    }

    #[test]
    fn test_happy_path() {
        let mut m = machine();
        assert_eq!(m.state(), ConnectionState::Disconnected);
        m.connect();
        assert_eq!(m.state(), ConnectionState::Connecting);
        m.opened();
        assert!(m.state().is_open());
        m.disconnect();
        assert_eq!(m.state(), ConnectionState::Closing);
        m.closed();
        assert_eq!(m.state(), ConnectionState::Disconnected);
        assert!(!m.gave_up());
    }

    #[test]
    fn test_backoff_doubles_until_budget_spent() {
        let mut m = machine();
        m.connect();
        let mut delays = Vec::new();
        while let Some(delay) = m.closed_unexpectedly() {
            delays.push(delay.as_millis() as u64);
            m.connect();
        }
        assert_eq!(delays.len(), 10);
        assert_eq!(&delays[..4], &[1000, 2000, 4000, 8000]);
        assert_eq!(delays[9], 512_000);
        assert_eq!(m.state(), ConnectionState::Disconnected);
        assert!(m.gave_up());
    }

    #[test]
    fn test_open_resets_attempts() {
        let mut m = machine();
        m.connect();
        m.closed_unexpectedly();
        m.connect();
        m.closed_unexpectedly();
        assert_eq!(m.state(), ConnectionState::Reconnecting { attempt: 2 });

        m.connect();
        m.opened();
        assert_eq!(m.attempts(), 0);
        assert_eq!(m.closed_unexpectedly(), Some(Duration::from_millis(1000)));
    }

    #[test]
    fn test_manual_disconnect_cancels_reconnect() {
        let mut m = machine();
        m.connect();
        m.opened();
        m.closed_unexpectedly();
        m.disconnect();
        assert_eq!(m.state(), ConnectionState::Disconnected);
        assert_eq!(m.closed_unexpectedly(), None);
        assert!(!m.gave_up());
    }

    #[test]
    fn test_connect_after_give_up_starts_fresh() {
        let mut m = ConnectionMachine::new(Duration::from_millis(10), 1);
        m.connect();
        assert!(m.closed_unexpectedly().is_some());
        m.connect();
        assert!(m.closed_unexpectedly().is_none());
        assert!(m.gave_up());

        m.connect();
        assert_eq!(m.attempts(), 0);
        assert!(!m.gave_up());
    }
}
