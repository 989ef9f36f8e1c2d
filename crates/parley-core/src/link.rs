//! Transport lifecycle state machine.
//!
//! Tracks whether the connection is up and when to reconnect after it drops.
//! Uses the action pattern: methods take time as input and [`Link::poll`]
//! returns the action for the driver to execute.
//!
//! # State Machine
//!
//! ```text
//! ┌──────────────┐  connecting  ┌────────────┐   opened   ┌───────────┐
//! │ Disconnected │─────────────>│ Connecting │───────────>│ Connected │
//! └──────────────┘              └────────────┘            └───────────┘
//!        ^                            │                         │
//!        │ reconnect delay elapsed:   │ closed                  │ closed
//!        │ emit Reconnect             ↓                         ↓
//!        └──────────────────────── (reconnect armed) <──────────┘
//! ```

use std::time::Duration;

use crate::env::Timestamp;

/// Actions returned by [`Link::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkAction {
    /// Open a new connection now.
    Reconnect,
}

/// Link state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No connection and no attempt in flight.
    Disconnected,
    /// Connection attempt in flight.
    Connecting,
    /// Transport is open.
    Connected,
}

/// Reconnecting link.
///
/// Pure state machine; the driver owns the socket.
#[derive(Debug, Clone)]
pub struct Link<I> {
    state: LinkState,
    reconnect_delay: Duration,
    /// When the connection was lost. `Some` while a reconnect is armed.
    lost_at: Option<I>,
    /// Consecutive failed attempts since the last successful open.
    failures: u32,
}

impl<I: Timestamp> Link<I> {
    /// Create a disconnected link.
    pub fn new(reconnect_delay: Duration) -> Self {
        Self { state: LinkState::Disconnected, reconnect_delay, lost_at: None, failures: 0 }
    }

    /// Current state.
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Whether the transport is open.
    pub fn is_connected(&self) -> bool {
        self.state == LinkState::Connected
    }

    /// Consecutive failed attempts since the last successful open.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Delay between losing the connection and reconnecting.
    pub fn reconnect_delay(&self) -> Duration {
        self.reconnect_delay
    }

    /// Whether a reconnect is armed.
    pub fn reconnect_pending(&self) -> bool {
        self.lost_at.is_some()
    }

    /// A connection attempt started.
    pub fn connecting(&mut self) {
        self.state = LinkState::Connecting;
        self.lost_at = None;
    }

    /// The transport opened. Cancels any armed reconnect.
    pub fn opened(&mut self) {
        self.state = LinkState::Connected;
        self.lost_at = None;
        self.failures = 0;
    }

    /// The transport closed or an attempt failed.
    ///
    /// Arms the reconnect timer from `now`, replacing any armed one. Returns
    /// `true` if the link was up or connecting (a real loss), `false` if it was
    /// already down.
    pub fn closed(&mut self, now: I) -> bool {
        let was_up = self.state != LinkState::Disconnected;
        if self.state == LinkState::Connecting {
            self.failures = self.failures.saturating_add(1);
        }
        self.state = LinkState::Disconnected;
        self.lost_at = Some(now);
        tracing::info!(delay = ?self.reconnect_delay, failures = self.failures, "reconnect armed");
        was_up
    }

    /// Advance timers.
    pub fn poll(&mut self, now: I) -> Option<LinkAction> {
        let lost_at = self.lost_at?;
        if now - lost_at < self.reconnect_delay {
            return None;
        }

        self.lost_at = None;
        self.state = LinkState::Connecting;
        Some(LinkAction::Reconnect)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn reconnect_fires_once_after_delay() {
        let t0 = Instant::now();
        let mut link = Link::new(ms(3000));
        link.connecting();
        link.opened();

        assert!(link.closed(t0));
        assert_eq!(link.poll(t0 + ms(2999)), None);
        assert_eq!(link.poll(t0 + ms(3000)), Some(LinkAction::Reconnect));
        assert_eq!(link.poll(t0 + ms(9000)), None);
        assert_eq!(link.state(), LinkState::Connecting);
    }

    #[test]
    fn open_cancels_armed_reconnect() {
        let t0 = Instant::now();
        let mut link = Link::new(ms(3000));
        link.closed(t0);
        link.opened();

        assert!(!link.reconnect_pending());
        assert_eq!(link.poll(t0 + ms(5000)), None);
    }

    #[test]
    fn repeated_close_rearms_from_latest() {
        let t0 = Instant::now();
        let mut link: Link<Instant> = Link::new(ms(3000));
        link.connecting();
        link.opened();

        assert!(link.closed(t0));
        assert!(!link.closed(t0 + ms(1000)));
        assert_eq!(link.poll(t0 + ms(3500)), None);
        assert_eq!(link.poll(t0 + ms(4000)), Some(LinkAction::Reconnect));
    }

    #[test]
    fn failed_attempts_are_counted() {
        let t0 = Instant::now();
        let mut link: Link<Instant> = Link::new(ms(10));
        for attempt in 1..=3 {
            link.connecting();
            link.closed(t0);
            assert_eq!(link.failures(), attempt);
        }
        link.opened();
        assert_eq!(link.failures(), 0);
    }
}
