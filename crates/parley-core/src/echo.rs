//! Self-echo tracking.
//!
//! The server rebroadcasts our own public messages back to us. The client
//! already shows them when they are sent, so each send leaves a
//! [`PendingEcho`] and the first matching rebroadcast within the window is
//! swallowed. A second identical rebroadcast, or one arriving after the window,
//! is shown normally.

use std::{collections::VecDeque, time::Duration};

use crate::env::Timestamp;

/// A sent public message waiting for its echo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEcho<I> {
    /// Message text as sent.
    pub content: String,
    /// When it was sent.
    pub sent_at: I,
    /// Whether an echo already consumed it.
    pub matched: bool,
}

/// Pending echoes in send order.
#[derive(Debug, Clone)]
pub struct EchoTracker<I> {
    window: Duration,
    pending: VecDeque<PendingEcho<I>>,
}

impl<I: Timestamp> EchoTracker<I> {
    /// Create an empty tracker with the given matching window.
    pub fn new(window: Duration) -> Self {
        Self { window, pending: VecDeque::new() }
    }

    /// Remember a sent message.
    pub fn record(&mut self, content: impl Into<String>, now: I) {
        self.purge(now);
        self.pending.push_back(PendingEcho {
            content: content.into(),
            sent_at: now,
            matched: false,
        });
    }

    /// Consume the pending echo for `content`, if one is still in the window.
    ///
    /// Returns `true` when the inbound message is our own echo and should be
    /// suppressed.
    pub fn take(&mut self, content: &str, now: I) -> bool {
        self.purge(now);

        let found = self.pending.iter_mut().find(|p| !p.matched && p.content == content);
        match found {
            Some(pending) => {
                pending.matched = true;
                self.pending.retain(|p| !p.matched);
                true
            },
            None => false,
        }
    }

    /// Drop matched entries and entries older than the window.
    pub fn purge(&mut self, now: I) {
        let window = self.window;
        self.pending.retain(|p| !p.matched && now - p.sent_at < window);
    }

    /// Forget every pending echo.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Number of pending echoes.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Pending echoes, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = &PendingEcho<I>> {
        self.pending.iter()
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
    fn echo_within_window_is_consumed_once() {
        let t0 = Instant::now();
        let mut echoes = EchoTracker::new(ms(8000));
        echoes.record("hi", t0);

        assert!(echoes.take("hi", t0 + ms(50)));
        assert!(!echoes.take("hi", t0 + ms(60)));
        assert!(echoes.is_empty());
    }

    #[test]
    fn duplicate_sends_match_separately() {
        let t0 = Instant::now();
        let mut echoes = EchoTracker::new(ms(8000));
        echoes.record("hi", t0);
        echoes.record("hi", t0 + ms(1));

        assert!(echoes.take("hi", t0 + ms(10)));
        assert!(echoes.take("hi", t0 + ms(11)));
        assert!(!echoes.take("hi", t0 + ms(12)));
    }

    #[test]
    fn expired_entries_do_not_match() {
        let t0 = Instant::now();
        let mut echoes = EchoTracker::new(ms(8000));
        echoes.record("hi", t0);

        assert!(!echoes.take("hi", t0 + ms(8000)));
        assert!(echoes.is_empty());
    }

    #[test]
    fn content_must_match_exactly() {
        let t0 = Instant::now();
        let mut echoes = EchoTracker::new(ms(8000));
        echoes.record("hi", t0);

        assert!(!echoes.take("hi ", t0));
        assert_eq!(echoes.len(), 1);
    }

    #[test]
    fn record_purges_stale_entries() {
        let t0 = Instant::now();
        let mut echoes = EchoTracker::new(ms(100));
        echoes.record("a", t0);
        echoes.record("b", t0 + ms(150));

        assert_eq!(echoes.pending().map(|p| p.content.as_str()).collect::<Vec<_>>(), ["b"]);
    }
}
