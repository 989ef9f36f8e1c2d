//! Tuning constants for the client state machines.
//!
//! The presence timings stand in for an end-of-list marker the server never
//! sends. They match the deployed client and may need retuning against a
//! server with different response latency.

use std::time::Duration;

use crate::presence::RefreshTrigger;

/// Wait for the first `who` entry after sending the request.
pub const DEFAULT_WHO_INITIAL_WAIT: Duration = Duration::from_millis(2000);

/// Quiet period after the latest `who` entry that ends the collection.
pub const DEFAULT_WHO_ENTRY_WAIT: Duration = Duration::from_millis(500);

/// Upper bound on a collection, however long entries keep arriving.
pub const DEFAULT_WHO_CEILING: Duration = Duration::from_millis(5000);

/// How long a sent public message waits for its server echo.
pub const DEFAULT_ECHO_WINDOW: Duration = Duration::from_millis(8000);

/// Delay between losing the connection and reconnecting.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(3000);

/// Presence collection timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceConfig {
    /// Idle wait armed when the request is sent.
    pub initial_wait: Duration,
    /// Idle wait re-armed after each entry.
    pub entry_wait: Duration,
    /// Hard ceiling measured from the request.
    pub ceiling: Duration,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            initial_wait: DEFAULT_WHO_INITIAL_WAIT,
            entry_wait: DEFAULT_WHO_ENTRY_WAIT,
            ceiling: DEFAULT_WHO_CEILING,
        }
    }
}

/// Self-echo matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EchoConfig {
    /// Maximum age of a pending echo.
    pub window: Duration,
}

impl Default for EchoConfig {
    fn default() -> Self {
        Self { window: DEFAULT_ECHO_WINDOW }
    }
}

/// Settle delays applied before a triggered presence refresh.
///
/// The server broadcasts presence changes before its own tables settle, so an
/// immediate `who` can miss the change it reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshDelays {
    /// After our identity is assigned or updated.
    pub identity: Duration,
    /// After another peer renames.
    pub peer_renamed: Duration,
    /// After a peer goes online or offline.
    pub presence_change: Duration,
}

impl RefreshDelays {
    /// Delay for a trigger. User-driven triggers run immediately.
    pub fn delay(&self, trigger: RefreshTrigger) -> Duration {
        match trigger {
            RefreshTrigger::IdentityAssigned | RefreshTrigger::IdentityUpdated => self.identity,
            RefreshTrigger::PeerRenamed => self.peer_renamed,
            RefreshTrigger::PresenceChange => self.presence_change,
            RefreshTrigger::Manual
            | RefreshTrigger::PrivateMode
            | RefreshTrigger::TargetOffline => Duration::ZERO,
        }
    }
}

impl Default for RefreshDelays {
    fn default() -> Self {
        Self {
            identity: Duration::from_millis(200),
            peer_renamed: Duration::from_millis(100),
            presence_change: Duration::from_millis(200),
        }
    }
}

/// Full client configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConfig {
    /// Presence collection timing.
    pub presence: PresenceConfig,
    /// Self-echo matching.
    pub echo: EchoConfig,
    /// Settle delays before triggered refreshes.
    pub refresh: RefreshDelays,
    /// Delay before reconnecting after the connection drops.
    pub reconnect_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            presence: PresenceConfig::default(),
            echo: EchoConfig::default(),
            refresh: RefreshDelays::default(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }
}
