//! Observable state snapshots for invariant checking.
//!
//! Snapshots capture the observable state of the system at a point in time.
//! Invariants operate on snapshots rather than live state to ensure
//! consistent, atomic checks.

use std::time::Duration;

use parley_app::App;
use parley_client::{Client, Environment};

/// Snapshot of the entire system state.
///
/// Contains observable state from one or more clients for invariant checking.
#[derive(Debug, Clone, Default)]
pub struct SystemSnapshot {
    /// Per-client state snapshots.
    pub clients: Vec<ClientSnapshot>,
}

impl SystemSnapshot {
    /// Create an empty snapshot (no clients).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a snapshot with a single client.
    pub fn single(client: ClientSnapshot) -> Self {
        Self { clients: vec![client] }
    }

    /// Create a snapshot from multiple clients.
    pub fn from_clients(clients: Vec<ClientSnapshot>) -> Self {
        Self { clients }
    }

    /// Add a client snapshot.
    pub fn add_client(&mut self, client: ClientSnapshot) {
        self.clients.push(client);
    }
}

/// Snapshot of a single client's observable state.
///
/// Take it right after a tick: `collecting_for` is only bounded once timers
/// have been evaluated at the current instant.
#[derive(Debug, Clone, Default)]
pub struct ClientSnapshot {
    /// Client identifier.
    pub id: u64,
    /// Our name, once assigned.
    pub identity: Option<String>,
    /// Roster in display order.
    pub roster: Vec<String>,
    /// Whether the roster came from a finished collection.
    pub roster_settled: bool,
    /// Whether private mode is active.
    pub private_mode: bool,
    /// Selected private target.
    pub target: Option<String>,
    /// Age of the running presence collection. `None` while idle.
    pub collecting_for: Option<Duration>,
    /// Configured collection ceiling.
    pub collect_ceiling: Duration,
    /// Whether the transport is open.
    pub connected: bool,
    /// Transcript length.
    pub transcript_len: usize,
    /// Transcript capacity.
    pub transcript_cap: usize,
}

impl ClientSnapshot {
    /// Create an empty client snapshot.
    pub fn new(id: u64) -> Self {
        Self { id, ..Default::default() }
    }

    /// Capture the session state of a client.
    pub fn from_client<E: Environment>(id: u64, client: &Client<E>) -> Self {
        Self::new(id).with_client(client)
    }

    /// Capture what the App shows.
    ///
    /// The App does not know whether its roster is settled, so target checks
    /// are skipped unless [`with_client`](Self::with_client) is applied too.
    pub fn from_app(id: u64, app: &App) -> Self {
        Self {
            id,
            identity: app.identity().map(str::to_owned),
            roster: app.roster().names().to_vec(),
            private_mode: app.mode().is_private(),
            target: app.mode().target().map(str::to_owned),
            connected: app.connection_state() == parley_app::ConnectionState::Connected,
            transcript_len: app.transcript().len(),
            transcript_cap: app.transcript().cap(),
            ..Self::new(id)
        }
    }

    /// Overlay the session state of the client behind the view.
    #[must_use]
    pub fn with_client<E: Environment>(mut self, client: &Client<E>) -> Self {
        self.identity = client.identity().map(str::to_owned);
        self.roster = client.roster().names().to_vec();
        self.roster_settled = client.roster_settled();
        self.private_mode = client.mode().is_private();
        self.target = client.mode().target().map(str::to_owned);
        self.collecting_for = client.collecting_for();
        self.collect_ceiling = client.config().presence.ceiling;
        self.connected = client.link_state() == parley_client::LinkState::Connected;
        self
    }
}
