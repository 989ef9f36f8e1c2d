//! World: several real clients wired to one scripted server.
//!
//! Lines written by a client reach the server at once; lines the server writes
//! wait in per-session mailboxes until the world delivers them, either
//! explicitly or while time advances. Time moves in tick-sized steps on a
//! shared [`MockEnv`] clock.

use std::{collections::BTreeSet, time::Duration};

use parley_app::Transcript;
use parley_client::{
    ChatMessage, ChatMode, Client, ClientAction, ClientConfig, ClientEvent, Command, Origin,
};
use parley_core::{Environment, env::test_utils::MockEnv};

use super::operation::{ClientId, Operation, rename_target};
use crate::{
    invariants::{ClientSnapshot, SystemSnapshot},
    scripted_server::{Hub, ScriptedServer, SessionId},
};

/// Tick interval used while advancing time.
pub const STEP: Duration = Duration::from_millis(100);

/// Long enough for reconnects, settle delays and a full collection.
pub const SETTLE: Duration = Duration::from_secs(15);

struct Member {
    client: Client<MockEnv>,
    session: Option<SessionId>,
    addr: String,
    transcript: Transcript,
    /// Public messages handed to the server.
    public_sent: usize,
    /// Own public messages shown locally.
    own_public_shown: usize,
    /// User intents the client rejected.
    rejected: usize,
}

/// Clients and server on one virtual clock.
pub struct World {
    env: MockEnv,
    hub: Hub,
    members: Vec<Member>,
}

impl World {
    /// Create a world with `num_clients` disconnected clients (at least one).
    pub fn new(num_clients: usize) -> Self {
        Self::with_config(num_clients, ClientConfig::default())
    }

    /// Create a world with custom client timing.
    pub fn with_config(num_clients: usize, config: ClientConfig) -> Self {
        let env = MockEnv::new();
        let members = (0..num_clients.max(1))
            .map(|i| Member {
                client: Client::new(env.clone(), config),
                session: None,
                addr: format!("10.0.0.{}:{}", i + 1, 40000 + i),
                transcript: Transcript::default(),
                public_sent: 0,
                own_public_shown: 0,
                rejected: 0,
            })
            .collect();
        Self { env, hub: Hub::default(), members }
    }

    /// Number of clients.
    pub fn num_clients(&self) -> usize {
        self.members.len()
    }

    /// Shared clock.
    pub fn env(&self) -> &MockEnv {
        &self.env
    }

    /// Scripted server state.
    pub fn server(&self) -> &ScriptedServer {
        self.hub.server()
    }

    /// Client by index.
    pub fn client(&self, id: usize) -> Option<&Client<MockEnv>> {
        self.members.get(id).map(|m| &m.client)
    }

    /// Messages shown to a client.
    pub fn transcript(&self, id: usize) -> Option<&Transcript> {
        self.members.get(id).map(|m| &m.transcript)
    }

    /// Public messages a client handed to the server.
    pub fn public_sent(&self, id: usize) -> usize {
        self.members.get(id).map_or(0, |m| m.public_sent)
    }

    /// Own public messages a client displayed.
    pub fn own_public_shown(&self, id: usize) -> usize {
        self.members.get(id).map_or(0, |m| m.own_public_shown)
    }

    /// User intents a client rejected.
    pub fn rejected(&self, id: usize) -> usize {
        self.members.get(id).map_or(0, |m| m.rejected)
    }

    /// Connect every client that has no connection.
    pub fn connect_all(&mut self) {
        for i in 0..self.members.len() {
            if self.members[i].session.is_none() {
                self.connect(i);
            }
        }
    }

    /// Apply one operation.
    pub fn apply(&mut self, op: &Operation) {
        match op {
            Operation::Connect { client_id } => {
                let i = self.index(*client_id);
                if self.members[i].session.is_none() {
                    self.connect(i);
                }
            },
            Operation::Disconnect { client_id } => {
                let i = self.index(*client_id);
                if let Some(session) = self.members[i].session.take() {
                    self.hub.disconnect(session);
                    self.handle(i, ClientEvent::Closed);
                }
            },
            Operation::SendText { client_id, text } => {
                let i = self.index(*client_id);
                self.handle(i, ClientEvent::SendText { text: text.to_text() });
            },
            Operation::Rename { client_id, name_seed } => {
                let i = self.index(*client_id);
                self.handle(i, ClientEvent::Rename { name: rename_target(*name_seed) });
            },
            Operation::Refresh { client_id } => {
                let i = self.index(*client_id);
                self.handle(i, ClientEvent::RefreshPresence);
            },
            Operation::SelectTarget { client_id, peer_id } => {
                let i = self.index(*client_id);
                let peer = self.index(*peer_id);
                let name = self.members[peer]
                    .session
                    .and_then(|s| self.hub.server().name_of(s))
                    .map(str::to_owned);
                if let Some(name) = name {
                    self.handle(i, ClientEvent::SelectTarget { name });
                }
            },
            Operation::SwitchPublic { client_id } => {
                let i = self.index(*client_id);
                self.handle(i, ClientEvent::SwitchPublic);
            },
            Operation::SwitchPrivate { client_id } => {
                let i = self.index(*client_id);
                self.handle(i, ClientEvent::SwitchPrivate);
            },
            Operation::AdvanceTime { millis } => {
                self.advance(Duration::from_millis(u64::from(*millis)));
            },
            Operation::DeliverPending => self.deliver_pending(),
        }
    }

    /// Move time forward in [`STEP`]s. Each step delivers queued lines, then
    /// ticks every client.
    pub fn advance(&mut self, by: Duration) {
        let mut left = by;
        while !left.is_zero() {
            let step = left.min(STEP);
            left -= step;
            self.env.advance(step);
            self.deliver_pending();

            let now = self.env.now();
            for i in 0..self.members.len() {
                self.handle(i, ClientEvent::Tick { now });
            }
        }
    }

    /// Run until every reconnect, refresh and collection has finished.
    pub fn settle(&mut self) {
        self.advance(SETTLE);
        self.deliver_pending();
    }

    /// Deliver queued server lines until no mailbox has any left.
    pub fn deliver_pending(&mut self) {
        loop {
            let mut progressed = false;
            for i in 0..self.members.len() {
                while let Some(session) = self.members[i].session
                    && let Some(line) = self.hub.take_line(session)
                {
                    progressed = true;
                    self.handle(i, ClientEvent::LineReceived(line));
                }
            }
            if !progressed {
                break;
            }
        }
    }

    /// Observable state of every client.
    pub fn snapshot(&self) -> SystemSnapshot {
        let clients = self
            .members
            .iter()
            .enumerate()
            .map(|(i, m)| ClientSnapshot {
                transcript_len: m.transcript.len(),
                transcript_cap: m.transcript.cap(),
                ..ClientSnapshot::from_client(i as u64, &m.client)
            })
            .collect();
        SystemSnapshot::from_clients(clients)
    }

    /// Compare every connected client with the server's view.
    ///
    /// Only meaningful after [`settle`](Self::settle).
    pub fn check_against_server(&self) -> Result<(), String> {
        let online: BTreeSet<String> = self.server().online_names().into_iter().collect();

        for (i, m) in self.members.iter().enumerate() {
            let Some(session) = m.session else {
                return Err(format!("client {i} never reconnected"));
            };
            let server_name = self.server().name_of(session);
            if m.client.identity() != server_name {
                return Err(format!(
                    "client {i}: identity {:?}, server says {server_name:?}",
                    m.client.identity()
                ));
            }
            if !m.client.roster_settled() {
                return Err(format!("client {i}: roster not settled"));
            }
            let seen: BTreeSet<String> = m.client.roster().names().iter().cloned().collect();
            if seen != online {
                return Err(format!("client {i}: roster {seen:?}, server has {online:?}"));
            }
        }
        Ok(())
    }

    fn index(&self, id: ClientId) -> usize {
        usize::from(id) % self.members.len()
    }

    fn connect(&mut self, i: usize) {
        self.handle(i, ClientEvent::Connecting);
        let session = self.hub.connect(self.members[i].addr.clone());
        self.members[i].session = Some(session);
        self.handle(i, ClientEvent::Opened);
    }

    fn handle(&mut self, i: usize, event: ClientEvent<<MockEnv as Environment>::Instant>) {
        match self.members[i].client.handle(event) {
            Ok(actions) => self.execute(i, actions),
            Err(e) => {
                let member = &mut self.members[i];
                member.rejected += 1;
                member.transcript.push(ChatMessage::system(e.to_string()));
            },
        }
    }

    fn execute(&mut self, i: usize, actions: Vec<ClientAction>) {
        for action in actions {
            match action {
                ClientAction::Send(command) => {
                    if matches!(command, Command::Public { .. }) {
                        self.members[i].public_sent += 1;
                    }
                    if let Some(session) = self.members[i].session {
                        self.hub.send(session, &command.encode());
                    }
                },
                ClientAction::Deliver(message) => {
                    let member = &mut self.members[i];
                    if message.origin == Origin::SelfAuthored && message.mode == ChatMode::Public {
                        member.own_public_shown += 1;
                    }
                    member.transcript.push(message);
                },
                ClientAction::Reconnect => {
                    if self.members[i].session.is_none() {
                        self.connect(i);
                    }
                },
                ClientAction::RosterUpdated(_)
                | ClientAction::Status(_)
                | ClientAction::IdentityChanged { .. }
                | ClientAction::ModeChanged(_) => {},
            }
        }
    }
}
