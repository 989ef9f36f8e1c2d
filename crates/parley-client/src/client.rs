//! Client state machine.
//!
//! The `Client` owns one chat session: who we are, who we are talking to, and
//! who is online. Every inbound line is classified and routed here; timers
//! for presence collection, echo matching and reconnecting advance on
//! [`ClientEvent::Tick`].

use std::{collections::BTreeSet, time::Duration};

use parley_core::{
    ClassifiedMessage, ClientConfig, Command, EchoTracker, Environment, Link, LinkAction,
    LinkState, PresenceAction, PresenceCollector, RefreshTrigger, Roster, classify,
    normalize_line,
};

use crate::{
    error::ClientError,
    event::{ChatMessage, ChatMode, ClientAction, ClientEvent},
};

/// Who chat text goes to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConversationMode {
    /// Everyone.
    #[default]
    Public,
    /// One peer, once selected.
    Private {
        /// Selected peer. Always in the roster after a collection finalizes.
        target: Option<String>,
    },
}

impl ConversationMode {
    /// Whether private mode is active.
    pub fn is_private(&self) -> bool {
        matches!(self, Self::Private { .. })
    }

    /// Selected private target.
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Public => None,
            Self::Private { target } => target.as_deref(),
        }
    }
}

/// Client for a Parley line server.
pub struct Client<E: Environment> {
    /// Environment for timing.
    env: E,

    config: ClientConfig,

    /// Name assigned by the server. `None` until the first assignment.
    identity: Option<String>,

    mode: ConversationMode,

    roster: Roster,

    /// Whether `roster` came from a finished collection rather than a
    /// provisional patch.
    roster_settled: bool,

    presence: PresenceCollector<E::Instant>,

    echoes: EchoTracker<E::Instant>,

    link: Link<E::Instant>,
}

impl<E: Environment> Client<E> {
    /// Create a disconnected client.
    pub fn new(env: E, config: ClientConfig) -> Self {
        Self {
            env,
            config,
            identity: None,
            mode: ConversationMode::Public,
            roster: Roster::empty(),
            roster_settled: false,
            presence: PresenceCollector::new(config.presence, config.refresh),
            echoes: EchoTracker::new(config.echo.window),
            link: Link::new(config.reconnect_delay),
        }
    }

    /// Configuration the client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Our name, once assigned.
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// Current conversation mode.
    pub fn mode(&self) -> &ConversationMode {
        &self.mode
    }

    /// Latest roster.
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Whether the roster came from a finished collection.
    pub fn roster_settled(&self) -> bool {
        self.roster_settled
    }

    /// Connection state.
    pub fn link_state(&self) -> LinkState {
        self.link.state()
    }

    /// Whether a presence collection is in progress.
    pub fn is_collecting(&self) -> bool {
        self.presence.is_collecting()
    }

    /// How long the current collection has been running. `None` while idle.
    pub fn collecting_for(&self) -> Option<Duration> {
        self.presence.collecting_since().map(|since| self.env.now() - since)
    }

    /// Number of sent public messages still waiting for their echo.
    pub fn pending_echoes(&self) -> usize {
        self.echoes.len()
    }

    /// Process an event and return resulting actions.
    ///
    /// Errors are advisory: the session stays usable and the caller should
    /// surface the message to the user.
    pub fn handle(
        &mut self,
        event: ClientEvent<E::Instant>,
    ) -> Result<Vec<ClientAction>, ClientError> {
        match event {
            ClientEvent::Connecting => {
                self.link.connecting();
                Ok(vec![ClientAction::Status(LinkState::Connecting)])
            },
            ClientEvent::Opened => Ok(self.handle_opened()),
            ClientEvent::Closed => Ok(self.handle_closed()),
            ClientEvent::LineReceived(line) => Ok(self.handle_line(&line)),
            ClientEvent::Tick { now } => Ok(self.handle_tick(now)),
            ClientEvent::SendText { text } => self.handle_send_text(&text),
            ClientEvent::Rename { name } => self.handle_rename(&name),
            ClientEvent::RefreshPresence => Ok(self.handle_refresh_presence()),
            ClientEvent::SelectTarget { name } => self.handle_select_target(&name),
            ClientEvent::SwitchPublic => Ok(self.handle_switch_public()),
            ClientEvent::SwitchPrivate => Ok(self.handle_switch_private()),
        }
    }

    fn handle_opened(&mut self) -> Vec<ClientAction> {
        self.link.opened();
        tracing::info!("connected");
        vec![ClientAction::Status(LinkState::Connected), notice("connected")]
    }

    fn handle_closed(&mut self) -> Vec<ClientAction> {
        let was_connected = self.link.is_connected();
        if !self.link.closed(self.env.now()) {
            return vec![];
        }

        // Everything below belonged to the dead connection.
        self.presence.cancel();
        self.echoes.clear();
        self.roster = Roster::empty();
        self.roster_settled = false;

        let delay = format_delay(self.link.reconnect_delay());
        let text = if was_connected {
            tracing::warn!("connection lost");
            format!("connection lost, reconnecting in {delay}")
        } else {
            tracing::warn!(failures = self.link.failures(), "connection attempt failed");
            format!("connection failed, retrying in {delay}")
        };

        vec![
            ClientAction::Status(LinkState::Disconnected),
            notice(text),
            ClientAction::RosterUpdated(Roster::empty()),
        ]
    }

    fn handle_line(&mut self, raw: &str) -> Vec<ClientAction> {
        let Some(line) = normalize_line(raw) else {
            return vec![];
        };

        // A deadline that passed since the last tick ends the collection
        // before this line can join it.
        let mut actions = match self.presence.expire(self.env.now(), self.identity.as_deref()) {
            Some(roster) => self.finalize(roster),
            None => vec![],
        };

        let message = classify(&line, self.presence.is_collecting());
        tracing::trace!(?message, "line classified");
        actions.extend(self.apply(message));
        actions
    }

    /// Route one classified line.
    fn apply(&mut self, message: ClassifiedMessage) -> Vec<ClientAction> {
        let now = self.env.now();

        match message {
            ClassifiedMessage::NameAssigned { name } => self.handle_name_assigned(name, now),
            ClassifiedMessage::NameUpdated { name } => self.handle_name_updated(name, now),
            ClassifiedMessage::PeerRenamed => {
                let mut actions = vec![notice("a user changed their name, refreshing...")];
                actions.extend(self.refresh(RefreshTrigger::PeerRenamed, now));
                actions
            },
            ClassifiedMessage::PresenceChange { text } => {
                let mut actions = vec![notice(text)];
                actions.extend(self.refresh(RefreshTrigger::PresenceChange, now));
                actions
            },
            ClassifiedMessage::WhoEntry { name } => {
                self.presence.record(name, now);
                vec![]
            },
            ClassifiedMessage::DirectMessage { from, content } => {
                vec![ClientAction::Deliver(ChatMessage::peer(ChatMode::Private, from, content))]
            },
            ClassifiedMessage::PublicMessage { from, content } => {
                self.handle_public_message(from, content, now)
            },
            ClassifiedMessage::SystemNotice { text } => vec![notice(text)],
        }
    }

    fn handle_name_assigned(&mut self, name: String, now: E::Instant) -> Vec<ClientAction> {
        self.identity = Some(name.clone()).filter(|n| !n.is_empty());

        // Show ourselves straight away; the collection fills in the rest.
        self.roster = self.identity.as_deref().map(Roster::only).unwrap_or_default();
        self.roster_settled = false;

        let mut actions = vec![
            ClientAction::IdentityChanged { name: name.clone() },
            ClientAction::RosterUpdated(self.roster.clone()),
            notice(format!("identity assigned: {name}")),
        ];
        actions.extend(self.drop_stale_target());
        actions.extend(self.refresh(RefreshTrigger::IdentityAssigned, now));
        actions
    }

    fn handle_name_updated(&mut self, name: String, now: E::Instant) -> Vec<ClientAction> {
        let old = self.identity.replace(name.clone());

        // Provisional patch until the triggered collection lands.
        let mut others: BTreeSet<String> = self.roster.names().iter().cloned().collect();
        if let Some(old) = &old {
            others.remove(old);
        }
        self.roster = Roster::from_collected(others, Some(&name));

        let text = match &old {
            Some(old) => format!("identity updated: {old} -> {name}"),
            None => format!("identity updated: {name}"),
        };

        let mut actions = vec![
            ClientAction::IdentityChanged { name },
            ClientAction::RosterUpdated(self.roster.clone()),
            notice(text),
        ];
        actions.extend(self.drop_stale_target());
        actions.extend(self.refresh(RefreshTrigger::IdentityUpdated, now));
        actions
    }

    fn handle_public_message(
        &mut self,
        from: String,
        content: String,
        now: E::Instant,
    ) -> Vec<ClientAction> {
        if self.identity.as_deref() != Some(from.as_str()) {
            return vec![ClientAction::Deliver(ChatMessage::peer(ChatMode::Public, from, content))];
        }

        if self.echoes.take(&content, now) {
            tracing::debug!(%content, "own echo suppressed");
            return vec![];
        }

        vec![ClientAction::Deliver(ChatMessage::own(ChatMode::Public, Some(from), content))]
    }

    fn handle_tick(&mut self, now: E::Instant) -> Vec<ClientAction> {
        let mut actions = Vec::new();

        if let Some(LinkAction::Reconnect) = self.link.poll(now) {
            tracing::info!("reconnecting");
            actions.push(ClientAction::Status(LinkState::Connecting));
            actions.push(ClientAction::Reconnect);
        }

        let presence = self.presence.poll(now, self.identity.as_deref());
        actions.extend(self.convert_presence_actions(presence));

        self.echoes.purge(now);

        actions
    }

    fn handle_send_text(&mut self, text: &str) -> Result<Vec<ClientAction>, ClientError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ClientError::EmptyInput);
        }

        if !self.link.is_connected() {
            tracing::debug!("send dropped while disconnected");
            return Ok(vec![]);
        }

        let now = self.env.now();
        match &self.mode {
            ConversationMode::Public => {
                self.echoes.record(text, now);
                Ok(vec![
                    ClientAction::Send(Command::Public { text: text.to_owned() }),
                    ClientAction::Deliver(ChatMessage::own(
                        ChatMode::Public,
                        self.identity.clone(),
                        text,
                    )),
                ])
            },
            ConversationMode::Private { target: None } => Err(ClientError::NoTargetSelected),
            ConversationMode::Private { target: Some(target) } => {
                if !self.roster.contains(target) {
                    let name = target.clone();
                    self.presence.schedule(RefreshTrigger::TargetOffline, now);
                    return Err(ClientError::TargetOffline { name });
                }

                Ok(vec![
                    ClientAction::Send(Command::Private {
                        target: target.clone(),
                        text: text.to_owned(),
                    }),
                    ClientAction::Deliver(ChatMessage::own(
                        ChatMode::Private,
                        self.identity.clone(),
                        format!("-> {target}: {text}"),
                    )),
                ])
            },
        }
    }

    fn handle_rename(&mut self, name: &str) -> Result<Vec<ClientAction>, ClientError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ClientError::EmptyInput);
        }
        if self.identity.as_deref() == Some(name) {
            return Err(ClientError::NameUnchanged { name: name.to_owned() });
        }

        if !self.link.is_connected() {
            tracing::debug!("rename dropped while disconnected");
            return Ok(vec![]);
        }

        Ok(vec![ClientAction::Send(Command::Rename { name: name.to_owned() })])
    }

    fn handle_refresh_presence(&mut self) -> Vec<ClientAction> {
        if !self.link.is_connected() {
            return vec![];
        }

        let now = self.env.now();
        let mut actions = vec![notice("refreshing online users...")];
        actions.extend(self.refresh(RefreshTrigger::Manual, now));
        actions
    }

    fn handle_select_target(&mut self, name: &str) -> Result<Vec<ClientAction>, ClientError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ClientError::EmptyInput);
        }
        if self.identity.as_deref() == Some(name) {
            return Err(ClientError::InvalidTarget {
                name: name.to_owned(),
                reason: "cannot private chat with yourself",
            });
        }
        if !self.roster.contains(name) {
            return Err(ClientError::InvalidTarget {
                name: name.to_owned(),
                reason: "user is not online",
            });
        }

        let was_public = !self.mode.is_private();
        self.mode = ConversationMode::Private { target: Some(name.to_owned()) };

        let mut actions = vec![
            ClientAction::ModeChanged(self.mode.clone()),
            notice(format!("selected {name} for private chat")),
        ];
        if was_public {
            let now = self.env.now();
            actions.extend(self.refresh(RefreshTrigger::PrivateMode, now));
        }
        Ok(actions)
    }

    fn handle_switch_public(&mut self) -> Vec<ClientAction> {
        self.mode = ConversationMode::Public;
        vec![ClientAction::ModeChanged(self.mode.clone())]
    }

    fn handle_switch_private(&mut self) -> Vec<ClientAction> {
        let target = self.mode.target().map(str::to_owned);
        self.mode = ConversationMode::Private { target };

        let now = self.env.now();
        let mut actions = vec![ClientAction::ModeChanged(self.mode.clone())];
        actions.extend(self.refresh(RefreshTrigger::PrivateMode, now));
        actions
    }

    /// Request a presence refresh. Dropped while disconnected.
    fn refresh(&mut self, trigger: RefreshTrigger, now: E::Instant) -> Vec<ClientAction> {
        if !self.link.is_connected() {
            tracing::debug!(?trigger, "refresh dropped while disconnected");
            return vec![];
        }

        let presence = self.presence.request(trigger, now, self.identity.as_deref());
        self.convert_presence_actions(presence)
    }

    fn convert_presence_actions(&mut self, actions: Vec<PresenceAction>) -> Vec<ClientAction> {
        let mut out = Vec::new();
        for action in actions {
            match action {
                PresenceAction::Send(command) => out.push(ClientAction::Send(command)),
                PresenceAction::Finalized(roster) => out.extend(self.finalize(roster)),
            }
        }
        out
    }

    /// Install a finished roster and re-check the private target against it.
    fn finalize(&mut self, roster: Roster) -> Vec<ClientAction> {
        tracing::debug!(online = roster.len(), "presence collection finalized");
        self.roster = roster;
        self.roster_settled = true;

        let mut actions = vec![ClientAction::RosterUpdated(self.roster.clone())];
        actions.extend(self.drop_stale_target());
        actions
    }

    /// Clear a private target that is no longer a valid peer: gone from a
    /// settled roster, or now our own name.
    fn drop_stale_target(&mut self) -> Vec<ClientAction> {
        let ConversationMode::Private { target: Some(target) } = &self.mode else {
            return vec![];
        };

        let is_self = self.identity.as_deref() == Some(target.as_str());
        let offline = self.roster_settled && !self.roster.contains(target);
        if !is_self && !offline {
            return vec![];
        }

        tracing::debug!(%target, is_self, "private target dropped");
        self.mode = ConversationMode::Private { target: None };
        vec![
            notice("private target went offline, select again"),
            ClientAction::ModeChanged(self.mode.clone()),
        ]
    }
}

fn notice(text: impl Into<String>) -> ClientAction {
    ClientAction::Deliver(ChatMessage::system(text))
}

fn format_delay(delay: Duration) -> String {
    if delay.subsec_millis() == 0 {
        format!("{}s", delay.as_secs())
    } else {
        format!("{}ms", delay.as_millis())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use parley_core::env::test_utils::{MockEnv, MockInstant};

    use super::*;
    use crate::event::Origin;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn connected() -> (MockEnv, Client<MockEnv>) {
        let env = MockEnv::new();
        let mut client = Client::new(env.clone(), ClientConfig::default());
        client.handle(ClientEvent::Connecting).unwrap();
        client.handle(ClientEvent::Opened).unwrap();
        (env, client)
    }

    fn line(client: &mut Client<MockEnv>, text: &str) -> Vec<ClientAction> {
        client.handle(ClientEvent::LineReceived(text.to_owned())).unwrap()
    }

    fn tick(env: &MockEnv, client: &mut Client<MockEnv>, by: Duration) -> Vec<ClientAction> {
        env.advance(by);
        client.handle(ClientEvent::Tick { now: env.now() }).unwrap()
    }

    fn sends(actions: &[ClientAction]) -> Vec<&Command> {
        actions
            .iter()
            .filter_map(|a| match a {
                ClientAction::Send(command) => Some(command),
                _ => None,
            })
            .collect()
    }

    fn delivered(actions: &[ClientAction]) -> Vec<&ChatMessage> {
        actions
            .iter()
            .filter_map(|a| match a {
                ClientAction::Deliver(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    fn rosters(actions: &[ClientAction]) -> Vec<&Roster> {
        actions
            .iter()
            .filter_map(|a| match a {
                ClientAction::RosterUpdated(roster) => Some(roster),
                _ => None,
            })
            .collect()
    }

    /// Assign `name` and let the first collection settle on `peers`.
    fn settle(env: &MockEnv, client: &mut Client<MockEnv>, name: &str, peers: &[&str]) {
        line(client, &format!("您已分配用户名:{name}"));
        let actions = tick(env, client, ms(200));
        assert_eq!(sends(&actions), vec![&Command::Who]);
        for peer in peers {
            line(client, &format!("[127.0.0.1:1]{peer}:在线..."));
        }
        tick(env, client, ms(500));
        assert!(!client.is_collecting());
    }

    #[test]
    fn new_client_is_disconnected() {
        let client = Client::new(MockEnv::new(), ClientConfig::default());

        assert_eq!(client.identity(), None);
        assert_eq!(client.link_state(), LinkState::Disconnected);
        assert_eq!(client.mode(), &ConversationMode::Public);
        assert!(client.roster().is_empty());
    }

    #[test]
    fn assignment_shows_self_then_collects() {
        let (env, mut client) = connected();

        let actions = line(&mut client, "您已分配用户名:alice");
        assert_eq!(client.identity(), Some("alice"));
        assert_eq!(rosters(&actions), vec![&Roster::only("alice")]);
        assert!(sends(&actions).is_empty());

        assert!(sends(&tick(&env, &mut client, ms(199))).is_empty());
        assert_eq!(sends(&tick(&env, &mut client, ms(1))), vec![&Command::Who]);
        assert!(client.is_collecting());
    }

    #[test]
    fn end_to_end_identity_and_roster() {
        let (env, mut client) = connected();
        line(&mut client, "您已分配用户名:alice");
        tick(&env, &mut client, ms(200));

        line(&mut client, "[1.2.3.4]bob:在线");
        let actions = tick(&env, &mut client, ms(500));

        assert_eq!(client.identity(), Some("alice"));
        assert_eq!(client.roster().names(), ["alice", "bob"]);
        assert!(client.roster_settled());
        assert_eq!(rosters(&actions).len(), 1);
    }

    #[test]
    fn silent_collection_settles_on_initial_wait() {
        let (env, mut client) = connected();
        line(&mut client, "您已分配用户名:alice");
        tick(&env, &mut client, ms(200));

        assert!(rosters(&tick(&env, &mut client, ms(1999))).is_empty());
        let actions = tick(&env, &mut client, ms(1));
        assert_eq!(rosters(&actions), vec![&Roster::only("alice")]);
    }

    #[test]
    fn stale_who_entries_are_ignored() {
        let (env, mut client) = connected();
        settle(&env, &mut client, "alice", &["bob"]);

        let actions = line(&mut client, "[1.2.3.4]mallory:在线");
        tick(&env, &mut client, ms(5000));

        assert!(!client.roster().contains("mallory"));
        // Not collecting, so the line is shown as ordinary chat.
        assert_eq!(delivered(&actions)[0].origin, Origin::Peer);
    }

    #[test]
    fn entry_after_deadline_is_chat_not_presence() {
        let (env, mut client) = connected();
        line(&mut client, "您已分配用户名:alice");
        tick(&env, &mut client, ms(200));

        // The idle wait runs out with no tick to notice it.
        env.advance(ms(2500));
        let actions = line(&mut client, "[1.2.3.4]late:在线");

        assert_eq!(rosters(&actions), vec![&Roster::only("alice")]);
        assert_eq!(delivered(&actions), vec![&ChatMessage::peer(ChatMode::Public, "late", "在线")]);

        tick(&env, &mut client, ms(10));
        assert!(!client.is_collecting());
        assert_eq!(client.roster().names(), ["alice"]);
    }

    #[test]
    fn own_echo_is_suppressed_once() {
        let (env, mut client) = connected();
        settle(&env, &mut client, "alice", &[]);

        let actions = client.handle(ClientEvent::SendText { text: "hi".into() }).unwrap();
        assert_eq!(sends(&actions), vec![&Command::Public { text: "hi".into() }]);
        assert_eq!(delivered(&actions)[0].origin, Origin::SelfAuthored);

        assert!(line(&mut client, "[1.2.3.4]alice:hi").is_empty());

        let again = line(&mut client, "[1.2.3.4]alice:hi");
        assert_eq!(delivered(&again)[0].origin, Origin::SelfAuthored);
        assert_eq!(delivered(&again)[0].text, "hi");
    }

    #[test]
    fn late_echo_is_shown() {
        let (env, mut client) = connected();
        settle(&env, &mut client, "alice", &[]);

        client.handle(ClientEvent::SendText { text: "hi".into() }).unwrap();
        env.advance(ms(8000));

        let actions = line(&mut client, "[1.2.3.4]alice:hi");
        assert_eq!(delivered(&actions).len(), 1);
        assert_eq!(client.pending_echoes(), 0);
    }

    #[test]
    fn peer_public_message_is_delivered() {
        let (env, mut client) = connected();
        settle(&env, &mut client, "alice", &[]);

        let actions = line(&mut client, "[1.2.3.4]bob:hello there");
        assert_eq!(delivered(&actions), vec![&ChatMessage::peer(
            ChatMode::Public,
            "bob",
            "hello there"
        )]);
    }

    #[test]
    fn direct_message_is_private() {
        let (_env, mut client) = connected();

        let actions = line(&mut client, "bob对您说:psst");
        assert_eq!(delivered(&actions), vec![&ChatMessage::peer(ChatMode::Private, "bob", "psst")]);
    }

    #[test]
    fn unrecognised_line_is_a_notice() {
        let (_env, mut client) = connected();

        let actions = line(&mut client, "server restarting soon");
        assert_eq!(delivered(&actions), vec![&ChatMessage::system("server restarting soon")]);
    }

    #[test]
    fn blank_lines_are_dropped() {
        let (_env, mut client) = connected();
        assert!(line(&mut client, "  \r\n").is_empty());
    }

    #[test]
    fn rename_confirmation_patches_roster() {
        let (env, mut client) = connected();
        settle(&env, &mut client, "alice", &["bob"]);

        let actions = client.handle(ClientEvent::Rename { name: " carol ".into() }).unwrap();
        assert_eq!(sends(&actions), vec![&Command::Rename { name: "carol".into() }]);

        let actions = line(&mut client, "您已更新用户名:carol");
        assert_eq!(client.identity(), Some("carol"));
        assert_eq!(client.roster().names(), ["carol", "bob"]);
        assert_eq!(delivered(&actions), vec![&ChatMessage::system(
            "identity updated: alice -> carol"
        )]);
        assert_eq!(sends(&tick(&env, &mut client, ms(200))), vec![&Command::Who]);
    }

    #[test]
    fn rename_rejects_blank_and_same_name() {
        let (env, mut client) = connected();
        settle(&env, &mut client, "alice", &[]);

        assert_eq!(
            client.handle(ClientEvent::Rename { name: "  ".into() }).unwrap_err(),
            ClientError::EmptyInput
        );
        assert_eq!(
            client.handle(ClientEvent::Rename { name: "alice".into() }).unwrap_err(),
            ClientError::NameUnchanged { name: "alice".into() }
        );
    }

    #[test]
    fn peer_rename_refreshes_after_short_delay() {
        let (env, mut client) = connected();
        settle(&env, &mut client, "alice", &["bob"]);

        line(&mut client, "bob改名为:robert");
        assert!(sends(&tick(&env, &mut client, ms(99))).is_empty());
        assert_eq!(sends(&tick(&env, &mut client, ms(1))), vec![&Command::Who]);
    }

    #[test]
    fn presence_change_is_shown_and_refreshes() {
        let (env, mut client) = connected();
        settle(&env, &mut client, "alice", &[]);

        let actions = line(&mut client, "[1.2.3.4]bob:已上线");
        assert_eq!(delivered(&actions), vec![&ChatMessage::system("[1.2.3.4]bob:已上线")]);
        assert_eq!(sends(&tick(&env, &mut client, ms(200))), vec![&Command::Who]);
    }

    #[test]
    fn select_target_validates_against_roster() {
        let (env, mut client) = connected();
        settle(&env, &mut client, "alice", &["bob"]);

        assert!(matches!(
            client.handle(ClientEvent::SelectTarget { name: "alice".into() }),
            Err(ClientError::InvalidTarget { .. })
        ));
        assert!(matches!(
            client.handle(ClientEvent::SelectTarget { name: "zed".into() }),
            Err(ClientError::InvalidTarget { .. })
        ));
        assert_eq!(client.mode(), &ConversationMode::Public);

        let actions = client.handle(ClientEvent::SelectTarget { name: "bob".into() }).unwrap();
        assert_eq!(client.mode().target(), Some("bob"));
        // Entering private mode refreshes at once.
        assert_eq!(sends(&actions), vec![&Command::Who]);
    }

    #[test]
    fn private_send_requires_target() {
        let (env, mut client) = connected();
        settle(&env, &mut client, "alice", &["bob"]);

        client.handle(ClientEvent::SwitchPrivate).unwrap();
        assert_eq!(
            client.handle(ClientEvent::SendText { text: "hi".into() }).unwrap_err(),
            ClientError::NoTargetSelected
        );
    }

    #[test]
    fn private_send_goes_to_target() {
        let (env, mut client) = connected();
        settle(&env, &mut client, "alice", &["bob"]);
        client.handle(ClientEvent::SelectTarget { name: "bob".into() }).unwrap();
        line(&mut client, "[1.2.3.4]bob:在线");
        tick(&env, &mut client, ms(500));

        let actions = client.handle(ClientEvent::SendText { text: "psst".into() }).unwrap();
        assert_eq!(sends(&actions), vec![&Command::Private {
            target: "bob".into(),
            text: "psst".into()
        }]);
        assert_eq!(delivered(&actions)[0].text, "-> bob: psst");
        assert_eq!(client.pending_echoes(), 0);
    }

    #[test]
    fn target_loss_clears_target_with_one_notice() {
        let (env, mut client) = connected();
        settle(&env, &mut client, "alice", &["bob"]);
        client.handle(ClientEvent::SelectTarget { name: "bob".into() }).unwrap();

        // bob does not answer the private-mode refresh.
        let actions = tick(&env, &mut client, ms(2000));
        let lost: Vec<_> = delivered(&actions)
            .into_iter()
            .filter(|m| m.text == "private target went offline, select again")
            .collect();
        assert_eq!(lost.len(), 1);
        assert_eq!(client.mode(), &ConversationMode::Private { target: None });

        // A later roster without bob says nothing more.
        client.handle(ClientEvent::RefreshPresence).unwrap();
        let actions = tick(&env, &mut client, ms(2000));
        assert!(delivered(&actions).iter().all(|m| !m.text.contains("went offline")));
    }

    #[test]
    fn send_to_vanished_target_fails_and_refreshes() {
        let (env, mut client) = connected();
        settle(&env, &mut client, "alice", &["bob"]);
        client.handle(ClientEvent::SelectTarget { name: "bob".into() }).unwrap();
        line(&mut client, "[1.2.3.4]bob:在线");
        tick(&env, &mut client, ms(500));

        // A fresh collection that misses bob is still running.
        client.handle(ClientEvent::RefreshPresence).unwrap();
        client.roster = Roster::only("alice");

        assert_eq!(
            client.handle(ClientEvent::SendText { text: "hi".into() }).unwrap_err(),
            ClientError::TargetOffline { name: "bob".into() }
        );
        assert_eq!(sends(&tick(&env, &mut client, ms(0))), vec![&Command::Who]);
    }

    #[test]
    fn send_while_disconnected_is_a_no_op() {
        let mut client = Client::new(MockEnv::new(), ClientConfig::default());

        let actions = client.handle(ClientEvent::SendText { text: "hi".into() }).unwrap();
        assert!(actions.is_empty());
        assert_eq!(client.pending_echoes(), 0);
    }

    #[test]
    fn empty_send_is_rejected() {
        let (_env, mut client) = connected();
        assert_eq!(
            client.handle(ClientEvent::SendText { text: " ".into() }).unwrap_err(),
            ClientError::EmptyInput
        );
    }

    #[test]
    fn close_resets_session_and_reconnects_once() {
        let (env, mut client) = connected();
        line(&mut client, "您已分配用户名:alice");
        tick(&env, &mut client, ms(200));
        client.handle(ClientEvent::SendText { text: "hi".into() }).unwrap();
        assert!(client.is_collecting());

        let actions = client.handle(ClientEvent::Closed).unwrap();
        assert_eq!(actions[0], ClientAction::Status(LinkState::Disconnected));
        assert_eq!(delivered(&actions), vec![&ChatMessage::system(
            "connection lost, reconnecting in 3s"
        )]);
        assert_eq!(rosters(&actions), vec![&Roster::empty()]);
        assert!(!client.is_collecting());
        assert_eq!(client.pending_echoes(), 0);

        // A second close while down reports nothing.
        assert!(client.handle(ClientEvent::Closed).unwrap().is_empty());

        fn reconnects(actions: &[ClientAction]) -> usize {
            actions.iter().filter(|a| **a == ClientAction::Reconnect).count()
        }
        assert_eq!(reconnects(&tick(&env, &mut client, ms(2999))), 0);
        assert_eq!(reconnects(&tick(&env, &mut client, ms(1))), 1);
        assert_eq!(reconnects(&tick(&env, &mut client, ms(5000))), 0);
    }

    #[test]
    fn reconnect_collects_fresh_roster() {
        let (env, mut client) = connected();
        settle(&env, &mut client, "alice", &["bob"]);

        client.handle(ClientEvent::Closed).unwrap();
        tick(&env, &mut client, ms(3000));
        client.handle(ClientEvent::Opened).unwrap();

        settle(&env, &mut client, "alice2", &["carol"]);
        assert_eq!(client.roster().names(), ["alice2", "carol"]);
    }

    #[test]
    fn failed_attempt_reports_retry() {
        let env = MockEnv::new();
        let mut client = Client::new(env, ClientConfig::default());
        client.handle(ClientEvent::Connecting).unwrap();

        let actions = client.handle(ClientEvent::Closed).unwrap();
        assert_eq!(delivered(&actions), vec![&ChatMessage::system(
            "connection failed, retrying in 3s"
        )]);
    }

    #[test]
    fn refresh_while_disconnected_is_dropped() {
        let mut client = Client::new(MockEnv::new(), ClientConfig::default());
        assert!(client.handle(ClientEvent::RefreshPresence).unwrap().is_empty());
        assert!(!client.is_collecting());
    }

    #[test]
    fn collecting_for_tracks_env_clock() {
        let (env, mut client) = connected();
        client.handle(ClientEvent::RefreshPresence).unwrap();
        env.advance(ms(300));

        assert_eq!(client.collecting_for(), Some(ms(300)));
        assert_eq!(env.now(), MockInstant::from_millis(300));
    }

    #[test]
    fn delays_format_in_whole_seconds_when_possible() {
        assert_eq!(format_delay(ms(3000)), "3s");
        assert_eq!(format_delay(ms(1500)), "1500ms");
    }

    #[test]
    fn taking_the_targets_name_clears_the_target() {
        let (env, mut client) = connected();
        settle(&env, &mut client, "alice", &["bob"]);
        client.handle(ClientEvent::SelectTarget { name: "bob".into() }).unwrap();

        let actions = line(&mut client, "您已更新用户名:bob");
        assert_eq!(client.mode(), &ConversationMode::Private { target: None });
        assert!(actions.contains(&ClientAction::ModeChanged(ConversationMode::Private {
            target: None
        })));
    }
}
