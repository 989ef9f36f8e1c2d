//! Integration tests for App and Bridge behavior.
//!
//! The App and Bridge run against the scripted server on a mock clock. Other
//! users are raw server sessions whose lines the tests read directly.
//!
//! # Oracle Pattern
//!
//! Tests end with oracle checks that verify:
//! - App state reflects what the server knows
//! - Messages land in the transcript with the right origin and mode
//! - Lines reaching other users are what the server would relay

use std::time::Duration;

use parley_app::{App, AppAction, AppEvent, Bridge, ChatMode, ConnectionState, Origin};
use parley_client::{ClientConfig, ConversationMode, Environment};
use parley_core::env::test_utils::MockEnv;
use parley_harness::{Hub, SessionId, scripted_server::NAME_TAKEN_REPLY};

const ADDR: &str = "localhost:8888";

/// App, Bridge and server wired together.
struct Session {
    env: MockEnv,
    app: App,
    bridge: Bridge<MockEnv>,
    hub: Hub,
    session: Option<SessionId>,
}

impl Session {
    fn new() -> Self {
        let env = MockEnv::new();
        Self {
            bridge: Bridge::new(env.clone(), ClientConfig::default()),
            env,
            app: App::new(ADDR.into()),
            hub: Hub::default(),
            session: None,
        }
    }

    /// Connect, then let identity and roster settle.
    fn connected() -> Self {
        let mut session = Self::new();
        session.connect();
        session.advance(Duration::from_secs(3));
        session
    }

    fn connect(&mut self) {
        let events = self.bridge.handle_connecting();
        self.apply(events);
        self.session = Some(self.hub.connect("127.0.0.1:50000"));
        let events = self.bridge.handle_opened();
        self.apply(events);
    }

    /// Submit an input line, returning the App's actions.
    fn submit(&mut self, input: &str) -> Vec<AppAction> {
        let actions = self.app.submit(input);
        self.process_actions(actions.clone());
        actions
    }

    fn process_actions(&mut self, actions: Vec<AppAction>) {
        for action in actions {
            match action {
                AppAction::Render | AppAction::Quit | AppAction::Connect { .. } => {},
                _ => {
                    let events = self.bridge.process_app_action(action);
                    self.apply(events);
                },
            }
        }
    }

    fn apply(&mut self, events: Vec<AppEvent>) {
        for event in events {
            let actions = self.app.handle(event);
            self.process_actions(actions);
        }
        self.flush();
    }

    fn flush(&mut self) {
        for line in self.bridge.take_outgoing() {
            if let Some(session) = self.session {
                self.hub.send(session, &line);
            }
        }
    }

    fn pump(&mut self) {
        while let Some(session) = self.session
            && let Some(line) = self.hub.take_line(session)
        {
            let events = self.bridge.handle_line(line);
            self.apply(events);
        }
    }

    fn advance(&mut self, by: Duration) {
        let step = Duration::from_millis(100);
        let mut left = by;
        while !left.is_zero() {
            let d = left.min(step);
            left -= d;
            self.env.advance(d);
            self.pump();
            let events = self.bridge.handle_tick(self.env.now());
            self.apply(events);
        }
    }

    /// A user without a client, driven line by line.
    fn raw_peer(&mut self, addr: &str) -> SessionId {
        self.hub.connect(addr)
    }

    fn drain(&mut self, peer: SessionId) -> Vec<String> {
        std::iter::from_fn(|| self.hub.take_line(peer)).collect()
    }
}

#[test]
fn connect_assigns_identity_and_roster() {
    let session = Session::connected();

    assert_eq!(session.app.connection_state(), ConnectionState::Connected);
    assert_eq!(session.app.identity(), Some("User1"));
    assert_eq!(session.app.roster().names(), ["User1"]);
    assert_eq!(session.app.status_message(), Some("Connected to localhost:8888"));
}

#[test]
fn peer_arrives_and_chats() {
    let mut session = Session::connected();
    let peer = session.raw_peer("10.0.0.2:6000");
    session.advance(Duration::from_secs(3));

    assert_eq!(session.app.roster().names(), ["User1", "User2"]);

    session.hub.send(peer, "hi there");
    session.advance(Duration::from_millis(200));

    let last = session.app.transcript().last().cloned();
    assert!(last.is_some_and(|m| m.origin == Origin::Peer
        && m.mode == ChatMode::Public
        && m.sender.as_deref() == Some("User2")
        && m.text == "hi there"));
}

#[test]
fn private_message_reaches_target() {
    let mut session = Session::connected();
    let peer = session.raw_peer("10.0.0.2:6000");
    session.advance(Duration::from_secs(3));
    session.drain(peer);

    session.submit("/to User2");
    session.submit("psst");
    session.advance(Duration::from_millis(200));

    assert_eq!(session.app.mode(), &ConversationMode::Private { target: Some("User2".into()) });
    assert!(session.drain(peer).contains(&"User1对您说:psst".to_owned()));

    let own = session.app.transcript().iter().rev().find(|m| m.origin == Origin::SelfAuthored);
    assert_eq!(own.map(|m| m.text.as_str()), Some("-> User2: psst"));
}

#[test]
fn public_message_is_shown_once_and_relayed() {
    let mut session = Session::connected();
    let peer = session.raw_peer("10.0.0.2:6000");
    session.advance(Duration::from_secs(3));
    session.drain(peer);

    session.submit("hello all");
    session.advance(Duration::from_millis(500));

    let shown =
        session.app.transcript().iter().filter(|m| m.text == "hello all").count();
    assert_eq!(shown, 1);
    assert_eq!(session.drain(peer), vec!["[127.0.0.1:50000]User1:hello all".to_owned()]);
}

#[test]
fn taken_name_is_reported() {
    let mut session = Session::connected();
    session.raw_peer("10.0.0.2:6000");
    session.advance(Duration::from_secs(3));

    session.submit("/rename User2");
    session.advance(Duration::from_millis(200));

    assert_eq!(session.app.identity(), Some("User1"));
    assert!(session.app.transcript().iter().any(|m| m.text == NAME_TAKEN_REPLY));
}

#[test]
fn rename_updates_identity_and_roster() {
    let mut session = Session::connected();

    session.submit("/rename 张三");
    session.advance(Duration::from_secs(2));

    assert_eq!(session.app.identity(), Some("张三"));
    assert_eq!(session.app.roster().names(), ["张三"]);
}

#[test]
fn private_send_without_target_is_an_error() {
    let mut session = Session::connected();

    session.submit("/private");
    session.submit("anyone?");

    assert_eq!(session.app.status_message(), Some("Error: select a private chat target first"));
}

#[test]
fn lost_connection_reconnects_with_new_identity() {
    let mut session = Session::connected();

    if let Some(old) = session.session.take() {
        session.hub.disconnect(old);
    }
    let events = session.bridge.handle_closed();
    session.apply(events);
    assert_eq!(session.app.connection_state(), ConnectionState::Disconnected);
    assert!(session.app.roster().is_empty());

    session.advance(Duration::from_secs(3));
    assert!(session.bridge.take_reconnect());
    session.connect();
    session.advance(Duration::from_secs(3));

    assert_eq!(session.app.connection_state(), ConnectionState::Connected);
    assert_eq!(session.app.identity(), Some("User2"));
    assert_eq!(session.app.roster().names(), ["User2"]);
}

#[test]
fn quit_command_quits() {
    let mut session = Session::connected();

    assert_eq!(session.submit("/quit"), vec![AppAction::Quit]);
}
