//! Application state machine.
//!
//! This module defines the [`App`] state machine, which manages the interactive
//! state of the chat frontend completely decoupled from I/O and protocol
//! mechanics.
//!
//! This is a pure state machine: it consumes [`crate::AppEvent`] inputs and
//! produces [`crate::AppAction`] instructions for the runtime to execute.
//!
//! # Responsibilities
//!
//! - Keeps the bounded transcript, the roster and the conversation mode as
//!   last reported by the client.
//! - Turns submitted input lines into actions via [`crate::commands`].
//! - Stores terminal dimensions to handle resize events.
//! - Tracks high-level connection state for UI feedback.

use parley_client::{ChatMessage, ConversationMode, Roster};

use crate::{
    AppAction, AppEvent, ConnectionState, Transcript,
    commands::{self, Command},
};

/// Application state machine.
///
/// Pure state machine that processes events and produces actions.
/// No I/O dependencies - fully testable in simulation.
#[derive(Debug, Clone)]
pub struct App {
    /// Connection state.
    state: ConnectionState,
    /// Server address for connection.
    server_addr: String,
    /// Our name. `None` until the server assigns one.
    identity: Option<String>,
    mode: ConversationMode,
    roster: Roster,
    transcript: Transcript,
    /// Terminal dimensions (columns, rows).
    terminal_size: (u16, u16),
    /// Transient status message. `None` if no message.
    status_message: Option<String>,
}

impl App {
    /// Create a new App with the given server address.
    pub fn new(server_addr: String) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            server_addr,
            identity: None,
            mode: ConversationMode::Public,
            roster: Roster::empty(),
            transcript: Transcript::default(),
            terminal_size: (80, 24),
            status_message: None,
        }
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: AppEvent) -> Vec<AppAction> {
        match event {
            AppEvent::Tick => vec![],
            AppEvent::Resize(cols, rows) => {
                self.terminal_size = (cols, rows);
                vec![AppAction::Render]
            },
            AppEvent::Connecting => {
                self.state = ConnectionState::Connecting;
                self.status_message = Some(format!("Connecting to {}...", self.server_addr));
                vec![AppAction::Render]
            },
            AppEvent::Connected => {
                self.state = ConnectionState::Connected;
                self.status_message = Some(format!("Connected to {}", self.server_addr));
                vec![AppAction::Render]
            },
            AppEvent::Disconnected => {
                self.state = ConnectionState::Disconnected;
                self.status_message = Some("Disconnected".to_owned());
                vec![AppAction::Render]
            },
            AppEvent::Message(message) => {
                self.transcript.push(message);
                vec![AppAction::Render]
            },
            AppEvent::RosterUpdated(roster) => {
                self.roster = roster;
                vec![AppAction::Render]
            },
            AppEvent::IdentityChanged { name } => {
                self.identity = Some(name).filter(|n| !n.is_empty());
                vec![AppAction::Render]
            },
            AppEvent::ModeChanged(mode) => {
                self.mode = mode;
                vec![AppAction::Render]
            },
            AppEvent::Error { message } => {
                self.status_message = Some(format!("Error: {message}"));
                self.transcript.push(ChatMessage::system(message));
                vec![AppAction::Render]
            },
        }
    }

    /// Handle a submitted input line.
    ///
    /// Plain text is sent in the current mode; slash commands map to the API
    /// methods below.
    pub fn submit(&mut self, input: &str) -> Vec<AppAction> {
        match commands::parse(input) {
            Command::Message { text } if text.is_empty() => vec![],
            Command::Message { text } => self.send_text(text),
            Command::Who => self.refresh(),
            Command::Rename { name } => self.rename(name),
            Command::Public => self.switch_public(),
            Command::Private { target: None } => self.switch_private(),
            Command::Private { target: Some(name) } | Command::To { name } => {
                self.select_target(name)
            },
            Command::Quit => self.quit(),
            Command::Unknown { input } => {
                self.status_message = Some(format!("Unknown command: {input}"));
                vec![AppAction::Render]
            },
            Command::InvalidArgs { command, error } => {
                self.status_message = Some(format!("/{command}: {error}"));
                vec![AppAction::Render]
            },
        }
    }

    /// Select the next online peer as private target.
    ///
    /// Walks the roster in display order, skipping ourselves, and wraps
    /// around after the last peer.
    pub fn cycle_target(&mut self) -> Vec<AppAction> {
        let me = self.identity.as_deref();
        let peers: Vec<&String> =
            self.roster.names().iter().filter(|n| Some(n.as_str()) != me).collect();

        if peers.is_empty() {
            self.status_message = Some("No other users online".to_owned());
            return vec![AppAction::Render];
        }

        let next = match self.mode.target() {
            Some(current) => {
                peers.iter().position(|n| *n == current).map_or(0, |i| (i + 1) % peers.len())
            },
            None => 0,
        };
        let name = peers[next].clone();
        self.select_target(name)
    }

    /// Initiate connection to the server.
    pub fn connect(&mut self) -> Vec<AppAction> {
        self.state = ConnectionState::Connecting;
        vec![AppAction::Connect { server_addr: self.server_addr.clone() }, AppAction::Render]
    }

    /// Send chat text in the current mode.
    pub fn send_text(&self, text: impl Into<String>) -> Vec<AppAction> {
        vec![AppAction::SendText { text: text.into() }, AppAction::Render]
    }

    /// Ask the server for a new name.
    pub fn rename(&self, name: impl Into<String>) -> Vec<AppAction> {
        vec![AppAction::Rename { name: name.into() }, AppAction::Render]
    }

    /// Re-fetch the online list.
    pub fn refresh(&self) -> Vec<AppAction> {
        vec![AppAction::RefreshPresence, AppAction::Render]
    }

    /// Pick a private chat target.
    pub fn select_target(&self, name: impl Into<String>) -> Vec<AppAction> {
        vec![AppAction::SelectTarget { name: name.into() }, AppAction::Render]
    }

    /// Switch to public chat.
    pub fn switch_public(&self) -> Vec<AppAction> {
        vec![AppAction::SwitchPublic, AppAction::Render]
    }

    /// Switch to private chat, keeping the current target.
    pub fn switch_private(&self) -> Vec<AppAction> {
        vec![AppAction::SwitchPrivate, AppAction::Render]
    }

    /// Quit the application.
    pub fn quit(&self) -> Vec<AppAction> {
        vec![AppAction::Quit]
    }

    /// Current connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.state
    }

    /// Server address (host:port).
    pub fn server_addr(&self) -> &str {
        &self.server_addr
    }

    /// Our name, once assigned.
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// Conversation mode as last reported by the client.
    pub fn mode(&self) -> &ConversationMode {
        &self.mode
    }

    /// Online roster as last reported by the client.
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Displayed messages, oldest first.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Terminal dimensions (columns, rows).
    pub fn terminal_size(&self) -> (u16, u16) {
        self.terminal_size
    }

    /// Transient status message. `None` if no message.
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }
}
