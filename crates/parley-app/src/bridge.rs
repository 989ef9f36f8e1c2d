//! Protocol-to-Application translation layer.
//!
//! The [`Bridge`] wraps the session [`parley_client::Client`] and adapts it to
//! the high-level application lifecycle.
//!
//! # Responsibilities
//!
//! - Converts high-level [`crate::AppAction`] into client events.
//! - Accumulates outgoing wire lines to be written by the driver in the next
//!   I/O cycle.
//! - Interprets results from the client and converts them back into
//!   [`crate::AppEvent`]s to update the UI.
//! - Manages time ticks generically to support both real-time execution and
//!   deterministic simulation.

use parley_client::{
    Client, ClientAction, ClientConfig, ClientError, ClientEvent, Environment, LinkState,
};

use crate::{AppAction, AppEvent};

/// Bridge between App and Client protocol logic.
///
/// Generic over Environment to support both production and simulation.
/// The Instant type is determined by the Environment's associated type.
pub struct Bridge<E: Environment> {
    client: Client<E>,
    outgoing: Vec<String>,
    /// Set when the client asked for a new connection attempt.
    reconnect: bool,
}

impl<E: Environment> Bridge<E> {
    /// Create a new Bridge with the given environment and configuration.
    pub fn new(env: E, config: ClientConfig) -> Self {
        Self { client: Client::new(env, config), outgoing: Vec::new(), reconnect: false }
    }

    /// Underlying session state machine.
    pub fn client(&self) -> &Client<E> {
        &self.client
    }

    /// Process an App action and return resulting App events.
    pub fn process_app_action(&mut self, action: AppAction) -> Vec<AppEvent> {
        let event = match action {
            AppAction::SendText { text } => ClientEvent::SendText { text },
            AppAction::Rename { name } => ClientEvent::Rename { name },
            AppAction::RefreshPresence => ClientEvent::RefreshPresence,
            AppAction::SelectTarget { name } => ClientEvent::SelectTarget { name },
            AppAction::SwitchPublic => ClientEvent::SwitchPublic,
            AppAction::SwitchPrivate => ClientEvent::SwitchPrivate,
            AppAction::Render | AppAction::Quit | AppAction::Connect { .. } => return vec![],
        };
        let result = self.client.handle(event);
        self.handle_client_result(result)
    }

    /// A connection attempt started.
    pub fn handle_connecting(&mut self) -> Vec<AppEvent> {
        let result = self.client.handle(ClientEvent::Connecting);
        self.handle_client_result(result)
    }

    /// The transport opened.
    pub fn handle_opened(&mut self) -> Vec<AppEvent> {
        let result = self.client.handle(ClientEvent::Opened);
        self.handle_client_result(result)
    }

    /// The transport closed or the attempt failed.
    pub fn handle_closed(&mut self) -> Vec<AppEvent> {
        let result = self.client.handle(ClientEvent::Closed);
        self.handle_client_result(result)
    }

    /// Handle a line from the server.
    pub fn handle_line(&mut self, line: String) -> Vec<AppEvent> {
        let result = self.client.handle(ClientEvent::LineReceived(line));
        self.handle_client_result(result)
    }

    /// Process a time tick.
    pub fn handle_tick(&mut self, now: E::Instant) -> Vec<AppEvent> {
        let result = self.client.handle(ClientEvent::Tick { now });
        self.handle_client_result(result)
    }

    /// Take pending outgoing lines.
    pub fn take_outgoing(&mut self) -> Vec<String> {
        std::mem::take(&mut self.outgoing)
    }

    /// Whether a reconnect was requested since the last call.
    pub fn take_reconnect(&mut self) -> bool {
        std::mem::take(&mut self.reconnect)
    }

    fn handle_client_result(
        &mut self,
        result: Result<Vec<ClientAction>, ClientError>,
    ) -> Vec<AppEvent> {
        match result {
            Ok(actions) => self.process_client_actions(actions),
            Err(e) => {
                tracing::debug!(error = %e, "user intent rejected");
                vec![AppEvent::Error { message: e.to_string() }]
            },
        }
    }

    fn process_client_actions(&mut self, actions: Vec<ClientAction>) -> Vec<AppEvent> {
        let mut events = Vec::new();

        for action in actions {
            match action {
                ClientAction::Send(command) => {
                    self.outgoing.push(command.encode());
                },
                ClientAction::Deliver(message) => events.push(AppEvent::Message(message)),
                ClientAction::RosterUpdated(roster) => events.push(AppEvent::RosterUpdated(roster)),
                ClientAction::Status(state) => events.push(match state {
                    LinkState::Disconnected => AppEvent::Disconnected,
                    LinkState::Connecting => AppEvent::Connecting,
                    LinkState::Connected => AppEvent::Connected,
                }),
                ClientAction::IdentityChanged { name } => {
                    events.push(AppEvent::IdentityChanged { name });
                },
                ClientAction::ModeChanged(mode) => events.push(AppEvent::ModeChanged(mode)),
                ClientAction::Reconnect => self.reconnect = true,
            }
        }

        events
    }
}
